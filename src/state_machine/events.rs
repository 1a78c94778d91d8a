use serde::{Deserialize, Serialize};

/// Events that drive task lifecycle transitions.
///
/// `Fail` and `LeaseExpired` are both failure events: explicit worker
/// failure and reclamation of an abandoned claim take the same transition
/// path through [`super::transitions::next_status`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TaskEvent {
    /// A worker takes exclusive ownership of a pending task
    Claim { worker_id: String },
    /// The claiming worker reports success
    Complete,
    /// The claiming worker reports failure with an error message
    Fail(String),
    /// The claim's lease elapsed without a completion report
    LeaseExpired,
}

impl TaskEvent {
    /// String form of the event for logging and error messages.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Claim { .. } => "claim",
            Self::Complete => "complete",
            Self::Fail(_) => "fail",
            Self::LeaseExpired => "lease_expired",
        }
    }

    /// Extract the error message if this is an explicit failure.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail(message) => Some(message),
            _ => None,
        }
    }

    /// Both explicit failure and lease expiry route through the retry policy.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fail(_) | Self::LeaseExpired)
    }
}
