use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle states.
///
/// `Failed` is part of the wire vocabulary but never persists: a failure
/// resolves to `Pending` (retry) or `DeadLetter` in the same transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting in the claim queue
    #[default]
    Pending,
    /// Exclusively held by one worker under a lease
    Claimed,
    /// Finished successfully
    Completed,
    /// Reported failed (transient; resolves via the retry policy)
    Failed,
    /// Retry attempts exhausted
    DeadLetter,
}

impl TaskStatus {
    /// Terminal states permit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::DeadLetter)
    }

    /// Check if a worker currently holds the task.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Claimed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Claimed => write!(f, "claimed"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::DeadLetter => write!(f, "dead_letter"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "claimed" => Ok(Self::Claimed),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "dead_letter" => Ok(Self::DeadLetter),
            _ => Err(format!("invalid task status: {s}")),
        }
    }
}
