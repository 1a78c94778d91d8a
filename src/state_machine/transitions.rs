//! The task lifecycle transition function.
//!
//! `(current status, event) -> next status` as one pure function. The store
//! applies the result inside its critical section; nothing else mutates
//! task status.

use super::events::TaskEvent;
use super::states::TaskStatus;
use crate::error::{CoreError, Result};

/// What the retry policy decided to do with a failed claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Attempts remain: back to the queue through the normal claim path
    Requeue,
    /// Attempts exhausted: terminal dead letter
    DeadLetter,
}

/// Compute the next status for a task.
///
/// Failure events (`Fail`, `LeaseExpired`) share one arm, resolved by
/// `on_failure`, so explicit-failure retry and lease-expiry reclamation
/// cannot diverge in behavior. `on_failure` is ignored for non-failure
/// events.
pub fn next_status(
    current: TaskStatus,
    event: &TaskEvent,
    on_failure: FailureDisposition,
) -> Result<TaskStatus> {
    let target = match (current, event) {
        (TaskStatus::Pending, TaskEvent::Claim { .. }) => TaskStatus::Claimed,
        (TaskStatus::Claimed, TaskEvent::Complete) => TaskStatus::Completed,
        (TaskStatus::Claimed, TaskEvent::Fail(_)) | (TaskStatus::Claimed, TaskEvent::LeaseExpired) => {
            match on_failure {
                FailureDisposition::Requeue => TaskStatus::Pending,
                FailureDisposition::DeadLetter => TaskStatus::DeadLetter,
            }
        }
        (from, event) => {
            return Err(CoreError::InvalidTransition {
                from: from.to_string(),
                event: event.event_type().to_string(),
            })
        }
    };

    Ok(target)
}
