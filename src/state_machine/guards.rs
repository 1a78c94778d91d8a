//! Pre-transition guard checks for ownership-sensitive operations.
//!
//! The guards run inside the store's critical section, where the task row
//! is already in hand, so they are plain functions over the row.

use crate::error::{CoreError, Result};
use crate::models::task::Task;
use crate::state_machine::states::TaskStatus;

/// Progress updates require a live claim held by the calling worker.
pub fn ensure_progress_allowed(task: &Task, worker_id: &str) -> Result<()> {
    if task.status != TaskStatus::Claimed || !task.is_claimed_by(worker_id) {
        return Err(CoreError::NotClaimedByCaller {
            task_id: task.task_id,
            worker_id: worker_id.to_string(),
        });
    }
    Ok(())
}

/// Completion requires the caller's claim to still be the live one.
///
/// A task that moved on without the caller (reclaimed after lease expiry,
/// or already terminal) surfaces as a stale claim rather than silently
/// succeeding.
pub fn ensure_completion_allowed(task: &Task, worker_id: &str) -> Result<()> {
    if task.status != TaskStatus::Claimed || !task.is_claimed_by(worker_id) {
        return Err(CoreError::StaleClaim {
            task_id: task.task_id,
            worker_id: worker_id.to_string(),
        });
    }
    Ok(())
}
