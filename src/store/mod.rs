//! Task persistence boundary.
//!
//! All task mutation flows through this trait's atomic, ownership-checked
//! operations; callers never get read-then-write access to task rows. The
//! claim protocol, the dedup check, and every guarded transition live
//! behind this seam so concurrency control cannot be bypassed.

use crate::error::Result;
use crate::models::task::{CreateTaskRequest, Task, TaskFilter, TaskPage};
use crate::state_machine::TaskStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

pub mod memory;

pub use memory::InMemoryTaskStore;

/// Page size applied when a listing does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Outcome of a create call: the task plus whether an equivalent in-flight
/// task absorbed the request.
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub task: Task,
    pub deduplicated: bool,
}

/// How a worker reported the end of its claim.
#[derive(Debug, Clone)]
pub enum CompletionOutcome {
    Success { result: Option<Value> },
    Failure { error_message: String },
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Create a task, or coalesce onto an equivalent non-terminal one.
    /// The fingerprint lookup and the insert are one atomic step.
    async fn create_task(&self, request: CreateTaskRequest) -> Result<CreateOutcome>;

    async fn get_task(&self, task_id: i64) -> Result<Task>;

    async fn list_tasks(&self, filter: TaskFilter) -> Result<TaskPage>;

    /// Atomically select and claim one pending task of the given type:
    /// highest priority first, FIFO within a band. Expired leases for the
    /// type are reclaimed first, so an abandoned task is immediately
    /// re-claimable. `None` means no eligible task exists.
    async fn claim_next(
        &self,
        type_name: &str,
        worker_id: &str,
        lease: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>>;

    /// Record progress for a task claimed by `worker_id`. Values outside
    /// 0-100 and regressions are rejected; progress is monotonic under one
    /// claimant.
    async fn record_progress(&self, task_id: i64, worker_id: &str, progress: i32) -> Result<Task>;

    /// Apply a completion report from `worker_id`. Failure routes through
    /// the retry policy to `pending` or `dead_letter`.
    async fn complete_task(
        &self,
        task_id: i64,
        worker_id: &str,
        outcome: CompletionOutcome,
    ) -> Result<Task>;

    /// Sweep every expired claim through the failure transition. Returns
    /// the reclaimed tasks in their new states.
    async fn reclaim_expired(&self, now: DateTime<Utc>) -> Result<Vec<Task>>;

    async fn count_by_status(&self) -> Result<HashMap<TaskStatus, usize>>;
}
