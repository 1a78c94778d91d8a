//! Retry decisions and the dead-letter surface.

use crate::error::Result;
use crate::models::task::{TaskFilter, TaskPage};
use crate::state_machine::{FailureDisposition, TaskStatus};
use crate::store::TaskStore;
use std::collections::HashMap;
use std::sync::Arc;

/// Decides whether a failed claim is requeued or routed to dead letter.
///
/// One decision point for both explicit worker failure and lease-expiry
/// reclamation; the store consults it inside every failure transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy;

impl RetryPolicy {
    /// `attempts` counts claims taken so far, including the one that just
    /// failed. Dead letter exactly when attempts are exhausted.
    pub fn disposition(&self, attempts: u32, max_attempts: u32) -> FailureDisposition {
        if attempts < max_attempts {
            FailureDisposition::Requeue
        } else {
            FailureDisposition::DeadLetter
        }
    }
}

/// Read-side surface over terminally failed tasks.
pub struct DeadLetterManager {
    store: Arc<dyn TaskStore>,
}

impl DeadLetterManager {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        type_name: Option<String>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<TaskPage> {
        self.store
            .list_tasks(TaskFilter {
                status: Some(TaskStatus::DeadLetter),
                type_name,
                limit,
                offset,
            })
            .await
    }

    pub async fn counts(&self) -> Result<HashMap<TaskStatus, usize>> {
        self.store.count_by_status().await
    }
}
