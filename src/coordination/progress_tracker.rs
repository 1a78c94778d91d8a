//! Progress reporting for claimed tasks.

use crate::error::{CoreError, Result};
use crate::models::task::Task;
use crate::store::TaskStore;
use std::sync::Arc;
use tracing::debug;

/// Validates and records progress updates. Ownership is enforced by the
/// store's conditional update; this layer rejects out-of-range values
/// before taking the store lock.
pub struct ProgressTracker {
    store: Arc<dyn TaskStore>,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Record `progress` (0-100) for a task claimed by `worker_id`.
    /// Does not change task status.
    pub async fn update_progress(
        &self,
        task_id: i64,
        worker_id: &str,
        progress: i32,
    ) -> Result<Task> {
        if !(0..=100).contains(&progress) {
            return Err(CoreError::InvalidProgress {
                task_id,
                value: progress,
                reason: "progress must be between 0 and 100".to_string(),
            });
        }
        let task = self.store.record_progress(task_id, worker_id, progress).await?;
        debug!(task_id, worker_id, progress, "progress updated");
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::CreateTaskRequest;
    use crate::models::task_type::TaskTypeRegistration;
    use crate::registry::TaskTypeRegistry;
    use crate::store::InMemoryTaskStore;
    use chrono::Utc;
    use serde_json::json;
    use std::time::Duration;

    async fn claimed_task_setup() -> (Arc<InMemoryTaskStore>, i64) {
        let registry = Arc::new(TaskTypeRegistry::new());
        registry
            .register(TaskTypeRegistration::new(
                "Demo.Echo",
                "1.0.0",
                json!({"type": "object"}),
            ))
            .unwrap();
        let store = Arc::new(InMemoryTaskStore::new(registry, 3));
        store
            .create_task(CreateTaskRequest::new("Demo.Echo", json!({})))
            .await
            .unwrap();
        let claimed = store
            .claim_next("Demo.Echo", "worker-1", Duration::from_secs(300), Utc::now())
            .await
            .unwrap()
            .unwrap();
        (store, claimed.task_id)
    }

    #[tokio::test]
    async fn test_valid_progress_recorded() {
        let (store, task_id) = claimed_task_setup().await;
        let tracker = ProgressTracker::new(store);
        let task = tracker.update_progress(task_id, "worker-1", 55).await.unwrap();
        assert_eq!(task.progress, 55);
    }

    #[tokio::test]
    async fn test_out_of_range_progress_rejected() {
        let (store, task_id) = claimed_task_setup().await;
        let tracker = ProgressTracker::new(store);
        for value in [-1, 101] {
            let result = tracker.update_progress(task_id, "worker-1", value).await;
            assert!(matches!(result, Err(CoreError::InvalidProgress { .. })));
        }
    }

    #[tokio::test]
    async fn test_non_owner_rejected() {
        let (store, task_id) = claimed_task_setup().await;
        let tracker = ProgressTracker::new(store);
        let result = tracker.update_progress(task_id, "worker-2", 10).await;
        assert!(matches!(result, Err(CoreError::NotClaimedByCaller { .. })));
    }
}
