use crate::state_machine::states::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A unit of queued work and its full lifecycle record.
///
/// Tasks are mutated only by the store's atomic operations; everything
/// else sees clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: i64,
    pub type_name: String,
    /// Schema-validated parameter document (defaults already applied)
    pub params: Value,
    /// Dedup key over `(type_name, canonical params)`
    pub fingerprint: String,
    pub status: TaskStatus,
    /// Higher is more urgent; FIFO within a priority band
    pub priority: i32,
    /// Claims taken so far, including the live one
    pub attempts: u32,
    pub max_attempts: u32,
    /// 0-100, meaningful only while claimed; resets on each claim
    pub progress: i32,
    pub result: Option<Value>,
    pub error_message: Option<String>,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_claimed_by(&self, worker_id: &str) -> bool {
        self.claimed_by.as_deref() == Some(worker_id)
    }

    /// A claim whose lease has elapsed is eligible for reclamation.
    pub fn is_lease_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Claimed
            && self.lease_expires_at.is_some_and(|expires| expires <= now)
    }
}

/// Creation input for the store. `priority` and `max_attempts` fall back
/// to configured defaults when unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub type_name: String,
    pub params: Value,
    pub priority: Option<i32>,
    pub max_attempts: Option<u32>,
}

impl CreateTaskRequest {
    pub fn new(type_name: impl Into<String>, params: Value) -> Self {
        Self {
            type_name: type_name.into(),
            params,
            priority: None,
            max_attempts: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// Filter for task listings. `limit`/`offset` default at the store when
/// unset.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub type_name: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// One page of tasks plus the pagination echo the wire contract requires.
#[derive(Debug, Clone, Serialize)]
pub struct TaskPage {
    pub data: Vec<Task>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn sample_task(status: TaskStatus) -> Task {
        let now = Utc::now();
        Task {
            task_id: 1,
            type_name: "Demo.Echo".to_string(),
            params: json!({"msg": "hi"}),
            fingerprint: "abc".to_string(),
            status,
            priority: 0,
            attempts: 1,
            max_attempts: 3,
            progress: 0,
            result: None,
            error_message: None,
            claimed_by: Some("worker-1".to_string()),
            claimed_at: Some(now),
            lease_expires_at: Some(now + Duration::seconds(300)),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn test_claimed_by_check() {
        let task = sample_task(TaskStatus::Claimed);
        assert!(task.is_claimed_by("worker-1"));
        assert!(!task.is_claimed_by("worker-2"));
    }

    #[test]
    fn test_lease_expiry_check() {
        let task = sample_task(TaskStatus::Claimed);
        let now = Utc::now();
        assert!(!task.is_lease_expired(now));
        assert!(task.is_lease_expired(now + Duration::seconds(301)));
    }

    #[test]
    fn test_lease_expiry_only_applies_to_claimed() {
        let mut task = sample_task(TaskStatus::Pending);
        task.claimed_by = None;
        let far_future = Utc::now() + Duration::days(1);
        assert!(!task.is_lease_expired(far_future));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let task = sample_task(TaskStatus::Claimed);
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["status"], "claimed");
        assert_eq!(value["claimed_by"], "worker-1");
    }
}
