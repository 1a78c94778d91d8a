//! In-memory task store.
//!
//! The embedded deployment of the store: one mutex around the task map,
//! making every trait operation a single critical section. Claim
//! selection, the dedup check-then-insert, and guarded transitions are
//! therefore atomic without per-row versioning.

use super::{CompletionOutcome, CreateOutcome, TaskStore, DEFAULT_PAGE_SIZE};
use crate::coordination::retry_policy::RetryPolicy;
use crate::error::{CoreError, Result};
use crate::fingerprint;
use crate::models::task::{CreateTaskRequest, Task, TaskFilter, TaskPage};
use crate::registry::TaskTypeRegistry;
use crate::schema::SchemaValidator;
use crate::state_machine::{guards, next_status, TaskEvent, TaskStatus};
use crate::validation::{validate_task_params, validate_task_result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct InMemoryTaskStore {
    registry: Arc<TaskTypeRegistry>,
    validator: SchemaValidator,
    retry_policy: RetryPolicy,
    default_max_attempts: u32,
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    tasks: BTreeMap<i64, Task>,
    /// fingerprint -> task id, non-terminal tasks only
    in_flight: HashMap<String, i64>,
    next_task_id: i64,
}

impl InMemoryTaskStore {
    pub fn new(registry: Arc<TaskTypeRegistry>, default_max_attempts: u32) -> Self {
        Self {
            registry,
            validator: SchemaValidator::new(),
            retry_policy: RetryPolicy::default(),
            default_max_attempts,
            inner: Mutex::new(StoreInner {
                tasks: BTreeMap::new(),
                in_flight: HashMap::new(),
                next_task_id: 1,
            }),
        }
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create_task(&self, request: CreateTaskRequest) -> Result<CreateOutcome> {
        // Deactivated types are rejected here: `get` resolves active only.
        let task_type = self.registry.get(&request.type_name)?;

        validate_task_params(&request.params)?;
        let params = self
            .validator
            .apply_defaults(&request.params, &task_type.param_schema);
        let report = self.validator.validate(&params, &task_type.param_schema);
        if !report.valid {
            return Err(CoreError::validation(report.violations));
        }

        let digest = fingerprint::fingerprint(&request.type_name, &params);

        let mut inner = self.inner.lock();
        if let Some(&existing_id) = inner.in_flight.get(&digest) {
            if let Some(existing) = inner.tasks.get(&existing_id) {
                debug!(
                    task_id = existing_id,
                    type_name = %request.type_name,
                    "create coalesced onto in-flight task"
                );
                return Ok(CreateOutcome {
                    task: existing.clone(),
                    deduplicated: true,
                });
            }
        }

        let now = Utc::now();
        let task_id = inner.next_task_id;
        inner.next_task_id += 1;
        let task = Task {
            task_id,
            type_name: request.type_name,
            params,
            fingerprint: digest.clone(),
            status: TaskStatus::Pending,
            priority: request.priority.unwrap_or(0),
            attempts: 0,
            // Every task gets at least one attempt, or it could never run.
            max_attempts: request.max_attempts.unwrap_or(self.default_max_attempts).max(1),
            progress: 0,
            result: None,
            error_message: None,
            claimed_by: None,
            claimed_at: None,
            lease_expires_at: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        inner.in_flight.insert(digest, task_id);
        inner.tasks.insert(task_id, task.clone());
        info!(task_id, type_name = %task.type_name, priority = task.priority, "task created");

        Ok(CreateOutcome {
            task,
            deduplicated: false,
        })
    }

    async fn get_task(&self, task_id: i64) -> Result<Task> {
        self.inner
            .lock()
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("task", task_id))
    }

    async fn list_tasks(&self, filter: TaskFilter) -> Result<TaskPage> {
        let inner = self.inner.lock();
        let matching: Vec<&Task> = inner
            .tasks
            .values()
            .filter(|task| filter.status.map_or(true, |status| task.status == status))
            .filter(|task| {
                filter
                    .type_name
                    .as_deref()
                    .map_or(true, |name| task.type_name == name)
            })
            .collect();

        let total = matching.len() as u64;
        let limit = filter.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = filter.offset.unwrap_or(0);
        let data = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(TaskPage {
            data,
            total,
            limit,
            offset,
        })
    }

    async fn claim_next(
        &self,
        type_name: &str,
        worker_id: &str,
        lease: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>> {
        let lease = chrono::Duration::from_std(lease)
            .map_err(|_| CoreError::InvalidInput("lease duration out of range".to_string()))?;

        let mut inner = self.inner.lock();

        // Lazy reclamation keeps abandoned tasks claimable even between
        // sweeps; same transition path as the sweep.
        inner.reclaim_expired_leases(Some(type_name), now, &self.retry_policy);

        let candidate = inner
            .tasks
            .values()
            .filter(|task| task.status == TaskStatus::Pending && task.type_name == type_name)
            .max_by(|a, b| {
                a.priority
                    .cmp(&b.priority)
                    .then_with(|| b.created_at.cmp(&a.created_at))
                    .then_with(|| b.task_id.cmp(&a.task_id))
            })
            .map(|task| task.task_id);

        let Some(task_id) = candidate else {
            return Ok(None);
        };

        let Some(task) = inner.tasks.get_mut(&task_id) else {
            return Ok(None);
        };

        let event = TaskEvent::Claim {
            worker_id: worker_id.to_string(),
        };
        let disposition = self
            .retry_policy
            .disposition(task.attempts, task.max_attempts);
        task.status = next_status(task.status, &event, disposition)?;
        task.claimed_by = Some(worker_id.to_string());
        task.claimed_at = Some(now);
        task.lease_expires_at = Some(now + lease);
        task.attempts += 1;
        task.progress = 0;
        task.updated_at = now;
        info!(
            task_id,
            worker_id,
            attempts = task.attempts,
            lease_expires_at = %task.lease_expires_at.unwrap_or(now),
            "task claimed"
        );

        Ok(Some(task.clone()))
    }

    async fn record_progress(&self, task_id: i64, worker_id: &str, progress: i32) -> Result<Task> {
        let mut inner = self.inner.lock();
        let task = inner
            .tasks
            .get_mut(&task_id)
            .ok_or_else(|| CoreError::not_found("task", task_id))?;

        guards::ensure_progress_allowed(task, worker_id)?;
        if !(0..=100).contains(&progress) {
            return Err(CoreError::InvalidProgress {
                task_id,
                value: progress,
                reason: "progress must be between 0 and 100".to_string(),
            });
        }
        if progress < task.progress {
            return Err(CoreError::InvalidProgress {
                task_id,
                value: progress,
                reason: format!("progress may not decrease (currently {})", task.progress),
            });
        }

        task.progress = progress;
        task.updated_at = Utc::now();
        debug!(task_id, worker_id, progress, "progress recorded");
        Ok(task.clone())
    }

    async fn complete_task(
        &self,
        task_id: i64,
        worker_id: &str,
        outcome: CompletionOutcome,
    ) -> Result<Task> {
        if let CompletionOutcome::Success {
            result: Some(result),
        } = &outcome
        {
            validate_task_result(result)?;
        }

        let now = Utc::now();
        let mut inner = self.inner.lock();

        let snapshot = {
            let task = inner
                .tasks
                .get_mut(&task_id)
                .ok_or_else(|| CoreError::not_found("task", task_id))?;

            guards::ensure_completion_allowed(task, worker_id)?;

            match outcome {
                CompletionOutcome::Success { result } => {
                    let disposition = self
                        .retry_policy
                        .disposition(task.attempts, task.max_attempts);
                    task.status = next_status(task.status, &TaskEvent::Complete, disposition)?;
                    task.result = result;
                    task.completed_at = Some(now);
                    task.lease_expires_at = None;
                    info!(task_id, worker_id, "task completed");
                }
                CompletionOutcome::Failure { error_message } => {
                    let disposition = self
                        .retry_policy
                        .disposition(task.attempts, task.max_attempts);
                    task.status = next_status(
                        task.status,
                        &TaskEvent::Fail(error_message.clone()),
                        disposition,
                    )?;
                    task.error_message = Some(error_message);
                    match task.status {
                        TaskStatus::Pending => {
                            task.claimed_by = None;
                            task.claimed_at = None;
                            task.lease_expires_at = None;
                            task.progress = 0;
                            info!(
                                task_id,
                                worker_id,
                                attempts = task.attempts,
                                max_attempts = task.max_attempts,
                                "task failed, requeued"
                            );
                        }
                        TaskStatus::DeadLetter => {
                            task.claimed_by = None;
                            task.claimed_at = None;
                            task.lease_expires_at = None;
                            warn!(
                                task_id,
                                worker_id,
                                attempts = task.attempts,
                                "task failed, attempts exhausted, routed to dead letter"
                            );
                        }
                        _ => {}
                    }
                }
            }
            task.updated_at = now;
            task.clone()
        };

        if snapshot.status.is_terminal() {
            inner.in_flight.remove(&snapshot.fingerprint);
        }
        Ok(snapshot)
    }

    async fn reclaim_expired(&self, now: DateTime<Utc>) -> Result<Vec<Task>> {
        let mut inner = self.inner.lock();
        Ok(inner.reclaim_expired_leases(None, now, &self.retry_policy))
    }

    async fn count_by_status(&self) -> Result<HashMap<TaskStatus, usize>> {
        let inner = self.inner.lock();
        let mut counts = HashMap::new();
        for task in inner.tasks.values() {
            *counts.entry(task.status).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

impl StoreInner {
    /// Apply the failure transition to every expired claim, optionally
    /// restricted to one task type. Shared by the sweep and the lazy check
    /// at claim time, so the two paths cannot diverge.
    fn reclaim_expired_leases(
        &mut self,
        type_name: Option<&str>,
        now: DateTime<Utc>,
        retry_policy: &RetryPolicy,
    ) -> Vec<Task> {
        let expired: Vec<i64> = self
            .tasks
            .values()
            .filter(|task| task.is_lease_expired(now))
            .filter(|task| type_name.map_or(true, |name| task.type_name == name))
            .map(|task| task.task_id)
            .collect();

        let mut reclaimed = Vec::with_capacity(expired.len());
        for task_id in expired {
            let Some(task) = self.tasks.get_mut(&task_id) else {
                continue;
            };
            let defaulting_worker = task.claimed_by.clone().unwrap_or_default();
            let disposition = retry_policy.disposition(task.attempts, task.max_attempts);
            let Ok(next) = next_status(task.status, &TaskEvent::LeaseExpired, disposition) else {
                continue;
            };

            task.status = next;
            task.claimed_by = None;
            task.claimed_at = None;
            task.lease_expires_at = None;
            match next {
                TaskStatus::Pending => {
                    task.progress = 0;
                }
                TaskStatus::DeadLetter => {
                    // No worker-supplied message exists on this path.
                    task.error_message = Some(format!(
                        "lease expired while claimed by {defaulting_worker}"
                    ));
                }
                _ => {}
            }
            task.updated_at = now;
            warn!(
                task_id,
                worker_id = %defaulting_worker,
                status = %task.status,
                "expired lease reclaimed"
            );

            let snapshot = task.clone();
            if snapshot.status.is_terminal() {
                self.in_flight.remove(&snapshot.fingerprint);
            }
            reclaimed.push(snapshot);
        }
        reclaimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task_type::TaskTypeRegistration;
    use serde_json::json;

    fn store_with_echo_type() -> InMemoryTaskStore {
        let registry = Arc::new(TaskTypeRegistry::new());
        registry
            .register(TaskTypeRegistration::new(
                "Demo.Echo",
                "1.0.0",
                json!({
                    "type": "object",
                    "required": ["msg"],
                    "properties": {
                        "msg": { "type": "string" },
                        "count": { "type": "integer", "default": 1 }
                    }
                }),
            ))
            .unwrap();
        InMemoryTaskStore::new(registry, 3)
    }

    fn echo_request(msg: &str) -> CreateTaskRequest {
        CreateTaskRequest::new("Demo.Echo", json!({ "msg": msg }))
    }

    #[tokio::test]
    async fn test_create_validates_and_applies_defaults() {
        let store = store_with_echo_type();
        let outcome = store.create_task(echo_request("hi")).await.unwrap();
        assert!(!outcome.deduplicated);
        assert_eq!(outcome.task.status, TaskStatus::Pending);
        assert_eq!(outcome.task.params["count"], 1);

        let invalid = store
            .create_task(CreateTaskRequest::new("Demo.Echo", json!({"msg": 42})))
            .await;
        assert!(matches!(invalid, Err(CoreError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_type() {
        let store = store_with_echo_type();
        let result = store
            .create_task(CreateTaskRequest::new("Demo.Missing", json!({})))
            .await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_dedup_coalesces_in_flight_tasks() {
        let store = store_with_echo_type();
        let first = store.create_task(echo_request("hi")).await.unwrap();
        let second = store.create_task(echo_request("hi")).await.unwrap();
        assert!(second.deduplicated);
        assert_eq!(first.task.task_id, second.task.task_id);

        // Equivalent params in a different key order coalesce too.
        let reordered: serde_json::Value =
            serde_json::from_str(r#"{"count": 1, "msg": "hi"}"#).unwrap();
        let third = store
            .create_task(CreateTaskRequest::new("Demo.Echo", reordered))
            .await
            .unwrap();
        assert!(third.deduplicated);
    }

    #[tokio::test]
    async fn test_completed_task_can_be_recreated() {
        let store = store_with_echo_type();
        let first = store.create_task(echo_request("hi")).await.unwrap();
        let claimed = store
            .claim_next("Demo.Echo", "worker-1", Duration::from_secs(300), Utc::now())
            .await
            .unwrap()
            .unwrap();
        store
            .complete_task(
                claimed.task_id,
                "worker-1",
                CompletionOutcome::Success { result: None },
            )
            .await
            .unwrap();

        let fresh = store.create_task(echo_request("hi")).await.unwrap();
        assert!(!fresh.deduplicated);
        assert_ne!(fresh.task.task_id, first.task.task_id);
    }

    #[tokio::test]
    async fn test_claim_orders_by_priority_then_fifo() {
        let store = store_with_echo_type();
        let low = store
            .create_task(echo_request("low").with_priority(1))
            .await
            .unwrap();
        let high_old = store
            .create_task(echo_request("high old").with_priority(5))
            .await
            .unwrap();
        let high_new = store
            .create_task(echo_request("high new").with_priority(5))
            .await
            .unwrap();

        let now = Utc::now();
        let lease = Duration::from_secs(300);
        let first = store
            .claim_next("Demo.Echo", "w", lease, now)
            .await
            .unwrap()
            .unwrap();
        let second = store
            .claim_next("Demo.Echo", "w", lease, now)
            .await
            .unwrap()
            .unwrap();
        let third = store
            .claim_next("Demo.Echo", "w", lease, now)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.task_id, high_old.task.task_id);
        assert_eq!(second.task_id, high_new.task.task_id);
        assert_eq!(third.task_id, low.task.task_id);
        assert!(store
            .claim_next("Demo.Echo", "w", lease, now)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_claim_sets_lease_and_attempts() {
        let store = store_with_echo_type();
        store.create_task(echo_request("hi")).await.unwrap();
        let now = Utc::now();
        let claimed = store
            .claim_next("Demo.Echo", "worker-1", Duration::from_secs(60), now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claimed.status, TaskStatus::Claimed);
        assert_eq!(claimed.claimed_by.as_deref(), Some("worker-1"));
        assert_eq!(claimed.attempts, 1);
        assert_eq!(
            claimed.lease_expires_at.unwrap(),
            now + chrono::Duration::seconds(60)
        );
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_per_claimant() {
        let store = store_with_echo_type();
        store.create_task(echo_request("hi")).await.unwrap();
        let claimed = store
            .claim_next("Demo.Echo", "worker-1", Duration::from_secs(300), Utc::now())
            .await
            .unwrap()
            .unwrap();

        store
            .record_progress(claimed.task_id, "worker-1", 40)
            .await
            .unwrap();
        let regression = store.record_progress(claimed.task_id, "worker-1", 30).await;
        assert!(matches!(regression, Err(CoreError::InvalidProgress { .. })));

        // Bounds are enforced at the store seam, not just in the tracker.
        for value in [-1, 101, 150] {
            let out_of_range = store
                .record_progress(claimed.task_id, "worker-1", value)
                .await;
            assert!(matches!(
                out_of_range,
                Err(CoreError::InvalidProgress { .. })
            ));
        }

        let wrong_worker = store.record_progress(claimed.task_id, "worker-2", 50).await;
        assert!(matches!(
            wrong_worker,
            Err(CoreError::NotClaimedByCaller { .. })
        ));
    }

    #[tokio::test]
    async fn test_failure_requeues_until_attempts_exhausted() {
        let store = store_with_echo_type();
        store
            .create_task(echo_request("hi").with_max_attempts(2))
            .await
            .unwrap();
        let lease = Duration::from_secs(300);

        let first = store
            .claim_next("Demo.Echo", "worker-1", lease, Utc::now())
            .await
            .unwrap()
            .unwrap();
        let failed_once = store
            .complete_task(
                first.task_id,
                "worker-1",
                CompletionOutcome::Failure {
                    error_message: "boom".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(failed_once.status, TaskStatus::Pending);
        assert_eq!(failed_once.attempts, 1);
        assert!(failed_once.claimed_by.is_none());

        let second = store
            .claim_next("Demo.Echo", "worker-2", lease, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.attempts, 2);
        let dead = store
            .complete_task(
                second.task_id,
                "worker-2",
                CompletionOutcome::Failure {
                    error_message: "boom again".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(dead.status, TaskStatus::DeadLetter);
        assert_eq!(dead.attempts, 2);
        assert_eq!(dead.error_message.as_deref(), Some("boom again"));
    }

    #[tokio::test]
    async fn test_complete_on_non_claimed_task_is_stale() {
        let store = store_with_echo_type();
        let created = store.create_task(echo_request("hi")).await.unwrap();
        let premature = store
            .complete_task(
                created.task.task_id,
                "worker-1",
                CompletionOutcome::Success { result: None },
            )
            .await;
        assert!(matches!(premature, Err(CoreError::StaleClaim { .. })));
    }

    #[tokio::test]
    async fn test_reclaim_requeues_expired_claims() {
        let store = store_with_echo_type();
        store.create_task(echo_request("hi")).await.unwrap();
        let t0 = Utc::now();
        let claimed = store
            .claim_next("Demo.Echo", "worker-1", Duration::from_secs(5), t0)
            .await
            .unwrap()
            .unwrap();

        // Before expiry nothing is reclaimed.
        let early = store
            .reclaim_expired(t0 + chrono::Duration::seconds(4))
            .await
            .unwrap();
        assert!(early.is_empty());

        let reclaimed = store
            .reclaim_expired(t0 + chrono::Duration::seconds(6))
            .await
            .unwrap();
        assert_eq!(reclaimed.len(), 1);
        assert_eq!(reclaimed[0].task_id, claimed.task_id);
        assert_eq!(reclaimed[0].status, TaskStatus::Pending);
        assert!(reclaimed[0].claimed_by.is_none());
    }

    #[tokio::test]
    async fn test_reclaim_dead_letters_exhausted_claims() {
        let store = store_with_echo_type();
        store
            .create_task(echo_request("hi").with_max_attempts(1))
            .await
            .unwrap();
        let t0 = Utc::now();
        store
            .claim_next("Demo.Echo", "worker-1", Duration::from_secs(5), t0)
            .await
            .unwrap()
            .unwrap();

        let reclaimed = store
            .reclaim_expired(t0 + chrono::Duration::seconds(6))
            .await
            .unwrap();
        assert_eq!(reclaimed[0].status, TaskStatus::DeadLetter);
        assert!(reclaimed[0]
            .error_message
            .as_deref()
            .unwrap()
            .contains("lease expired"));
    }

    #[tokio::test]
    async fn test_lazy_reclaim_at_claim_time() {
        let store = store_with_echo_type();
        store.create_task(echo_request("hi")).await.unwrap();
        let t0 = Utc::now();
        let first = store
            .claim_next("Demo.Echo", "worker-1", Duration::from_secs(5), t0)
            .await
            .unwrap()
            .unwrap();

        // worker-2 claims after the lease elapsed, without a sweep running.
        let second = store
            .claim_next(
                "Demo.Echo",
                "worker-2",
                Duration::from_secs(5),
                t0 + chrono::Duration::seconds(6),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.task_id, first.task_id);
        assert_eq!(second.claimed_by.as_deref(), Some("worker-2"));
        assert_eq!(second.attempts, 2);

        // worker-1's late completion must surface the conflict.
        let late = store
            .complete_task(
                first.task_id,
                "worker-1",
                CompletionOutcome::Success { result: None },
            )
            .await;
        assert!(matches!(late, Err(CoreError::StaleClaim { .. })));
    }

    #[tokio::test]
    async fn test_list_tasks_filters_and_paginates() {
        let store = store_with_echo_type();
        for i in 0..5 {
            store
                .create_task(echo_request(&format!("msg {i}")))
                .await
                .unwrap();
        }
        store
            .claim_next("Demo.Echo", "worker-1", Duration::from_secs(300), Utc::now())
            .await
            .unwrap()
            .unwrap();

        let pending = store
            .list_tasks(TaskFilter {
                status: Some(TaskStatus::Pending),
                ..TaskFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(pending.total, 4);

        let page = store
            .list_tasks(TaskFilter {
                limit: Some(2),
                offset: Some(1),
                ..TaskFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.limit, 2);
        assert_eq!(page.offset, 1);
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let store = store_with_echo_type();
        store.create_task(echo_request("a")).await.unwrap();
        store.create_task(echo_request("b")).await.unwrap();
        store
            .claim_next("Demo.Echo", "worker-1", Duration::from_secs(300), Utc::now())
            .await
            .unwrap()
            .unwrap();

        let counts = store.count_by_status().await.unwrap();
        assert_eq!(counts.get(&TaskStatus::Pending), Some(&1));
        assert_eq!(counts.get(&TaskStatus::Claimed), Some(&1));
    }
}
