//! Claim exclusivity under concurrent workers: no two workers ever
//! observe the same task id as claimed.

use futures::future::join_all;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use taskqueue_core::coordination::{ClaimCoordinator, ClaimOutcome};
use taskqueue_core::models::{CreateTaskRequest, TaskTypeRegistration};
use taskqueue_core::registry::TaskTypeRegistry;
use taskqueue_core::store::{InMemoryTaskStore, TaskStore};

const TASK_COUNT: usize = 50;
const WORKER_COUNT: usize = 20;

fn setup() -> (Arc<InMemoryTaskStore>, Arc<ClaimCoordinator>) {
    let registry = Arc::new(TaskTypeRegistry::new());
    registry
        .register(TaskTypeRegistration::new(
            "Load.Unit",
            "1.0.0",
            json!({
                "type": "object",
                "required": ["index"],
                "properties": { "index": { "type": "integer" } }
            }),
        ))
        .unwrap();
    let store = Arc::new(InMemoryTaskStore::new(Arc::clone(&registry), 3));
    let coordinator = Arc::new(ClaimCoordinator::new(
        Arc::clone(&store) as Arc<dyn TaskStore>,
        registry,
    ));
    (store, coordinator)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_claims_never_hand_out_the_same_task() {
    let (store, coordinator) = setup();
    for index in 0..TASK_COUNT {
        store
            .create_task(CreateTaskRequest::new(
                "Load.Unit",
                json!({ "index": index }),
            ))
            .await
            .unwrap();
    }

    let workers = (0..WORKER_COUNT).map(|worker_index| {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            let worker_id = format!("worker-{worker_index}");
            let mut claimed_ids = Vec::new();
            loop {
                match coordinator.claim("Load.Unit", &worker_id, None).await.unwrap() {
                    ClaimOutcome::Claimed(task) => claimed_ids.push(task.task_id),
                    ClaimOutcome::NoneAvailable => break,
                }
            }
            claimed_ids
        })
    });

    let results = join_all(workers).await;
    let mut seen = HashSet::new();
    let mut total = 0;
    for handle_result in results {
        for task_id in handle_result.unwrap() {
            total += 1;
            assert!(
                seen.insert(task_id),
                "task {task_id} was claimed by two workers"
            );
        }
    }
    assert_eq!(total, TASK_COUNT, "every task claimed exactly once");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_creates_of_identical_params_coalesce() {
    let (store, _coordinator) = setup();

    let creators = (0..WORKER_COUNT).map(|_| {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .create_task(CreateTaskRequest::new("Load.Unit", json!({ "index": 7 })))
                .await
                .unwrap()
        })
    });

    let outcomes = join_all(creators).await;
    let mut ids = HashSet::new();
    let mut fresh_creates = 0;
    for outcome in outcomes {
        let outcome = outcome.unwrap();
        ids.insert(outcome.task.task_id);
        if !outcome.deduplicated {
            fresh_creates += 1;
        }
    }
    assert_eq!(ids.len(), 1, "all concurrent creates landed on one task");
    assert_eq!(fresh_creates, 1, "exactly one create inserted a row");
}

#[tokio::test]
async fn priority_bands_drain_in_order() {
    let (store, coordinator) = setup();

    // Interleave creations across priorities; claims must drain the high
    // band FIFO before touching the low band.
    let mut expected = Vec::new();
    for index in 0..3 {
        let high = store
            .create_task(
                CreateTaskRequest::new("Load.Unit", json!({ "index": index }))
                    .with_priority(10),
            )
            .await
            .unwrap();
        expected.push(high.task.task_id);
    }
    for index in 10..13 {
        store
            .create_task(CreateTaskRequest::new("Load.Unit", json!({ "index": index })))
            .await
            .unwrap();
    }

    for expected_id in expected {
        let task = coordinator
            .claim("Load.Unit", "worker-1", None)
            .await
            .unwrap()
            .into_task()
            .unwrap();
        assert_eq!(task.task_id, expected_id);
        assert_eq!(task.priority, 10);
    }
}
