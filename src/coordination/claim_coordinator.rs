//! # Claim Coordinator
//!
//! Implements the claim protocol over the store's atomic selection and the
//! lease-expiry reclamation that keeps crashed workers from stranding
//! tasks. Claiming never blocks: when no eligible task exists the caller
//! gets [`ClaimOutcome::NoneAvailable`] immediately and applies its own
//! polling backoff.

use crate::config::CoreConfig;
use crate::error::Result;
use crate::models::task::Task;
use crate::registry::TaskTypeRegistry;
use crate::state_machine::TaskStatus;
use crate::store::TaskStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Claiming behavior knobs.
#[derive(Debug, Clone)]
pub struct ClaimConfig {
    /// Lease applied when the caller does not request one
    pub default_lease: Duration,
    /// Cap for caller-requested leases
    pub max_lease: Duration,
    /// Interval between background lease sweeps
    pub sweep_interval: Duration,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            default_lease: Duration::from_secs(300),
            max_lease: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(30),
        }
    }
}

impl ClaimConfig {
    pub fn from_core(config: &CoreConfig) -> Self {
        Self {
            default_lease: config.default_lease(),
            max_lease: config.max_lease(),
            sweep_interval: config.sweep_interval(),
        }
    }
}

/// Result of a claim call. An empty queue is a normal outcome, not an
/// error.
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    Claimed(Task),
    NoneAvailable,
}

impl ClaimOutcome {
    pub fn into_task(self) -> Option<Task> {
        match self {
            Self::Claimed(task) => Some(task),
            Self::NoneAvailable => None,
        }
    }
}

/// What a sweep found and did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub requeued: usize,
    pub dead_lettered: usize,
}

pub struct ClaimCoordinator {
    store: Arc<dyn TaskStore>,
    registry: Arc<TaskTypeRegistry>,
    config: ClaimConfig,
    coordinator_id: String,
}

impl ClaimCoordinator {
    pub fn new(store: Arc<dyn TaskStore>, registry: Arc<TaskTypeRegistry>) -> Self {
        Self::with_config(store, registry, ClaimConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn TaskStore>,
        registry: Arc<TaskTypeRegistry>,
        config: ClaimConfig,
    ) -> Self {
        Self {
            store,
            registry,
            config,
            coordinator_id: format!("coordinator-{}", Uuid::new_v4()),
        }
    }

    /// Claim one pending task of `type_name` for `worker_id`.
    ///
    /// The type is resolved via explicit lookup, not the active-only `get`:
    /// deactivation blocks new creations while in-flight tasks keep
    /// draining through claims.
    #[instrument(skip(self), fields(coordinator_id = %self.coordinator_id))]
    pub async fn claim(
        &self,
        type_name: &str,
        worker_id: &str,
        lease: Option<Duration>,
    ) -> Result<ClaimOutcome> {
        self.registry.lookup(type_name)?;

        let lease = lease
            .unwrap_or(self.config.default_lease)
            .min(self.config.max_lease);

        match self
            .store
            .claim_next(type_name, worker_id, lease, Utc::now())
            .await?
        {
            Some(task) => {
                info!(task_id = task.task_id, worker_id, "claim granted");
                Ok(ClaimOutcome::Claimed(task))
            }
            None => {
                debug!(type_name, worker_id, "no tasks available");
                Ok(ClaimOutcome::NoneAvailable)
            }
        }
    }

    /// Run one lease-expiry sweep against the store.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let reclaimed = self.store.reclaim_expired(now).await?;
        let report = SweepReport {
            requeued: reclaimed
                .iter()
                .filter(|task| task.status == TaskStatus::Pending)
                .count(),
            dead_lettered: reclaimed
                .iter()
                .filter(|task| task.status == TaskStatus::DeadLetter)
                .count(),
        };
        if report != SweepReport::default() {
            info!(
                coordinator_id = %self.coordinator_id,
                requeued = report.requeued,
                dead_lettered = report.dead_lettered,
                "lease sweep reclaimed expired claims"
            );
        }
        Ok(report)
    }

    /// Spawn the periodic sweep loop. The handle is aborted on shutdown.
    pub fn spawn_sweeper(self: Arc<Self>) -> JoinHandle<()> {
        let coordinator = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(coordinator.config.sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(error) = coordinator.sweep_once(Utc::now()).await {
                    error!(%error, "lease sweep failed");
                }
            }
        })
    }

    pub fn coordinator_id(&self) -> &str {
        &self.coordinator_id
    }

    pub fn config(&self) -> &ClaimConfig {
        &self.config
    }
}
