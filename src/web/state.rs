//! Shared application state for the web API.

use crate::config::CoreConfig;
use crate::coordination::{ClaimConfig, ClaimCoordinator, DeadLetterManager, ProgressTracker};
use crate::registry::TaskTypeRegistry;
use crate::store::{InMemoryTaskStore, TaskStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CoreConfig>,
    pub registry: Arc<TaskTypeRegistry>,
    pub store: Arc<dyn TaskStore>,
    pub claim_coordinator: Arc<ClaimCoordinator>,
    pub progress_tracker: Arc<ProgressTracker>,
    pub dead_letters: Arc<DeadLetterManager>,
}

impl AppState {
    /// Wire the full component graph over the embedded store.
    pub fn build(config: CoreConfig) -> Self {
        let registry = Arc::new(TaskTypeRegistry::new());
        let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new(
            Arc::clone(&registry),
            config.default_max_attempts,
        ));
        let claim_coordinator = Arc::new(ClaimCoordinator::with_config(
            Arc::clone(&store),
            Arc::clone(&registry),
            ClaimConfig::from_core(&config),
        ));
        let progress_tracker = Arc::new(ProgressTracker::new(Arc::clone(&store)));
        let dead_letters = Arc::new(DeadLetterManager::new(Arc::clone(&store)));

        Self {
            config: Arc::new(config),
            registry,
            store,
            claim_coordinator,
            progress_tracker,
            dead_letters,
        }
    }
}
