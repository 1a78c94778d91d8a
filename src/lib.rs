#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Taskqueue Core
//!
//! Task-queue coordination engine: a registry of typed tasks with
//! schema-validated parameters, a task lifecycle state machine, a claim
//! protocol with at-most-one-worker ownership, progress reporting, and a
//! retry/dead-letter policy.
//!
//! ## Architecture
//!
//! All task mutation flows through the [`store::TaskStore`] boundary,
//! whose operations are atomic and ownership-checked. Workers never get
//! read-then-write access to task rows; the claim protocol, the
//! fingerprint-based dedup check, and every guarded transition live behind
//! that seam.
//!
//! ## Module Organization
//!
//! - [`models`] - Task and task type records
//! - [`schema`] - Parameter schema validation and registration meta-rules
//! - [`fingerprint`] - Canonical-JSON dedup keys
//! - [`state_machine`] - Lifecycle states, events, and the transition function
//! - [`store`] - The atomic task store boundary and its embedded implementation
//! - [`registry`] - Task type registry
//! - [`coordination`] - Claim protocol, progress tracking, retry policy
//! - [`web`] - REST API implementing the wire contract
//! - [`config`] / [`logging`] / [`error`] / [`validation`] - ambient concerns
//!
//! ## Quick Start
//!
//! ```rust
//! use taskqueue_core::models::{CreateTaskRequest, TaskTypeRegistration};
//! use taskqueue_core::registry::TaskTypeRegistry;
//! use taskqueue_core::store::{InMemoryTaskStore, TaskStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> taskqueue_core::Result<()> {
//! let registry = Arc::new(TaskTypeRegistry::new());
//! registry.register(TaskTypeRegistration::new(
//!     "Demo.Echo",
//!     "1.0.0",
//!     serde_json::json!({
//!         "type": "object",
//!         "required": ["msg"],
//!         "properties": { "msg": { "type": "string" } }
//!     }),
//! ))?;
//!
//! let store = InMemoryTaskStore::new(registry, 3);
//! let outcome = store
//!     .create_task(CreateTaskRequest::new(
//!         "Demo.Echo",
//!         serde_json::json!({ "msg": "hi" }),
//!     ))
//!     .await?;
//! assert!(!outcome.deduplicated);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordination;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod models;
pub mod registry;
pub mod schema;
pub mod state_machine;
pub mod store;
pub mod validation;
pub mod web;

pub use config::CoreConfig;
pub use coordination::{ClaimCoordinator, ClaimOutcome, DeadLetterManager, ProgressTracker, RetryPolicy};
pub use error::{CoreError, Result, Violation};
pub use models::{CreateTaskRequest, Task, TaskType, TaskTypeRegistration};
pub use registry::TaskTypeRegistry;
pub use schema::{SchemaValidator, ValidationReport};
pub use state_machine::TaskStatus;
pub use store::{CompletionOutcome, CreateOutcome, InMemoryTaskStore, TaskStore};
