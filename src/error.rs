//! Structured error handling for the task-queue core.
//!
//! Every domain failure is a [`CoreError`] variant; callers match on the
//! variant rather than parsing messages. An empty claim result is not an
//! error and is modeled as [`crate::coordination::ClaimOutcome::NoneAvailable`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single schema or parameter violation, anchored to the JSON path where
/// it occurred (`"/"` for the document root, `"/msg"` for a field).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Parameter document rejected by the task type's schema.
    #[error("parameter validation failed: {}", summarize(.violations))]
    Validation { violations: Vec<Violation> },

    /// Schema document rejected at registration time by the meta-rules.
    #[error("invalid schema: {}", summarize(.violations))]
    InvalidSchema { violations: Vec<Violation> },

    #[error("{resource} not found: {key}")]
    NotFound { resource: &'static str, key: String },

    /// Ownership check failed for a progress update.
    #[error("task {task_id} is not claimed by worker {worker_id}")]
    NotClaimedByCaller { task_id: i64, worker_id: String },

    /// The caller's claim is no longer the live one (lease expired and the
    /// task moved on, or it already reached a terminal state).
    #[error("claim on task {task_id} is stale for worker {worker_id}")]
    StaleClaim { task_id: i64, worker_id: String },

    #[error("invalid progress {value} for task {task_id}: {reason}")]
    InvalidProgress {
        task_id: i64,
        value: i32,
        reason: String,
    },

    /// Lifecycle event applied to a state that does not accept it.
    #[error("invalid transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },

    /// Caller input rejected before validation proper (size caps, wrong
    /// top-level shape, unparseable filter values).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transient infrastructure failure; the only class where caller-side
    /// retry with backoff is appropriate.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    pub fn not_found(resource: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            resource,
            key: key.to_string(),
        }
    }

    pub fn validation(violations: Vec<Violation>) -> Self {
        Self::Validation { violations }
    }

    pub fn invalid_schema(violations: Vec<Violation>) -> Self {
        Self::InvalidSchema { violations }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
