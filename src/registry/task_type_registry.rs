//! # Task Type Registry
//!
//! In-process registry of task type definitions. Registration
//! meta-validates the parameter schema before accepting it; re-registering
//! an existing name is an update that records the new version and
//! reactivates the type while keeping its id stable. Types referenced by
//! tasks are never hard-deleted, only deactivated, and historical tasks
//! are never re-validated against a newer schema.

use crate::error::{CoreError, Result};
use crate::models::task_type::{TaskType, TaskTypeRegistration};
use crate::schema::meta_validate;
use crate::validation::validate_json_bounds;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::info;

pub struct TaskTypeRegistry {
    types: DashMap<String, TaskType>,
    /// task_type_id -> name, for the wire-level claim operation
    ids: DashMap<i64, String>,
    next_id: AtomicI64,
}

impl TaskTypeRegistry {
    pub fn new() -> Self {
        Self {
            types: DashMap::new(),
            ids: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Register or update a task type.
    ///
    /// The schema must pass the meta-rules; tasks created before an update
    /// keep their already-validated parameters untouched.
    pub fn register(&self, registration: TaskTypeRegistration) -> Result<TaskType> {
        if registration.name.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "task type name must not be empty".to_string(),
            ));
        }
        if registration.version.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "task type version must not be empty".to_string(),
            ));
        }

        validate_json_bounds(&registration.param_schema)?;
        let violations = meta_validate(&registration.param_schema);
        if !violations.is_empty() {
            return Err(CoreError::invalid_schema(violations));
        }

        let now = Utc::now();
        match self.types.entry(registration.name.clone()) {
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                existing.version = registration.version;
                existing.param_schema = registration.param_schema;
                existing.active = true;
                existing.updated_at = now;
                info!(
                    name = %existing.name,
                    version = %existing.version,
                    task_type_id = existing.task_type_id,
                    "task type re-registered"
                );
                Ok(existing.clone())
            }
            Entry::Vacant(slot) => {
                let task_type_id = self.next_id.fetch_add(1, Ordering::SeqCst);
                let task_type = TaskType {
                    task_type_id,
                    name: registration.name.clone(),
                    version: registration.version,
                    param_schema: registration.param_schema,
                    active: true,
                    created_at: now,
                    updated_at: now,
                };
                self.ids.insert(task_type_id, registration.name);
                info!(
                    name = %task_type.name,
                    version = %task_type.version,
                    task_type_id,
                    "task type registered"
                );
                slot.insert(task_type.clone());
                Ok(task_type)
            }
        }
    }

    /// Resolve an active type. Deactivated types are `NotFound` here, which
    /// is what blocks new task creation against them.
    pub fn get(&self, name: &str) -> Result<TaskType> {
        self.types
            .get(name)
            .filter(|entry| entry.value().active)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CoreError::not_found("task type", name))
    }

    /// Explicit lookup: returns deactivated types too.
    pub fn lookup(&self, name: &str) -> Result<TaskType> {
        self.types
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CoreError::not_found("task type", name))
    }

    pub fn get_by_id(&self, task_type_id: i64) -> Result<TaskType> {
        let name = self
            .ids
            .get(&task_type_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CoreError::not_found("task type", task_type_id))?;
        self.lookup(&name)
    }

    pub fn list(&self, active_only: bool) -> Vec<TaskType> {
        let mut types: Vec<TaskType> = self
            .types
            .iter()
            .filter(|entry| !active_only || entry.value().active)
            .map(|entry| entry.value().clone())
            .collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        types
    }

    /// Deactivate a type: existing tasks drain, new creations are rejected.
    pub fn deactivate(&self, name: &str) -> Result<TaskType> {
        let mut entry = self
            .types
            .get_mut(name)
            .ok_or_else(|| CoreError::not_found("task type", name))?;
        entry.active = false;
        entry.updated_at = Utc::now();
        info!(name = %entry.name, "task type deactivated");
        Ok(entry.value().clone())
    }
}

impl Default for TaskTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
