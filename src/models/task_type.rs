use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named, versioned contract describing valid parameters for a class of
/// work. Types are never hard-deleted; deactivation keeps history intact
/// while blocking new task creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskType {
    #[serde(rename = "id")]
    pub task_type_id: i64,
    /// Globally unique dotted name, e.g. `Billing.GenerateInvoice`
    pub name: String,
    /// Semver-style version string recorded at registration
    pub version: String,
    /// JSON-Schema-like parameter contract
    pub param_schema: Value,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration input; id and timestamps are assigned by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTypeRegistration {
    pub name: String,
    pub version: String,
    pub param_schema: Value,
}

impl TaskTypeRegistration {
    pub fn new(name: impl Into<String>, version: impl Into<String>, param_schema: Value) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            param_schema,
        }
    }
}
