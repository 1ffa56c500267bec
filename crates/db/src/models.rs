//! Row structs that map 1-to-1 onto database tables.
//!
//! These are *persistence* models — they carry no domain behaviour. Domain
//! types live in the `engine` crate; rows are converted to and from them at
//! the repository boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted workflow definition row. `definition` is the full
/// `{id, name, version, workflow, ...}` document the parser accepts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkflowRow {
    pub id: Uuid,
    pub workflow_id: String,
    pub name: String,
    pub version: String,
    pub definition: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted automation row — the binding between a workflow and a
/// trigger. `trigger_config` is the serialized `engine::TriggerConfig`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AutomationRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub workflow_id: String,
    pub enabled: bool,
    pub trigger_config: serde_json::Value,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub failure_count: i32,
}

/// A persisted execution row. `logs` holds the full `Vec<NodeLogEntry>` as
/// a JSONB array rather than a child table — an execution's log is always
/// read and written as a unit, never queried per-entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExecutionRow {
    pub id: Uuid,
    pub workflow_id: String,
    pub trigger_kind: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub final_state: Option<serde_json::Value>,
    pub logs: serde_json::Value,
}
