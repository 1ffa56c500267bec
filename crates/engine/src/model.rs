//! Core domain models for the workflow engine.
//!
//! These types are the source of truth for what a workflow, automation, and
//! execution look like in memory. They serialize to/from the JSONB columns
//! the `db` crate persists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Step — the tagged sum type a workflow's `workflow` array is made of.
// ---------------------------------------------------------------------------

/// One entry in a workflow's step sequence, or in a nested step list reached
/// through an edge. Classified once at parse time; the engine never
/// re-inspects raw JSON shape while running.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A bare node type string, e.g. `"empty"`. No config, no declared edges.
    Bare { node_type: String },
    /// A mapping with one key naming a node type (optionally `...`-suffixed
    /// to mark it a loop). `config` has edge entries (`<name>?`) already
    /// stripped; `edges` preserves their declaration order, which is what
    /// decides which edge wins when a node emits more than one.
    Node {
        node_type: String,
        is_loop: bool,
        config: Map<String, Value>,
        edges: Vec<(String, EdgeTarget)>,
    },
    /// `{"$.path": value}` — write a literal into state at a dotted path.
    StateSet { path: String, value: Value },
    /// A named container that exists purely to hold an edge table — used as
    /// a jump target (`<label>?` edges elsewhere can reference it by name)
    /// or as a loop body anchor.
    Block {
        label: String,
        edges: Vec<(String, EdgeTarget)>,
    },
}

/// Where an edge points. Spec allows a string reference to another step
/// in scope, or an inline step list (recursed at parse time), which is why
/// this is recursive rather than a plain index — indices are resolved
/// afterward, once every block's label is known, into [`crate::plan::Plan`].
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeTarget {
    /// Reference to a labeled step, resolved against the declaring scope
    /// first and the enclosing scopes after.
    Ref(String),
    /// An inline sub-workflow: a fresh list of steps with its own scope.
    Inline(Vec<Step>),
}

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// How a workflow is started. Mirrors `TriggerConfig` on an `Automation`,
/// but this is the normalized *kind* an execution actually ran under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Manual,
    Cron,
    Webhook,
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerKind::Manual => write!(f, "manual"),
            TriggerKind::Cron => write!(f, "cron"),
            TriggerKind::Webhook => write!(f, "webhook"),
        }
    }
}

/// The trigger configuration an [`Automation`] binds a workflow to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerConfig {
    Cron { expression: String, timezone: String },
    Webhook { path: String, method: String },
    Immediate,
}

// ---------------------------------------------------------------------------
// WorkflowDefinition
// ---------------------------------------------------------------------------

/// A complete, author-facing workflow definition, as accepted by the
/// parser (C2). `workflow` is the raw, not-yet-classified step list —
/// classification happens in [`crate::parser`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub initial_state: Option<Map<String, Value>>,
    pub workflow: Vec<Value>,
    /// Caller-overridable loop iteration cap; falls back to the executor's
    /// configured default when absent.
    #[serde(default)]
    pub loop_cap: Option<u32>,
}

// ---------------------------------------------------------------------------
// Execution record & per-node log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeLogEntry {
    pub node_id: String,
    pub config_summary: Value,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub edge_taken: Option<String>,
    pub output: Option<Value>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub workflow_id: String,
    pub trigger_kind: TriggerKind,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: ExecutionStatus,
    pub final_state: Option<Value>,
    pub logs: Vec<NodeLogEntry>,
}

// ---------------------------------------------------------------------------
// Automation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Automation {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub workflow_id: String,
    pub enabled: bool,
    pub trigger_config: TriggerConfig,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub failure_count: u32,
}
