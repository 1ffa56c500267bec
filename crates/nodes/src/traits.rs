//! The `ExecutableNode` contract every node must fulfil, plus the
//! metadata a node reports to the registry.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::NodeError;

/// An `EdgeMap` is what a node hands back to the engine: zero or more named
/// outcomes, each carrying an arbitrary JSON payload. The engine selects
/// which edge to follow; the node itself never sees the workflow's edge
/// declarations.
pub type EdgeMap = HashMap<String, Value>;

/// Deployment tag. The engine is indifferent to these; the host uses them
/// to filter which nodes are offered in a given deployment (e.g. a
/// browser-side runner only exposes `Client` nodes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeTag {
    /// Pure computation, safe to run anywhere.
    Universal,
    /// May touch the filesystem, network, or credential broker.
    Server,
    /// Requires browser APIs; only meaningful in a client runner.
    Client,
}

/// A single named input or output the editor surfaces to authors.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PortSpec {
    pub name: String,
    pub description: String,
}

impl PortSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into() }
    }
}

/// Everything the registry and the editor need to know about a node type
/// without constructing an instance.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NodeMetadata {
    pub id: String,
    pub name: String,
    pub version: String,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
    /// Edge names this node may emit; used by the validator's warning pass
    /// to flag steps that omit a handler for an edge the node declares.
    pub expected_edges: Vec<String>,
    pub tags: Vec<NodeTag>,
    /// Free-form hints consumed only by the editor (e.g. AI response
    /// nodes flagging themselves for the "needs JSON validation" warning).
    pub ai_hints: Option<Value>,
}

impl NodeMetadata {
    pub fn is_available_for(&self, tag: NodeTag) -> bool {
        self.tags.contains(&tag)
    }
}

/// Shared context passed to every node during execution.
///
/// Defined here (in the nodes crate) so both the engine and individual node
/// implementations can import it without a circular dependency.
#[derive(Clone)]
pub struct ExecutionContext {
    /// ID of the parent workflow.
    pub workflow_id: uuid::Uuid,
    /// ID of the current execution run.
    pub execution_id: uuid::Uuid,
    /// Identifier of the step currently being executed (its declared
    /// label, or an engine-assigned positional one).
    pub current_node_id: String,
    /// Caller-supplied input for this execution (manual payload, webhook
    /// request, or empty for cron).
    pub input: Value,
    /// Credential broker used by `connect`-style nodes. `None` in contexts
    /// (such as unit tests) that have no broker configured.
    pub credentials: Option<std::sync::Arc<dyn crate::credential::CredentialBroker>>,
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("workflow_id", &self.workflow_id)
            .field("execution_id", &self.execution_id)
            .field("current_node_id", &self.current_node_id)
            .field("input", &self.input)
            .field("credentials", &self.credentials.is_some())
            .finish()
    }
}

/// The core node trait.
///
/// All built-in nodes and plugins must implement this. `state` is a
/// read-only snapshot accessor: the engine is the single writer of state,
/// so nodes may read but never mutate it directly — they report their
/// results through the returned [`EdgeMap`] instead.
#[async_trait]
pub trait ExecutableNode: Send + Sync {
    /// Execute the node against its (edge keys already stripped)
    /// configuration object and the current shared state, returning the
    /// set of edges it produced.
    async fn execute(
        &self,
        config: &Map<String, Value>,
        state: &dyn StateReader,
        ctx: &ExecutionContext,
    ) -> Result<EdgeMap, NodeError>;
}

/// Minimal read-only view over the execution's shared state, implemented
/// by `engine::state::State`. Kept as a trait here so `nodes` does not
/// depend on `engine` (the dependency runs the other way).
pub trait StateReader: Send + Sync {
    fn get(&self, path: &str) -> Option<Value>;
}

/// The dotted state path a self-tracking loop node (e.g. `range`) keeps its
/// private counter at, scoped by `node_id` so multiple loop nodes in the
/// same workflow never collide. Nodes can only read this path through
/// [`StateReader`]; the engine is the one that persists a loop node's
/// `nextIndex` edge payload back here between visits.
pub fn loop_state_path(node_id: &str) -> String {
    format!("_loopState.{node_id}.index")
}
