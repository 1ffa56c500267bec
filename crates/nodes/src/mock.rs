//! `MockNode` — a test double for `ExecutableNode`.
//!
//! Useful in unit and integration tests where a real node implementation is
//! either unavailable or irrelevant.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

use crate::{
    traits::{EdgeMap, ExecutionContext, StateReader},
    ExecutableNode, NodeError,
};

/// Behaviour injected into `MockNode` at construction time.
pub enum MockBehaviour {
    /// Succeed, returning the given edge map.
    ReturnEdges(EdgeMap),
    /// Fail with a `Retryable` error.
    FailRetryable(String),
    /// Fail with a `Fatal` error.
    FailFatal(String),
}

/// A mock node that records every call it receives and returns a
/// programmer-specified result.
pub struct MockNode {
    /// Label used in test assertions.
    pub name: String,
    /// What the node will do when `execute` is called.
    pub behaviour: MockBehaviour,
    /// All configs seen by this node (in call order).
    pub calls: Arc<Mutex<Vec<Map<String, Value>>>>,
}

impl MockNode {
    /// Create a mock that succeeds, emitting a single `success` edge
    /// carrying `value`.
    pub fn returning(name: impl Into<String>, value: Value) -> Self {
        let mut edges = EdgeMap::new();
        edges.insert("success".to_string(), value);
        Self {
            name: name.into(),
            behaviour: MockBehaviour::ReturnEdges(edges),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that succeeds, emitting exactly the given edges.
    pub fn returning_edges(name: impl Into<String>, edges: EdgeMap) -> Self {
        Self {
            name: name.into(),
            behaviour: MockBehaviour::ReturnEdges(edges),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always fails with a `Fatal` error.
    pub fn failing_fatal(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behaviour: MockBehaviour::FailFatal(msg.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always fails with a `Retryable` error.
    pub fn failing_retryable(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behaviour: MockBehaviour::FailRetryable(msg.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of times this node has been executed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ExecutableNode for MockNode {
    async fn execute(
        &self,
        config: &Map<String, Value>,
        _state: &dyn StateReader,
        _ctx: &ExecutionContext,
    ) -> Result<EdgeMap, NodeError> {
        self.calls.lock().unwrap().push(config.clone());

        match &self.behaviour {
            MockBehaviour::ReturnEdges(edges) => Ok(edges.clone()),
            MockBehaviour::FailRetryable(msg) => Err(NodeError::Retryable(msg.clone())),
            MockBehaviour::FailFatal(msg) => Err(NodeError::Fatal(msg.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    struct EmptyState;
    impl StateReader for EmptyState {
        fn get(&self, _path: &str) -> Option<Value> {
            None
        }
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext {
            workflow_id: Uuid::nil(),
            execution_id: Uuid::new_v4(),
            current_node_id: "mock#0".to_string(),
            input: Value::Null,
            credentials: None,
        }
    }

    #[tokio::test]
    async fn returning_emits_a_success_edge_and_records_the_call() {
        let node = MockNode::returning("a", json!({ "x": 1 }));
        let config = Map::new();
        let edges = node.execute(&config, &EmptyState, &ctx()).await.unwrap();
        assert_eq!(edges.get("success"), Some(&json!({ "x": 1 })));
        assert_eq!(node.call_count(), 1);
    }

    #[tokio::test]
    async fn failing_retryable_surfaces_a_retryable_error() {
        let node = MockNode::failing_retryable("b", "transient");
        let config = Map::new();
        let err = node.execute(&config, &EmptyState, &ctx()).await.unwrap_err();
        assert!(matches!(err, NodeError::Retryable(msg) if msg == "transient"));
    }

    #[tokio::test]
    async fn failing_fatal_surfaces_a_fatal_error() {
        let node = MockNode::failing_fatal("c", "unrecoverable");
        let config = Map::new();
        let err = node.execute(&config, &EmptyState, &ctx()).await.unwrap_err();
        assert!(matches!(err, NodeError::Fatal(msg) if msg == "unrecoverable"));
    }
}
