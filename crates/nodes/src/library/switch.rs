//! `switch` — representative of the control-flow adapter family
//! (alongside `everyArrayItem`, `while`, `range`, `runWorkflow`). Reads a
//! state value at `path` and emits an edge named after the matching
//! string, or `default` if none match.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::registry::NodeFactory;
use crate::traits::{EdgeMap, ExecutionContext, ExecutableNode, NodeMetadata, NodeTag, StateReader};
use crate::NodeError;

pub struct SwitchNode;

#[async_trait]
impl ExecutableNode for SwitchNode {
    async fn execute(
        &self,
        config: &Map<String, Value>,
        state: &dyn StateReader,
        _ctx: &ExecutionContext,
    ) -> Result<EdgeMap, NodeError> {
        let path = config.get("path").and_then(|v| v.as_str()).ok_or_else(|| {
            NodeError::Fatal("switch node requires a 'path' config field".into())
        })?;

        let value = state.get(path).unwrap_or(Value::Null);
        let key = match &value {
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            _ => "default".to_string(),
        };

        let mut edges = EdgeMap::new();
        edges.insert(key, json!({ "switchValue": value }));
        Ok(edges)
    }
}

pub struct Factory;

impl NodeFactory for Factory {
    fn metadata(&self) -> &NodeMetadata {
        static META: std::sync::OnceLock<NodeMetadata> = std::sync::OnceLock::new();
        META.get_or_init(|| NodeMetadata {
            id: "switch".into(),
            name: "Switch".into(),
            version: "1.0.0".into(),
            inputs: vec![],
            outputs: vec![],
            expected_edges: vec!["default".into()],
            tags: vec![NodeTag::Universal],
            ai_hints: None,
        })
    }

    fn create(&self) -> std::sync::Arc<dyn ExecutableNode> {
        std::sync::Arc::new(SwitchNode)
    }
}
