//! `transform` — string/value reshaping primitive. Writes its result to
//! `transformResult` on the `success` edge.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::registry::NodeFactory;
use crate::traits::{EdgeMap, ExecutionContext, ExecutableNode, NodeMetadata, NodeTag, StateReader};
use crate::NodeError;

pub struct TransformNode;

#[async_trait]
impl ExecutableNode for TransformNode {
    async fn execute(
        &self,
        config: &Map<String, Value>,
        _state: &dyn StateReader,
        _ctx: &ExecutionContext,
    ) -> Result<EdgeMap, NodeError> {
        let operation = config.get("operation").and_then(|v| v.as_str()).unwrap_or("");
        let data = config.get("data").cloned().unwrap_or(Value::Null);

        let result = match operation {
            "uppercase" => json!(data.as_str().unwrap_or_default().to_uppercase()),
            "lowercase" => json!(data.as_str().unwrap_or_default().to_lowercase()),
            "trim" => json!(data.as_str().unwrap_or_default().trim()),
            "stringify" => json!(data.to_string()),
            "identity" => data,
            other => return Err(NodeError::Fatal(format!("unknown transform operation '{other}'"))),
        };

        let mut edges = EdgeMap::new();
        edges.insert("success".to_string(), json!({ "transformResult": result }));
        Ok(edges)
    }
}

pub struct Factory;

impl NodeFactory for Factory {
    fn metadata(&self) -> &NodeMetadata {
        static META: std::sync::OnceLock<NodeMetadata> = std::sync::OnceLock::new();
        META.get_or_init(|| NodeMetadata {
            id: "transform".into(),
            name: "Transform".into(),
            version: "1.0.0".into(),
            inputs: vec![],
            outputs: vec![],
            expected_edges: vec!["success".into(), "error".into()],
            tags: vec![NodeTag::Universal],
            ai_hints: None,
        })
    }

    fn create(&self) -> std::sync::Arc<dyn ExecutableNode> {
        std::sync::Arc::new(TransformNode)
    }
}
