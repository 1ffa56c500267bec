//! `logic` — boolean comparisons over a list of config values. Writes its
//! result to `logicResult` on the `success` edge.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::registry::NodeFactory;
use crate::traits::{EdgeMap, ExecutionContext, ExecutableNode, NodeMetadata, NodeTag, StateReader};
use crate::NodeError;

pub struct LogicNode;

#[async_trait]
impl ExecutableNode for LogicNode {
    async fn execute(
        &self,
        config: &Map<String, Value>,
        _state: &dyn StateReader,
        _ctx: &ExecutionContext,
    ) -> Result<EdgeMap, NodeError> {
        let operation = config.get("operation").and_then(|v| v.as_str()).unwrap_or("");
        let values: Vec<f64> = config
            .get("values")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_f64()).collect())
            .unwrap_or_default();

        if values.len() < 2 {
            return Err(NodeError::Fatal("logic node requires at least two values".into()));
        }
        let (a, b) = (values[0], values[1]);

        let result = match operation {
            "greater" => a > b,
            "less" => a < b,
            "equal" => (a - b).abs() < f64::EPSILON,
            "greaterOrEqual" => a >= b,
            "lessOrEqual" => a <= b,
            "notEqual" => (a - b).abs() >= f64::EPSILON,
            other => return Err(NodeError::Fatal(format!("unknown logic operation '{other}'"))),
        };

        let mut edges = EdgeMap::new();
        edges.insert("success".to_string(), json!({ "logicResult": result }));
        Ok(edges)
    }
}

pub struct Factory;

impl NodeFactory for Factory {
    fn metadata(&self) -> &NodeMetadata {
        static META: std::sync::OnceLock<NodeMetadata> = std::sync::OnceLock::new();
        META.get_or_init(|| NodeMetadata {
            id: "logic".into(),
            name: "Logic".into(),
            version: "1.0.0".into(),
            inputs: vec![],
            outputs: vec![],
            expected_edges: vec!["success".into(), "error".into()],
            tags: vec![NodeTag::Universal],
            ai_hints: None,
        })
    }

    fn create(&self) -> std::sync::Arc<dyn ExecutableNode> {
        std::sync::Arc::new(LogicNode)
    }
}
