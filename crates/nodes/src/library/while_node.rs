//! `while` — the canonical loop node. Meant to be used as a `...`-suffixed
//! step; on each invocation it evaluates a condition against state and
//! emits `continue` (engine runs the loop body, then calls again) or
//! `done` (engine stops looping and follows `done?`, or falls through).

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::registry::NodeFactory;
use crate::traits::{EdgeMap, ExecutionContext, ExecutableNode, NodeMetadata, NodeTag, StateReader};
use crate::NodeError;

pub struct WhileNode;

fn condition_holds(state: &dyn StateReader, config: &Map<String, Value>) -> bool {
    let path = match config.get("path").and_then(|v| v.as_str()) {
        Some(p) => p,
        None => return false,
    };
    let op = config.get("op").and_then(|v| v.as_str()).unwrap_or("lessThan");
    let expected = config.get("value").cloned().unwrap_or(Value::Null);
    let actual = state.get(path).unwrap_or(Value::Null);

    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => match op {
            "lessThan" => a < b,
            "lessOrEqual" => a <= b,
            "greaterThan" => a > b,
            "greaterOrEqual" => a >= b,
            "equal" => (a - b).abs() < f64::EPSILON,
            _ => false,
        },
        _ => match op {
            "truthy" => !matches!(actual, Value::Null | Value::Bool(false)),
            _ => false,
        },
    }
}

#[async_trait]
impl ExecutableNode for WhileNode {
    async fn execute(
        &self,
        config: &Map<String, Value>,
        state: &dyn StateReader,
        _ctx: &ExecutionContext,
    ) -> Result<EdgeMap, NodeError> {
        let mut edges = EdgeMap::new();
        if condition_holds(state, config) {
            edges.insert("continue".to_string(), json!({}));
        } else {
            edges.insert("done".to_string(), json!({}));
        }
        Ok(edges)
    }
}

pub struct Factory;

impl NodeFactory for Factory {
    fn metadata(&self) -> &NodeMetadata {
        static META: std::sync::OnceLock<NodeMetadata> = std::sync::OnceLock::new();
        META.get_or_init(|| NodeMetadata {
            id: "while".into(),
            name: "While".into(),
            version: "1.0.0".into(),
            inputs: vec![],
            outputs: vec![],
            expected_edges: vec!["continue".into(), "done".into(), "body".into()],
            tags: vec![NodeTag::Universal],
            ai_hints: None,
        })
    }

    fn create(&self) -> std::sync::Arc<dyn ExecutableNode> {
        std::sync::Arc::new(WhileNode)
    }
}
