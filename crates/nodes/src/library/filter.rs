//! `filter` — representative of the data-shape utility family
//! (`filter`, `sort`, `aggregate`, `arrayUtilities`, …). Reads an array out
//! of state at `path`, keeps items matching a simple field/op/value
//! predicate, and writes the result to `filterResult`.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::registry::NodeFactory;
use crate::traits::{EdgeMap, ExecutionContext, ExecutableNode, NodeMetadata, NodeTag, StateReader};
use crate::NodeError;

pub struct FilterNode;

fn matches(item: &Value, field: &str, op: &str, expected: &Value) -> bool {
    let actual = if field.is_empty() { item.clone() } else { item.get(field).cloned().unwrap_or(Value::Null) };
    match op {
        "eq" => &actual == expected,
        "neq" => &actual != expected,
        "gt" => actual.as_f64().zip(expected.as_f64()).map(|(a, b)| a > b).unwrap_or(false),
        "lt" => actual.as_f64().zip(expected.as_f64()).map(|(a, b)| a < b).unwrap_or(false),
        "contains" => actual.as_str().zip(expected.as_str()).map(|(a, b)| a.contains(b)).unwrap_or(false),
        _ => false,
    }
}

#[async_trait]
impl ExecutableNode for FilterNode {
    async fn execute(
        &self,
        config: &Map<String, Value>,
        state: &dyn StateReader,
        _ctx: &ExecutionContext,
    ) -> Result<EdgeMap, NodeError> {
        let path = config.get("path").and_then(|v| v.as_str()).ok_or_else(|| {
            NodeError::Fatal("filter node requires a 'path' config field".into())
        })?;
        let field = config.get("field").and_then(|v| v.as_str()).unwrap_or("");
        let op = config.get("op").and_then(|v| v.as_str()).unwrap_or("eq");
        let expected = config.get("value").cloned().unwrap_or(Value::Null);

        let items = state
            .get(path)
            .and_then(|v| v.as_array().cloned())
            .ok_or_else(|| NodeError::Fatal(format!("state path '{path}' is not an array")))?;

        let filtered: Vec<Value> = items.into_iter().filter(|item| matches(item, field, op, &expected)).collect();

        let mut edges = EdgeMap::new();
        edges.insert("success".to_string(), json!({ "filterResult": filtered }));
        Ok(edges)
    }
}

pub struct Factory;

impl NodeFactory for Factory {
    fn metadata(&self) -> &NodeMetadata {
        static META: std::sync::OnceLock<NodeMetadata> = std::sync::OnceLock::new();
        META.get_or_init(|| NodeMetadata {
            id: "filter".into(),
            name: "Filter".into(),
            version: "1.0.0".into(),
            inputs: vec![],
            outputs: vec![],
            expected_edges: vec!["success".into(), "error".into()],
            tags: vec![NodeTag::Universal],
            ai_hints: None,
        })
    }

    fn create(&self) -> std::sync::Arc<dyn ExecutableNode> {
        std::sync::Arc::new(FilterNode)
    }
}
