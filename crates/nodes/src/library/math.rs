//! `math` — arithmetic over a list of numeric config values. Writes its
//! result to `mathResult` on the `success` edge; an unrecognised
//! `operation` is a fatal node error (normalized by the engine into an
//! `error` edge).
//!
//! Arithmetic runs in `f64`, but a whole-number result is emitted as a JSON
//! integer rather than e.g. `45.0` — workflow authors coming from the JS
//! original never see a decimal point on a whole number there either, since
//! JS has no separate integer type.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::registry::NodeFactory;
use crate::traits::{EdgeMap, ExecutionContext, ExecutableNode, NodeMetadata, NodeTag, StateReader};
use crate::NodeError;

pub struct MathNode;

fn values_of(config: &Map<String, Value>) -> Vec<f64> {
    config
        .get("values")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_f64()).collect())
        .unwrap_or_default()
}

/// Whole-number results serialize as a JSON integer (`45`, not `45.0`).
fn json_number(result: f64) -> Value {
    if result.fract() == 0.0 && result.abs() < i64::MAX as f64 {
        json!(result as i64)
    } else {
        json!(result)
    }
}

#[async_trait]
impl ExecutableNode for MathNode {
    async fn execute(
        &self,
        config: &Map<String, Value>,
        _state: &dyn StateReader,
        _ctx: &ExecutionContext,
    ) -> Result<EdgeMap, NodeError> {
        let operation = config.get("operation").and_then(|v| v.as_str()).unwrap_or("");
        let values = values_of(config);

        let result = match operation {
            "add" => values.iter().sum::<f64>(),
            "subtract" => {
                let mut iter = values.iter();
                let first = *iter.next().unwrap_or(&0.0);
                iter.fold(first, |acc, v| acc - v)
            }
            "multiply" => values.iter().product::<f64>(),
            "divide" => {
                let mut iter = values.iter();
                let first = *iter.next().unwrap_or(&0.0);
                let mut acc = first;
                for v in iter {
                    if *v == 0.0 {
                        return Err(NodeError::Fatal("division by zero".into()));
                    }
                    acc /= v;
                }
                acc
            }
            other => {
                return Err(NodeError::Fatal(format!("unknown math operation '{other}'")));
            }
        };

        let mut edges = EdgeMap::new();
        edges.insert("success".to_string(), json!({ "mathResult": json_number(result) }));
        Ok(edges)
    }
}

pub struct Factory;

impl NodeFactory for Factory {
    fn metadata(&self) -> &NodeMetadata {
        static META: std::sync::OnceLock<NodeMetadata> = std::sync::OnceLock::new();
        META.get_or_init(|| NodeMetadata {
            id: "math".into(),
            name: "Math".into(),
            version: "1.0.0".into(),
            inputs: vec![],
            outputs: vec![],
            expected_edges: vec!["success".into(), "error".into()],
            tags: vec![NodeTag::Universal],
            ai_hints: None,
        })
    }

    fn create(&self) -> std::sync::Arc<dyn ExecutableNode> {
        std::sync::Arc::new(MathNode)
    }
}
