//! `range` — iterates `from..to` as a loop node (meant to be used with the
//! `...` suffix). Keeps its counter in state under a per-step scratch key
//! (see [`crate::loop_state_path`]) so multiple range nodes in the same
//! workflow don't collide; the engine persists the `nextIndex` a `continue`
//! edge carries back to that path before the node's next visit. Emits
//! `continue` with the current index on `success`/`item`, or `done` once
//! the range is exhausted.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::loop_state_path;
use crate::registry::NodeFactory;
use crate::traits::{EdgeMap, ExecutionContext, ExecutableNode, NodeMetadata, NodeTag, StateReader};
use crate::NodeError;

pub struct RangeNode;

#[async_trait]
impl ExecutableNode for RangeNode {
    async fn execute(
        &self,
        config: &Map<String, Value>,
        state: &dyn StateReader,
        ctx: &ExecutionContext,
    ) -> Result<EdgeMap, NodeError> {
        let from = config.get("from").and_then(|v| v.as_i64()).unwrap_or(0);
        let to = config.get("to").and_then(|v| v.as_i64()).ok_or_else(|| {
            NodeError::Fatal("range node requires a 'to' config field".into())
        })?;

        let current = state
            .get(&loop_state_path(&ctx.current_node_id))
            .and_then(|v| v.as_i64())
            .unwrap_or(from);

        let mut edges = EdgeMap::new();
        if current < to {
            edges.insert(
                "continue".to_string(),
                json!({ "item": current, "nextIndex": current + 1 }),
            );
        } else {
            edges.insert("done".to_string(), json!({ "count": to - from }));
        }
        Ok(edges)
    }
}

pub struct Factory;

impl NodeFactory for Factory {
    fn metadata(&self) -> &NodeMetadata {
        static META: std::sync::OnceLock<NodeMetadata> = std::sync::OnceLock::new();
        META.get_or_init(|| NodeMetadata {
            id: "range".into(),
            name: "Range".into(),
            version: "1.0.0".into(),
            inputs: vec![],
            outputs: vec![],
            expected_edges: vec!["continue".into(), "done".into(), "body".into()],
            tags: vec![NodeTag::Universal],
            ai_hints: None,
        })
    }

    fn create(&self) -> std::sync::Arc<dyn ExecutableNode> {
        std::sync::Arc::new(RangeNode)
    }
}
