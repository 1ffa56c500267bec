//! `log` — writes a message to the application's tracing output. The most
//! commonly used diagnostic primitive in authored workflows.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::registry::NodeFactory;
use crate::traits::{EdgeMap, ExecutionContext, ExecutableNode, NodeMetadata, NodeTag, StateReader};
use crate::NodeError;

pub struct LogNode;

#[async_trait]
impl ExecutableNode for LogNode {
    async fn execute(
        &self,
        config: &Map<String, Value>,
        _state: &dyn StateReader,
        ctx: &ExecutionContext,
    ) -> Result<EdgeMap, NodeError> {
        let message = config.get("message").and_then(|v| v.as_str()).unwrap_or("");
        let level = config.get("level").and_then(|v| v.as_str()).unwrap_or("info");

        match level {
            "warn" => tracing::warn!(execution_id = %ctx.execution_id, "{message}"),
            "error" => tracing::error!(execution_id = %ctx.execution_id, "{message}"),
            "debug" => tracing::debug!(execution_id = %ctx.execution_id, "{message}"),
            _ => tracing::info!(execution_id = %ctx.execution_id, "{message}"),
        }

        let mut edges = EdgeMap::new();
        edges.insert("success".to_string(), json!({ "logged": message }));
        Ok(edges)
    }
}

pub struct Factory;

impl NodeFactory for Factory {
    fn metadata(&self) -> &NodeMetadata {
        static META: std::sync::OnceLock<NodeMetadata> = std::sync::OnceLock::new();
        META.get_or_init(|| NodeMetadata {
            id: "log".into(),
            name: "Log".into(),
            version: "1.0.0".into(),
            inputs: vec![],
            outputs: vec![],
            expected_edges: vec!["success".into()],
            tags: vec![NodeTag::Universal],
            ai_hints: None,
        })
    }

    fn create(&self) -> std::sync::Arc<dyn ExecutableNode> {
        std::sync::Arc::new(LogNode)
    }
}
