//! `connect` — the credential-broker-backed integration node. Resolves a
//! `connectionId` through the host's [`crate::credential::CredentialBroker`]
//! and writes the token into state for downstream nodes to read; the core
//! never holds the credential beyond this single hop.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::credential::TokenLookup;
use crate::registry::NodeFactory;
use crate::traits::{EdgeMap, ExecutionContext, ExecutableNode, NodeMetadata, NodeTag, StateReader};
use crate::NodeError;

pub struct ConnectNode;

#[async_trait]
impl ExecutableNode for ConnectNode {
    async fn execute(
        &self,
        config: &Map<String, Value>,
        _state: &dyn StateReader,
        ctx: &ExecutionContext,
    ) -> Result<EdgeMap, NodeError> {
        let connection_id = config.get("connectionId").and_then(|v| v.as_str()).ok_or_else(|| {
            NodeError::Fatal("connect node requires a 'connectionId' config field".into())
        })?;

        let broker = ctx
            .credentials
            .as_ref()
            .ok_or_else(|| NodeError::Fatal("no credential broker configured for this execution".into()))?;

        let mut edges = EdgeMap::new();
        match broker.get_token(connection_id).await {
            TokenLookup::Token(token) => {
                edges.insert(
                    "success".to_string(),
                    json!({ "connectionId": connection_id, "token": token }),
                );
            }
            TokenLookup::NeedsReauth => {
                return Err(NodeError::Fatal(format!(
                    "connection '{connection_id}' needs re-authorization"
                )));
            }
        }
        Ok(edges)
    }
}

pub struct Factory;

impl NodeFactory for Factory {
    fn metadata(&self) -> &NodeMetadata {
        static META: std::sync::OnceLock<NodeMetadata> = std::sync::OnceLock::new();
        META.get_or_init(|| NodeMetadata {
            id: "connect".into(),
            name: "Connect".into(),
            version: "1.0.0".into(),
            inputs: vec![],
            outputs: vec![],
            expected_edges: vec!["success".into(), "error".into()],
            tags: vec![NodeTag::Server],
            ai_hints: None,
        })
    }

    fn create(&self) -> std::sync::Arc<dyn ExecutableNode> {
        std::sync::Arc::new(ConnectNode)
    }
}
