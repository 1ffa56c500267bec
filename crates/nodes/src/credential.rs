//! Credential broker collaborator contract.
//!
//! The core never stores credentials. `connect`-style nodes ask a
//! host-supplied broker for a token and stash the result in state; every
//! other node reads it back out of state like any other value. This module
//! defines only the contract — the host (API layer, OAuth registry, …)
//! supplies the implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of a token lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TokenLookup {
    Token(String),
    NeedsReauth,
}

/// Non-secret metadata about a connection (service name, scopes, …), used
/// by nodes that need to branch on connection type without touching the
/// token itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub connection_id: String,
    pub provider: String,
    pub scopes: Vec<String>,
}

/// Host-provided collaborator that resolves connection IDs to usable
/// credentials. Implementations must be idempotent and thread-safe —
/// concurrent executions may call it at the same time.
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    async fn get_token(&self, connection_id: &str) -> TokenLookup;
    async fn get_connection_info(&self, connection_id: &str) -> Option<ConnectionInfo>;
}
