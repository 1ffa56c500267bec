//! `nodes` crate — the `ExecutableNode` contract, the node registry (C1),
//! and the in-tree node library (C9).
//!
//! Every node — built-in and plugin alike — must implement
//! [`ExecutableNode`]. The engine crate dispatches execution through this
//! trait object and never knows about a node's concrete type.

pub mod credential;
pub mod error;
pub mod library;
pub mod mock;
pub mod registry;
pub mod traits;

pub use credential::{ConnectionInfo, CredentialBroker, TokenLookup};
pub use error::NodeError;
pub use registry::Registry;
pub use traits::{loop_state_path, EdgeMap, ExecutableNode, ExecutionContext, NodeMetadata, NodeTag, StateReader};
