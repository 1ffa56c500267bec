//! The in-tree node library (C9): a representative set of node types
//! covering the families spec'd for the engine — arithmetic/logic/
//! transform/logging primitives, data-shape utilities, iteration
//! adapters, and a credential-broker-backed integration node.

mod connect;
mod empty;
mod filter;
mod log;
mod logic;
mod math;
mod range;
mod switch;
mod transform;
mod while_node;

pub use connect::ConnectNode;
pub use empty::EmptyNode;
pub use filter::FilterNode;
pub use log::LogNode;
pub use logic::LogicNode;
pub use math::MathNode;
pub use range::RangeNode;
pub use switch::SwitchNode;
pub use transform::TransformNode;
pub use while_node::WhileNode;

use crate::error::RegistryError;
use crate::registry::Registry;
use std::sync::Arc;

/// Register every built-in node type. Called by
/// [`crate::registry::Registry::with_builtins`]; exposed separately so a
/// host can build a registry from scratch and opt into only some of the
/// library.
pub fn register_all(registry: &Registry) -> Result<(), RegistryError> {
    registry.register(Arc::new(empty::Factory))?;
    registry.register(Arc::new(log::Factory))?;
    registry.register(Arc::new(math::Factory))?;
    registry.register(Arc::new(logic::Factory))?;
    registry.register(Arc::new(transform::Factory))?;
    registry.register(Arc::new(filter::Factory))?;
    registry.register(Arc::new(switch::Factory))?;
    registry.register(Arc::new(while_node::Factory))?;
    registry.register(Arc::new(range::Factory))?;
    registry.register(Arc::new(connect::Factory))?;
    Ok(())
}

/// Shared helper: read a JSON pointer-free dotted `state.get()` style path
/// out of a node's own config object by plain key (config objects are flat
/// more often than not — nested lookups go through `StateReader`).
pub(crate) fn config_str<'a>(config: &'a serde_json::Map<String, serde_json::Value>, key: &str) -> Option<&'a str> {
    config.get(key).and_then(|v| v.as_str())
}
