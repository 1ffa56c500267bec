//! `engine` crate — workflow parsing and validation (C2), the state
//! manager (C3), and the execution engine (C4).

pub mod error;
pub mod executor;
pub mod model;
pub mod parser;
pub mod plan;
pub mod state;
pub mod store;
pub mod trigger;

pub use error::{EngineError, TriggerError, ValidationError, ValidationWarning};
pub use executor::{ExecuteRequest, RetryConfig, WorkflowExecutor};
pub use model::{
    Automation, ExecutionRecord, ExecutionStatus, NodeLogEntry, TriggerConfig, TriggerKind, WorkflowDefinition,
};
pub use parser::parse_workflow;
pub use plan::Plan;
pub use state::State;
pub use store::{ExecutionStore, StoreError};
pub use trigger::{invoke, Invocation};
