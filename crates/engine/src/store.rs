//! The Execution Store Interface (C7): the port the engine writes
//! execution history through. The engine only depends on this trait —
//! `db` provides the Postgres-backed implementation (and an in-memory one
//! for tests and the CLI's ad-hoc `run` command), keeping persistence out
//! of the execution hot path's dependency graph.

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::ExecutionRecord;

#[derive(Debug, thiserror::Error)]
#[error("execution store error: {0}")]
pub struct StoreError(pub String);

/// Durable sink for execution history. Implementations must tolerate being
/// called from async contexts under load; the engine awaits every call
/// inline as part of the dispatch loop, so a slow store directly slows
/// execution.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Persist a just-started execution (status `running`, no logs yet).
    async fn start(&self, record: &ExecutionRecord) -> Result<(), StoreError>;

    /// Persist the final record, including its full log and final state.
    async fn finish(&self, record: &ExecutionRecord) -> Result<(), StoreError>;

    async fn get(&self, execution_id: Uuid) -> Result<Option<ExecutionRecord>, StoreError>;

    async fn list_for_workflow(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>, StoreError>;
}
