//! Implementations of `engine::ExecutionStore` (C7): Postgres-backed for
//! production, in-memory for the CLI's ad-hoc `run` command and for tests
//! that don't want a live database.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use engine::{ExecutionRecord, ExecutionStore, StoreError};

use crate::models::ExecutionRow;
use crate::repository::executions;

fn to_row(record: &ExecutionRecord) -> Result<ExecutionRow, StoreError> {
    Ok(ExecutionRow {
        id: record.id,
        workflow_id: record.workflow_id.clone(),
        trigger_kind: record.trigger_kind.to_string(),
        status: record.status.to_string(),
        started_at: record.started_at,
        ended_at: record.ended_at,
        final_state: record.final_state.clone(),
        logs: serde_json::to_value(&record.logs).map_err(|e| StoreError(e.to_string()))?,
    })
}

fn from_row(row: ExecutionRow) -> Result<ExecutionRecord, StoreError> {
    let trigger_kind = match row.trigger_kind.as_str() {
        "manual" => engine::TriggerKind::Manual,
        "cron" => engine::TriggerKind::Cron,
        "webhook" => engine::TriggerKind::Webhook,
        other => return Err(StoreError(format!("unknown trigger_kind '{other}' in stored row"))),
    };
    let status = match row.status.as_str() {
        "running" => engine::ExecutionStatus::Running,
        "completed" => engine::ExecutionStatus::Completed,
        "failed" => engine::ExecutionStatus::Failed,
        "cancelled" => engine::ExecutionStatus::Cancelled,
        other => return Err(StoreError(format!("unknown status '{other}' in stored row"))),
    };
    let logs = serde_json::from_value(row.logs).map_err(|e| StoreError(e.to_string()))?;

    Ok(ExecutionRecord {
        id: row.id,
        workflow_id: row.workflow_id,
        trigger_kind,
        started_at: row.started_at,
        ended_at: row.ended_at,
        status,
        final_state: row.final_state,
        logs,
    })
}

pub struct PgExecutionStore {
    pool: PgPool,
}

impl PgExecutionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExecutionStore for PgExecutionStore {
    async fn start(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        let row = to_row(record)?;
        executions::insert_execution(&self.pool, &row).await.map_err(|e| StoreError(e.to_string()))
    }

    async fn finish(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        let row = to_row(record)?;
        executions::update_execution(&self.pool, &row).await.map_err(|e| StoreError(e.to_string()))
    }

    async fn get(&self, execution_id: Uuid) -> Result<Option<ExecutionRecord>, StoreError> {
        match executions::get_execution(&self.pool, execution_id).await {
            Ok(row) => from_row(row).map(Some),
            Err(crate::DbError::NotFound) => Ok(None),
            Err(e) => Err(StoreError(e.to_string())),
        }
    }

    async fn list_for_workflow(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>, StoreError> {
        let rows = executions::list_executions_for_workflow(&self.pool, workflow_id)
            .await
            .map_err(|e| StoreError(e.to_string()))?;
        rows.into_iter().map(from_row).collect()
    }
}

/// Process-local store with no persistence across restarts. Sufficient for
/// `cli run` (a single execution, inspected and discarded) and for tests.
#[derive(Default)]
pub struct InMemoryExecutionStore {
    records: RwLock<HashMap<Uuid, ExecutionRecord>>,
}

impl InMemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn start(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        self.records.write().expect("lock poisoned").insert(record.id, record.clone());
        Ok(())
    }

    async fn finish(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        self.records.write().expect("lock poisoned").insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, execution_id: Uuid) -> Result<Option<ExecutionRecord>, StoreError> {
        Ok(self.records.read().expect("lock poisoned").get(&execution_id).cloned())
    }

    async fn list_for_workflow(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|r| r.workflow_id == workflow_id)
            .cloned()
            .collect())
    }
}
