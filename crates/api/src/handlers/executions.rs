use axum::extract::{Path, State};
use axum::Json;
use engine::{ExecutionRecord, ExecutionStore, Invocation, TriggerKind};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ExecuteWorkflowDto {
    #[serde(default)]
    pub input: Value,
}

/// `POST /workflows/:id/execute` — a manual trigger (C5). Runs
/// synchronously and returns the finished execution; there is no
/// background queue standing between the request and the run.
pub async fn execute(
    Path(workflow_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<ExecuteWorkflowDto>,
) -> Result<Json<ExecutionRecord>, ApiError> {
    let row = db::repository::workflows::get_workflow(&state.pool, &workflow_id).await?;

    let record = engine::invoke(
        &state.registry,
        &state.executor,
        Some(state.store.as_ref()),
        Invocation {
            workflow_uuid: row.id,
            workflow_id: row.workflow_id,
            definition: &row.definition,
            trigger_kind: TriggerKind::Manual,
            input: payload.input,
            credentials: None,
        },
    )
    .await?;

    Ok(Json(record))
}

pub async fn get(Path(execution_id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<ExecutionRecord>, ApiError> {
    let record = state.store.get(execution_id).await?;
    record.map(Json).ok_or(ApiError::NotFound)
}

pub async fn list_for_workflow(
    Path(workflow_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExecutionRecord>>, ApiError> {
    let records = state.store.list_for_workflow(&workflow_id).await?;
    Ok(Json(records))
}
