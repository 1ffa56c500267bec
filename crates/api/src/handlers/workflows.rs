use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use db::models::WorkflowRow;
use db::repository::workflows as wf_repo;
use engine::{parse_workflow, WorkflowDefinition};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PutWorkflowDto {
    pub definition: Value,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<WorkflowRow>>, ApiError> {
    let rows = wf_repo::list_workflows(&state.pool).await?;
    Ok(Json(rows))
}

pub async fn get(Path(workflow_id): Path<String>, State(state): State<AppState>) -> Result<Json<WorkflowRow>, ApiError> {
    let row = wf_repo::get_workflow(&state.pool, &workflow_id).await?;
    Ok(Json(row))
}

/// Validate and publish a workflow. Re-publishing an existing `id` replaces
/// its definition in place rather than erroring, matching how an author
/// iterates on a workflow under a stable slug.
pub async fn put(
    State(state): State<AppState>,
    Json(payload): Json<PutWorkflowDto>,
) -> Result<(StatusCode, Json<WorkflowRow>), ApiError> {
    let _ = parse_workflow(&payload.definition, &state.registry)?;

    let def: WorkflowDefinition =
        serde_json::from_value(payload.definition.clone()).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let row = wf_repo::upsert_workflow(&state.pool, &def.id, &def.name, &def.version, payload.definition).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn delete(Path(workflow_id): Path<String>, State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    wf_repo::delete_workflow(&state.pool, &workflow_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
