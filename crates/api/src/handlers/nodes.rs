use axum::extract::{Path, State};
use axum::Json;
use nodes::{ExecutionContext, NodeMetadata};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /workflows/allnodes` — every node type the registry knows about,
/// for an editor to offer as building blocks (C1).
pub async fn all_nodes(State(state): State<AppState>) -> Json<Vec<NodeMetadata>> {
    Json(state.registry.all_metadata())
}

#[derive(Deserialize)]
pub struct RunNodeDto {
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub state: Map<String, Value>,
    #[serde(default)]
    pub input: Value,
}

#[derive(Serialize)]
pub struct RunNodeResponse {
    pub edges: Value,
}

/// `POST /nodes/run/:id` — execute a single node in isolation, outside any
/// workflow. Used by an editor to preview a node's behaviour against
/// author-supplied config and a scratch state snapshot.
pub async fn run(
    Path(node_type): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<RunNodeDto>,
) -> Result<Json<RunNodeResponse>, ApiError> {
    let node = state.registry.create(&node_type).ok_or(ApiError::NotFound)?;
    let scratch_state = engine::State::with_initial(Some(payload.state));

    let ctx = ExecutionContext {
        workflow_id: Uuid::nil(),
        execution_id: Uuid::new_v4(),
        current_node_id: format!("{node_type}#adhoc"),
        input: payload.input,
        credentials: None,
    };

    let edges = node
        .execute(&payload.config, &scratch_state, &ctx)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(RunNodeResponse { edges: Value::Object(edges.into_iter().collect()) }))
}

pub async fn metadata(Path(node_type): Path<String>, State(state): State<AppState>) -> Result<Json<NodeMetadata>, ApiError> {
    state.registry.metadata(&node_type).map(Json).ok_or(ApiError::NotFound)
}
