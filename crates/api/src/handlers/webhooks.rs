use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::Json;
use engine::{Invocation, TriggerKind};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

/// `ANY /webhook/:path` — the webhook dispatcher (C8). Looks the request up
/// in the `(method, path) -> automation_id` table built from every enabled
/// webhook automation, rather than scanning workflows on every call.
pub async fn handle_webhook(
    method: Method,
    Path(path): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let automation_id = {
        let webhooks = state.webhooks.read().await;
        *webhooks.get(&(method.as_str().to_uppercase(), path)).ok_or(ApiError::NotFound)?
    };

    let automation = db::repository::automations::get_automation(&state.pool, automation_id).await?;
    if !automation.enabled {
        return Err(ApiError::NotFound);
    }

    let workflow = db::repository::workflows::get_workflow(&state.pool, &automation.workflow_id).await?;

    let record = engine::invoke(
        &state.registry,
        &state.executor,
        Some(state.store.as_ref()),
        Invocation {
            workflow_uuid: workflow.id,
            workflow_id: workflow.workflow_id,
            definition: &workflow.definition,
            trigger_kind: TriggerKind::Webhook,
            input: payload,
            credentials: None,
        },
    )
    .await?;

    Ok((StatusCode::ACCEPTED, Json(serde_json::json!({ "execution_id": record.id, "status": record.status }))))
}
