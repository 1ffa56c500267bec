use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use db::models::AutomationRow;
use engine::{ExecutionRecord, ExecutionStore, TriggerConfig};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateAutomationDto {
    pub tenant_id: Uuid,
    pub workflow_id: String,
    pub trigger_config: serde_json::Value,
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateAutomationDto>,
) -> Result<(StatusCode, Json<AutomationRow>), ApiError> {
    serde_json::from_value::<TriggerConfig>(payload.trigger_config.clone())
        .map_err(|e| ApiError::BadRequest(format!("invalid trigger_config: {e}")))?;

    let row = db::repository::automations::create_automation(
        &state.pool,
        payload.tenant_id,
        &payload.workflow_id,
        payload.trigger_config,
    )
    .await?;
    state.reload().await;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<AutomationRow>>, ApiError> {
    Ok(Json(db::repository::automations::list_automations(&state.pool).await?))
}

pub async fn get(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<AutomationRow>, ApiError> {
    Ok(Json(db::repository::automations::get_automation(&state.pool, id).await?))
}

pub async fn delete(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    db::repository::automations::delete_automation(&state.pool, id).await?;
    state.scheduler.unschedule(id).await;
    state.reload().await;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct SetEnabledDto {
    pub enabled: bool,
}

pub async fn set_enabled(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(payload): Json<SetEnabledDto>,
) -> Result<StatusCode, ApiError> {
    db::repository::automations::set_enabled(&state.pool, id, payload.enabled).await?;
    state.reload().await;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct RescheduleDto {
    pub trigger_config: serde_json::Value,
}

pub async fn reschedule(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(payload): Json<RescheduleDto>,
) -> Result<StatusCode, ApiError> {
    let parsed = serde_json::from_value::<TriggerConfig>(payload.trigger_config.clone())
        .map_err(|e| ApiError::BadRequest(format!("invalid trigger_config: {e}")))?;

    let next_run_at = match &parsed {
        TriggerConfig::Cron { expression, timezone } => {
            Some(queue::CronExpr::parse(expression, timezone)?.next_after(chrono::Utc::now())?)
        }
        _ => None,
    };

    db::repository::automations::reschedule(&state.pool, id, payload.trigger_config, next_run_at).await?;
    state.reload().await;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /automations/:id/execute` — fire an automation immediately,
/// outside its schedule, still going through the same run-lock as a
/// regular tick.
pub async fn fire(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let automation = db::repository::automations::get_automation(&state.pool, id).await?;
    state.scheduler.fire(id, automation.workflow_id).await;
    Ok(StatusCode::ACCEPTED)
}

pub async fn list_executions(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExecutionRecord>>, ApiError> {
    let automation = db::repository::automations::get_automation(&state.pool, id).await?;
    let records = state.store.list_for_workflow(&automation.workflow_id).await?;
    Ok(Json(records))
}
