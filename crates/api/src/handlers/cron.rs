use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use queue::CronExpr;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ValidateCronDto {
    pub expression: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

#[derive(Serialize)]
pub struct ValidateCronResponse {
    pub valid: bool,
    pub next_run_at: Option<DateTime<Utc>>,
}

/// `POST /automations/cron/validate` — check a cron expression and
/// timezone without creating an automation, for an editor's live preview.
pub async fn validate(Json(payload): Json<ValidateCronDto>) -> Result<Json<ValidateCronResponse>, ApiError> {
    let expr = CronExpr::parse(&payload.expression, &payload.timezone)?;
    let next_run_at = expr.next_after(Utc::now())?;
    Ok(Json(ValidateCronResponse { valid: true, next_run_at: Some(next_run_at) }))
}

#[derive(Serialize)]
pub struct SchedulerStatus {
    pub scheduled: usize,
    pub running: usize,
}

/// `GET /automations/scheduler/status` — a coarse health signal: how many
/// automations are scheduled and how many fires are in flight right now.
pub async fn status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(SchedulerStatus {
        scheduled: state.scheduler.entry_count().await,
        running: state.scheduler.running_count().await,
    })
}
