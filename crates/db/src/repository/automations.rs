//! Automation repository functions — the binding between a workflow and a
//! trigger, polled by the `queue` crate's cron scheduler at boot to seed
//! its in-memory schedule and updated after every fire.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::AutomationRow, DbError};

pub async fn create_automation(
    pool: &PgPool,
    tenant_id: Uuid,
    workflow_id: &str,
    trigger_config: serde_json::Value,
) -> Result<AutomationRow, DbError> {
    let id = Uuid::new_v4();

    let row = sqlx::query_as::<_, AutomationRow>(
        r#"
        INSERT INTO automations (id, tenant_id, workflow_id, enabled, trigger_config, failure_count)
        VALUES ($1, $2, $3, true, $4, 0)
        RETURNING id, tenant_id, workflow_id, enabled, trigger_config, next_run_at, last_run_at, last_error, failure_count
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .bind(workflow_id)
    .bind(trigger_config)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn get_automation(pool: &PgPool, id: Uuid) -> Result<AutomationRow, DbError> {
    sqlx::query_as::<_, AutomationRow>(
        r#"SELECT id, tenant_id, workflow_id, enabled, trigger_config, next_run_at, last_run_at, last_error, failure_count
           FROM automations WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

pub async fn list_automations(pool: &PgPool) -> Result<Vec<AutomationRow>, DbError> {
    let rows = sqlx::query_as::<_, AutomationRow>(
        r#"SELECT id, tenant_id, workflow_id, enabled, trigger_config, next_run_at, last_run_at, last_error, failure_count
           FROM automations ORDER BY workflow_id"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn set_enabled(pool: &PgPool, id: Uuid, enabled: bool) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE automations SET enabled = $1 WHERE id = $2").bind(enabled).bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

pub async fn reschedule(
    pool: &PgPool,
    id: Uuid,
    trigger_config: serde_json::Value,
    next_run_at: Option<DateTime<Utc>>,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE automations SET trigger_config = $1, next_run_at = $2 WHERE id = $3")
        .bind(trigger_config)
        .bind(next_run_at)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Record the outcome of a fire: advance `next_run_at`, stamp `last_run_at`,
/// and either clear or accumulate the failure streak.
pub async fn record_run(
    pool: &PgPool,
    id: Uuid,
    next_run_at: Option<DateTime<Utc>>,
    error: Option<&str>,
) -> Result<(), DbError> {
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE automations
        SET next_run_at = $1,
            last_run_at = $2,
            last_error = $3,
            failure_count = CASE WHEN $3::text IS NULL THEN 0 ELSE failure_count + 1 END
        WHERE id = $4
        "#,
    )
    .bind(next_run_at)
    .bind(now)
    .bind(error)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_automation(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM automations WHERE id = $1").bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
