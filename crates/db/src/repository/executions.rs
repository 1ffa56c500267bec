//! Execution repository functions — one row per workflow run, log entries
//! inlined as a JSONB array rather than a child table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::ExecutionRow, DbError};

pub async fn insert_execution(pool: &PgPool, row: &ExecutionRow) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO executions (id, workflow_id, trigger_kind, status, started_at, ended_at, final_state, logs)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(row.id)
    .bind(&row.workflow_id)
    .bind(&row.trigger_kind)
    .bind(&row.status)
    .bind(row.started_at)
    .bind(row.ended_at)
    .bind(&row.final_state)
    .bind(&row.logs)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn update_execution(pool: &PgPool, row: &ExecutionRow) -> Result<(), DbError> {
    let result = sqlx::query(
        r#"
        UPDATE executions
        SET status = $1, ended_at = $2, final_state = $3, logs = $4
        WHERE id = $5
        "#,
    )
    .bind(&row.status)
    .bind(row.ended_at)
    .bind(&row.final_state)
    .bind(&row.logs)
    .bind(row.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

pub async fn get_execution(pool: &PgPool, id: Uuid) -> Result<ExecutionRow, DbError> {
    sqlx::query_as::<_, ExecutionRow>(
        r#"SELECT id, workflow_id, trigger_kind, status, started_at, ended_at, final_state, logs
           FROM executions WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

pub async fn list_executions_for_workflow(pool: &PgPool, workflow_id: &str) -> Result<Vec<ExecutionRow>, DbError> {
    let rows = sqlx::query_as::<_, ExecutionRow>(
        r#"SELECT id, workflow_id, trigger_kind, status, started_at, ended_at, final_state, logs
           FROM executions WHERE workflow_id = $1 ORDER BY started_at DESC"#,
    )
    .bind(workflow_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
