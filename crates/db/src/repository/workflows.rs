//! Workflow CRUD operations.
//!
//! Queries go through the runtime query builder rather than `sqlx::query!`
//! — there's no live database available at build time to check the SQL
//! against, and none of the statements here are hot-path enough to need
//! compile-time verification to justify standing one up.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::WorkflowRow, DbError};

pub async fn create_workflow(
    pool: &PgPool,
    workflow_id: &str,
    name: &str,
    version: &str,
    definition: serde_json::Value,
) -> Result<WorkflowRow, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query_as::<_, WorkflowRow>(
        r#"
        INSERT INTO workflows (id, workflow_id, name, version, definition, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING id, workflow_id, name, version, definition, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(workflow_id)
    .bind(name)
    .bind(version)
    .bind(definition)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Replace an existing workflow's definition in place, bumping its version
/// and `updated_at`. Used when an author re-publishes a workflow under the
/// same `workflow_id`.
pub async fn upsert_workflow(
    pool: &PgPool,
    workflow_id: &str,
    name: &str,
    version: &str,
    definition: serde_json::Value,
) -> Result<WorkflowRow, DbError> {
    let now = Utc::now();

    let row = sqlx::query_as::<_, WorkflowRow>(
        r#"
        INSERT INTO workflows (id, workflow_id, name, version, definition, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        ON CONFLICT (workflow_id) DO UPDATE
        SET name = EXCLUDED.name, version = EXCLUDED.version, definition = EXCLUDED.definition, updated_at = $6
        RETURNING id, workflow_id, name, version, definition, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(workflow_id)
    .bind(name)
    .bind(version)
    .bind(definition)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn get_workflow(pool: &PgPool, workflow_id: &str) -> Result<WorkflowRow, DbError> {
    let row = sqlx::query_as::<_, WorkflowRow>(
        r#"SELECT id, workflow_id, name, version, definition, created_at, updated_at
           FROM workflows WHERE workflow_id = $1"#,
    )
    .bind(workflow_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

pub async fn list_workflows(pool: &PgPool) -> Result<Vec<WorkflowRow>, DbError> {
    let rows = sqlx::query_as::<_, WorkflowRow>(
        r#"SELECT id, workflow_id, name, version, definition, created_at, updated_at
           FROM workflows ORDER BY created_at DESC"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Permanently delete a workflow by its author-facing id.
///
/// Returns `DbError::NotFound` if no row was deleted.
pub async fn delete_workflow(pool: &PgPool, workflow_id: &str) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM workflows WHERE workflow_id = $1").bind(workflow_id).execute(pool).await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
