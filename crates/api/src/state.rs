//! Shared server state: a warm node registry and executor, the execution
//! store, the cron scheduler (C6), and the webhook routing table (C8)
//! rebuilt whenever an automation's trigger changes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use db::{DbPool, PgExecutionStore};
use engine::{ExecutionStatus, Invocation, TriggerConfig, TriggerKind, WorkflowExecutor};
use nodes::Registry;
use queue::{AutomationDispatcher, CronExpr, CronScheduler};
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

/// `(HTTP method, path)` — the lookup key the webhook dispatcher (C8) uses
/// to find which automation a request belongs to.
pub type WebhookKey = (String, String);

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub registry: Arc<Registry>,
    pub executor: Arc<WorkflowExecutor>,
    pub store: Arc<PgExecutionStore>,
    pub scheduler: Arc<CronScheduler>,
    pub webhooks: Arc<RwLock<HashMap<WebhookKey, Uuid>>>,
}

impl AppState {
    pub async fn new(pool: DbPool) -> Self {
        let registry = Arc::new(Registry::with_builtins());
        let executor = Arc::new(WorkflowExecutor::new(registry.clone()));
        let store = Arc::new(PgExecutionStore::new(pool.clone()));

        let dispatcher = Arc::new(ApiDispatcher {
            pool: pool.clone(),
            registry: registry.clone(),
            executor: executor.clone(),
            store: store.clone(),
        });
        let scheduler = Arc::new(CronScheduler::new(dispatcher));

        let state = Self { pool, registry, executor, store, scheduler, webhooks: Arc::default() };
        state.reload().await;
        state
    }

    /// Re-read every automation from the database, re-seed the cron
    /// scheduler's in-memory entries, and rebuild the webhook routing
    /// table. Called at boot and after any automation mutation.
    pub async fn reload(&self) {
        let automations = match db::repository::automations::list_automations(&self.pool).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "failed to load automations while reloading scheduler state");
                return;
            }
        };

        let mut webhooks = HashMap::new();
        for row in &automations {
            let Ok(trigger) = serde_json::from_value::<TriggerConfig>(row.trigger_config.clone()) else {
                warn!(automation_id = %row.id, "automation has an unparseable trigger_config, skipping");
                continue;
            };
            match trigger {
                TriggerConfig::Cron { expression, timezone } if row.enabled => {
                    if let Err(e) = self.scheduler.schedule(row.id, row.workflow_id.clone(), &expression, &timezone).await
                    {
                        warn!(automation_id = %row.id, error = %e, "failed to schedule automation");
                    }
                }
                TriggerConfig::Cron { .. } => {
                    self.scheduler.unschedule(row.id).await;
                }
                TriggerConfig::Webhook { path, method } if row.enabled => {
                    webhooks.insert((method.to_uppercase(), path), row.id);
                }
                TriggerConfig::Webhook { .. } | TriggerConfig::Immediate => {}
            }
        }

        *self.webhooks.write().await = webhooks;
        info!(automations = automations.len(), "reloaded scheduler and webhook routing state");
    }
}

/// Bridges the generic [`queue::CronScheduler`] to this service's concrete
/// `engine`/`db` types: on every fire, re-reads the automation and its
/// workflow fresh, runs it, and records the outcome.
struct ApiDispatcher {
    pool: DbPool,
    registry: Arc<Registry>,
    executor: Arc<WorkflowExecutor>,
    store: Arc<PgExecutionStore>,
}

#[async_trait]
impl AutomationDispatcher for ApiDispatcher {
    async fn dispatch(&self, automation_id: Uuid, workflow_id: String) {
        let automation = match db::repository::automations::get_automation(&self.pool, automation_id).await {
            Ok(row) => row,
            Err(e) => {
                error!(%automation_id, error = %e, "automation fired but no longer exists");
                return;
            }
        };

        let workflow = match db::repository::workflows::get_workflow(&self.pool, &workflow_id).await {
            Ok(row) => row,
            Err(e) => {
                error!(%automation_id, %workflow_id, error = %e, "automation's workflow no longer exists");
                let _ = db::repository::automations::record_run(&self.pool, automation_id, None, Some(&e.to_string()))
                    .await;
                return;
            }
        };

        let record = engine::invoke(
            &self.registry,
            &self.executor,
            Some(self.store.as_ref()),
            Invocation {
                workflow_uuid: workflow.id,
                workflow_id: workflow.workflow_id,
                definition: &workflow.definition,
                trigger_kind: TriggerKind::Cron,
                input: serde_json::Value::Null,
                credentials: None,
            },
        )
        .await;

        let (next_run_at, error) = match serde_json::from_value::<TriggerConfig>(automation.trigger_config.clone()) {
            Ok(TriggerConfig::Cron { expression, timezone }) => match CronExpr::parse(&expression, &timezone) {
                Ok(expr) => (expr.next_after(chrono::Utc::now()).ok(), None),
                Err(e) => (None, Some(e.to_string())),
            },
            _ => (None, None),
        };

        let run_error = match record {
            Ok(record) if matches!(record.status, ExecutionStatus::Completed) => error,
            Ok(record) => Some(error.unwrap_or_else(|| format!("execution ended with status {}", record.status))),
            Err(e) => Some(error.unwrap_or_else(|| e.to_string())),
        };

        if let Err(e) = db::repository::automations::record_run(&self.pool, automation_id, next_run_at, run_error.as_deref()).await
        {
            warn!(%automation_id, error = %e, "failed to record automation run outcome");
        }
    }
}
