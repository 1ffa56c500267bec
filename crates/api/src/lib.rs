//! `api` crate — the trigger layer's HTTP surface (C5) and the webhook
//! dispatcher (C8).
//!
//! Exposes:
//!   GET    /api/v1/workflows
//!   PUT    /api/v1/workflows
//!   GET    /api/v1/workflows/:workflow_id
//!   DELETE /api/v1/workflows/:workflow_id
//!   POST   /api/v1/workflows/:workflow_id/execute
//!   GET    /api/v1/workflows/:workflow_id/executions
//!   GET    /api/v1/workflows/allnodes
//!   GET    /api/v1/nodes/:node_type
//!   POST   /api/v1/nodes/run/:node_type
//!   GET    /api/v1/executions/:execution_id
//!   GET    /api/v1/automations
//!   POST   /api/v1/automations
//!   GET    /api/v1/automations/:id
//!   DELETE /api/v1/automations/:id
//!   POST   /api/v1/automations/:id/enabled
//!   POST   /api/v1/automations/:id/reschedule
//!   POST   /api/v1/automations/:id/execute
//!   GET    /api/v1/automations/:id/executions
//!   POST   /api/v1/automations/cron/validate
//!   GET    /api/v1/automations/scheduler/status
//!   ANY    /webhook/:path

pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{any, get, post};
use axum::Router;
use db::DbPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use state::AppState;

pub async fn serve(bind: &str, pool: DbPool) -> Result<(), std::io::Error> {
    let state = AppState::new(pool).await;
    state.scheduler.start();

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let api_router = Router::new()
        .route("/workflows", get(handlers::workflows::list).put(handlers::workflows::put))
        .route("/workflows/allnodes", get(handlers::nodes::all_nodes))
        .route("/workflows/:workflow_id", get(handlers::workflows::get).delete(handlers::workflows::delete))
        .route("/workflows/:workflow_id/execute", post(handlers::executions::execute))
        .route("/workflows/:workflow_id/executions", get(handlers::executions::list_for_workflow))
        .route("/nodes/run/:node_type", post(handlers::nodes::run))
        .route("/nodes/:node_type", get(handlers::nodes::metadata))
        .route("/executions/:execution_id", get(handlers::executions::get))
        .route("/automations", get(handlers::automations::list).post(handlers::automations::create))
        .route("/automations/cron/validate", post(handlers::cron::validate))
        .route("/automations/scheduler/status", get(handlers::cron::status))
        .route("/automations/:id", get(handlers::automations::get).delete(handlers::automations::delete))
        .route("/automations/:id/enabled", post(handlers::automations::set_enabled))
        .route("/automations/:id/reschedule", post(handlers::automations::reschedule))
        .route("/automations/:id/execute", post(handlers::automations::fire))
        .route("/automations/:id/executions", get(handlers::automations::list_executions));

    let app = Router::new()
        .nest("/api/v1", api_router)
        .route("/webhook/:path", any(handlers::webhooks::handle_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await
}

/// Run just the cron scheduler (C6), with no HTTP surface — for a
/// deployment that splits the API server from the automation worker.
pub async fn run_worker(pool: DbPool) -> Result<(), std::io::Error> {
    let state = AppState::new(pool).await;
    let scheduled = state.scheduler.entry_count().await;
    info!(scheduled, "cron worker starting");

    let handle = state.scheduler.start();
    let _ = handle.await;
    Ok(())
}
