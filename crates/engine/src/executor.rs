//! The execution engine (C4): walks a [`Plan`] node by node, dispatching
//! each step to its registered node implementation, resolving whichever
//! edge it produces against the plan, and recording the run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{instrument, warn};
use uuid::Uuid;

use nodes::{CredentialBroker, EdgeMap, ExecutionContext, NodeError, Registry};

use crate::error::EngineError;
use crate::model::{ExecutionRecord, ExecutionStatus, NodeLogEntry, TriggerKind};
use crate::plan::{Plan, ResolvedStep};
use crate::state::State;
use crate::store::ExecutionStore;

/// Retry tuning for `Retryable` node failures. `Fatal` failures and
/// retry-exhausted `Retryable` ones both normalize into an `error` edge,
/// resolved like any other edge rather than aborting the execution — only
/// engine-level faults (unknown node type, loop cap, cancellation,
/// timeout) terminate a run outright.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 3, base_delay: Duration::from_millis(100) }
    }
}

/// Everything one call to [`WorkflowExecutor::execute`] needs that isn't
/// already baked into the plan itself.
pub struct ExecuteRequest<'a> {
    pub plan: &'a Plan,
    /// Surrogate identity for the workflow definition, handed to every node
    /// via [`ExecutionContext::workflow_id`].
    pub workflow_uuid: Uuid,
    /// The workflow's author-facing `id`, recorded on the execution.
    pub workflow_id: String,
    pub trigger_kind: TriggerKind,
    pub input: Value,
    pub initial_state: Option<Map<String, Value>>,
    pub credentials: Option<Arc<dyn CredentialBroker>>,
    /// Polled before every node dispatch; flipped by a caller that wants to
    /// cancel a long-running execution cooperatively.
    pub cancel: Option<Arc<AtomicBool>>,
    pub deadline: Option<tokio::time::Instant>,
}

pub struct WorkflowExecutor {
    registry: Arc<Registry>,
    retry: RetryConfig,
}

impl WorkflowExecutor {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry, retry: RetryConfig::default() }
    }

    pub fn with_retry_config(registry: Arc<Registry>, retry: RetryConfig) -> Self {
        Self { registry, retry }
    }

    /// Run a plan to completion (or failure, or cancellation), returning
    /// the full [`ExecutionRecord`]. Persists through `store` if given —
    /// a start row immediately, then the final row once the run ends.
    #[instrument(skip_all, fields(workflow_id = %req.workflow_id))]
    pub async fn execute(&self, req: ExecuteRequest<'_>, store: Option<&dyn ExecutionStore>) -> ExecutionRecord {
        let execution_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut state = State::with_initial(req.initial_state.clone());
        let mut logs: Vec<NodeLogEntry> = Vec::new();
        let mut loop_visits: HashMap<usize, u32> = HashMap::new();

        if let Some(store) = store {
            let stub = ExecutionRecord {
                id: execution_id,
                workflow_id: req.workflow_id.clone(),
                trigger_kind: req.trigger_kind,
                started_at,
                ended_at: None,
                status: ExecutionStatus::Running,
                final_state: None,
                logs: Vec::new(),
            };
            if let Err(e) = store.start(&stub).await {
                warn!(error = %e, "failed to persist execution start");
            }
        }

        let mut current = Some(req.plan.entry);
        let mut status = ExecutionStatus::Completed;

        while let Some(idx) = current {
            if req.cancel.as_ref().is_some_and(|c| c.load(Ordering::Relaxed)) {
                status = ExecutionStatus::Cancelled;
                break;
            }
            if req.deadline.is_some_and(|d| tokio::time::Instant::now() >= d) {
                status = ExecutionStatus::Failed;
                break;
            }

            let node = req.plan.node(idx);
            let outcome = match &node.step {
                ResolvedStep::StateSet { path, value } => {
                    state.set(path, value.clone());
                    Ok(None)
                }
                // A block never executes a node, so it never produces an
                // `EdgeMap` to match against — it unconditionally takes its
                // first declared edge (first-declared-edge-wins, same rule
                // a node's own edges follow) and otherwise falls through.
                ResolvedStep::Block { edges, .. } => Ok(edges.first().map(|(_, idx)| *idx)),
                ResolvedStep::Bare { node_type } => {
                    self.dispatch(idx, node_type, false, &Map::new(), &[], &req, &mut state, &mut logs, &mut loop_visits)
                        .await
                }
                ResolvedStep::Node { node_type, is_loop, config, edges } => {
                    self.dispatch(idx, node_type, *is_loop, config, edges, &req, &mut state, &mut logs, &mut loop_visits)
                        .await
                }
            };

            match outcome {
                Ok(next) => current = next.or(node.fallthrough),
                Err(e) => {
                    warn!(error = %e, node_index = idx, "execution aborted by engine fault");
                    status = ExecutionStatus::Failed;
                    break;
                }
            }
        }

        let ended_at = Utc::now();
        let record = ExecutionRecord {
            id: execution_id,
            workflow_id: req.workflow_id,
            trigger_kind: req.trigger_kind,
            started_at,
            ended_at: Some(ended_at),
            status,
            final_state: Some(state.snapshot()),
            logs,
        };

        if let Some(store) = store {
            if let Err(e) = store.finish(&record).await {
                warn!(error = %e, "failed to persist execution completion");
            }
        }

        record
    }

    #[allow(clippy::too_many_arguments)]
    async fn dispatch(
        &self,
        idx: usize,
        node_type: &str,
        is_loop: bool,
        config: &Map<String, Value>,
        edges: &[(String, usize)],
        req: &ExecuteRequest<'_>,
        state: &mut State,
        logs: &mut Vec<NodeLogEntry>,
        loop_visits: &mut HashMap<usize, u32>,
    ) -> Result<Option<usize>, EngineError> {
        if is_loop {
            let visits = loop_visits.entry(idx).or_insert(0);
            *visits += 1;
            if *visits > req.plan.loop_cap {
                return Err(EngineError::LoopCapExceeded { node_id: node_type.to_string(), cap: req.plan.loop_cap });
            }
        }

        let node_id = format!("{node_type}#{idx}");
        let node = self
            .registry
            .create(node_type)
            .ok_or_else(|| EngineError::UnknownNodeAtRuntime(node_type.to_string(), node_id.clone()))?;

        let ctx = ExecutionContext {
            workflow_id: req.workflow_uuid,
            execution_id: Uuid::new_v4(),
            current_node_id: node_id.clone(),
            input: req.input.clone(),
            credentials: req.credentials.clone(),
        };

        let started_at = Utc::now();
        let mut attempts = 0u32;
        let outcome = loop {
            match node.execute(config, state, &ctx).await {
                Ok(map) => break Ok(map),
                Err(NodeError::Fatal(msg)) => break Err((msg, false)),
                Err(NodeError::Retryable(msg)) => {
                    attempts += 1;
                    if attempts > self.retry.max_retries {
                        break Err((msg, true));
                    }
                    let delay = self.retry.base_delay * 2u32.pow(attempts.saturating_sub(1));
                    warn!(node_id = %node_id, attempt = attempts, ?delay, "retrying after retryable node error");
                    tokio::time::sleep(delay).await;
                }
            }
        };

        let (edge_map, error_message) = match outcome {
            Ok(map) => (map, None),
            Err((message, retryable)) => {
                let mut map = EdgeMap::new();
                map.insert("error".to_string(), serde_json::json!({ "message": message, "retryable": retryable }));
                (map, Some(message))
            }
        };

        apply_edge_map_to_state(state, &edge_map);
        if is_loop {
            persist_loop_counter(state, &ctx.current_node_id, &edge_map);
        }
        let next = resolve_edge(edges, &edge_map);

        logs.push(NodeLogEntry {
            node_id,
            config_summary: Value::Object(config.clone()),
            started_at,
            ended_at: Some(Utc::now()),
            edge_taken: next.as_ref().map(|(name, _)| name.clone()),
            output: Some(Value::Object(edge_map.into_iter().collect())),
            error: error_message,
        });

        Ok(next.map(|(_, idx)| idx))
    }
}

/// First-declared-edge-wins: `edges` is already in the workflow's
/// declaration order, so the first entry whose name the node actually
/// produced is the one taken.
fn resolve_edge(edges: &[(String, usize)], produced: &EdgeMap) -> Option<(String, usize)> {
    edges.iter().find(|(name, _)| produced.contains_key(name)).map(|(name, idx)| (name.clone(), *idx))
}

/// Every produced edge's payload is visible to later steps, whether or not
/// it was the one routed on: `_edgeContext` holds the full map, and any
/// object-shaped value is also spread into top-level state.
fn apply_edge_map_to_state(state: &mut State, produced: &EdgeMap) {
    let ctx = Value::Object(produced.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
    state.set("_edgeContext", ctx);
    for value in produced.values() {
        if let Value::Object(obj) = value {
            state.merge_top_level(obj);
        }
    }
}

/// A self-tracking loop node (e.g. `range`) reports its advanced counter as
/// a `nextIndex` field on whichever edge payload it produces; nodes can't
/// write state directly, so the engine is the one that carries it back to
/// the node's private scratch path ([`nodes::loop_state_path`]) between
/// visits.
fn persist_loop_counter(state: &mut State, node_id: &str, produced: &EdgeMap) {
    if let Some(next_index) = produced.values().find_map(|v| v.get("nextIndex")) {
        state.set(&nodes::loop_state_path(node_id), next_index.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_workflow;
    use serde_json::json;

    fn registry() -> Arc<Registry> {
        Arc::new(Registry::with_builtins())
    }

    async fn run(raw: Value) -> ExecutionRecord {
        let registry = registry();
        let (plan, initial_state, _warnings) = parse_workflow(&raw, &registry).unwrap();
        let executor = WorkflowExecutor::new(registry);
        let req = ExecuteRequest {
            plan: &plan,
            workflow_uuid: Uuid::new_v4(),
            workflow_id: "wf".to_string(),
            trigger_kind: TriggerKind::Manual,
            input: Value::Null,
            initial_state,
            credentials: None,
            cancel: None,
            deadline: None,
        };
        executor.execute(req, None).await
    }

    #[tokio::test]
    async fn runs_a_linear_workflow_to_completion() {
        let raw = json!({
            "id": "wf1", "name": "t", "version": "1.0.0",
            "workflow": [{"math": {"operation": "add", "values": [2, 3]}}]
        });
        let record = run(raw).await;
        assert_eq!(record.status, ExecutionStatus::Completed);
        assert_eq!(record.final_state.unwrap()["mathResult"], json!(5));
    }

    #[tokio::test]
    async fn follows_a_declared_success_edge() {
        let raw = json!({
            "id": "wf1", "name": "t", "version": "1.0.0",
            "workflow": [
                {"math": {"operation": "add", "values": [1, 1], "success?": "tail"}},
                {"tail": {"done?": [{"$.reached": true}]}}
            ]
        });
        let record = run(raw).await;
        assert_eq!(record.status, ExecutionStatus::Completed);
        assert_eq!(record.final_state.unwrap()["reached"], json!(true));
    }

    #[tokio::test]
    async fn undeclared_node_error_falls_through() {
        let raw = json!({
            "id": "wf1", "name": "t", "version": "1.0.0",
            "workflow": [{"math": {"operation": "divide", "values": [1, 0]}}, "empty"]
        });
        let record = run(raw).await;
        assert_eq!(record.status, ExecutionStatus::Completed);
        assert_eq!(record.logs.len(), 2);
        assert!(record.logs[0].error.is_some());
    }

    #[tokio::test]
    async fn reaching_a_block_follows_its_first_declared_edge() {
        let raw = json!({
            "id": "wf1", "name": "t", "version": "1.0.0",
            "workflow": [
                {"router": {"next?": "log"}},
                {"log": {"message": "reached", "success?": [{"$.reached": true}]}}
            ]
        });
        let record = run(raw).await;
        assert_eq!(record.status, ExecutionStatus::Completed);
        assert_eq!(record.final_state.unwrap()["reached"], json!(true));
    }

    #[tokio::test]
    async fn loop_node_exceeding_cap_fails_the_execution() {
        let raw = json!({
            "id": "wf1", "name": "t", "version": "1.0.0",
            "loopCap": 3,
            "workflow": [
                {"range...": {"from": 0, "to": 1000000, "continue?": "range", "done?": "empty"}},
                "empty"
            ]
        });
        let record = run(raw).await;
        assert_eq!(record.status, ExecutionStatus::Failed);
    }

    #[tokio::test]
    async fn range_loop_terminates_via_done_once_exhausted() {
        let raw = json!({
            "id": "wf1", "name": "t", "version": "1.0.0",
            "loopCap": 10,
            "workflow": [
                {"range...": {"from": 0, "to": 3, "continue?": "range", "done?": "tail"}},
                {"tail": {"done?": [{"$.finished": true}]}}
            ]
        });
        let record = run(raw).await;
        assert_eq!(record.status, ExecutionStatus::Completed);
        assert_eq!(record.final_state.unwrap()["finished"], json!(true));
    }
}
