//! The trigger layer (C5): normalizes manual, webhook, and cron invocations
//! into one entrypoint. The engine has no notion of "how" a run started
//! beyond the [`TriggerKind`] tag it records — parsing and execution are
//! identical regardless of caller.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use nodes::{CredentialBroker, Registry};

use crate::error::TriggerError;
use crate::executor::{ExecuteRequest, WorkflowExecutor};
use crate::model::{ExecutionRecord, TriggerKind};
use crate::parser::parse_workflow;
use crate::store::ExecutionStore;

/// One normalized invocation, built by the caller from whatever triggered
/// it (an HTTP request, a cron fire, an operator's CLI command).
pub struct Invocation<'a> {
    pub workflow_uuid: Uuid,
    pub workflow_id: String,
    pub definition: &'a Value,
    pub trigger_kind: TriggerKind,
    pub input: Value,
    pub credentials: Option<Arc<dyn CredentialBroker>>,
}

/// Parse `definition` fresh and run it to completion. Re-parsing on every
/// call keeps this layer stateless — the registry is the only thing a
/// caller needs to keep warm across invocations.
pub async fn invoke(
    registry: &Registry,
    executor: &WorkflowExecutor,
    store: Option<&dyn ExecutionStore>,
    invocation: Invocation<'_>,
) -> Result<ExecutionRecord, TriggerError> {
    let (plan, initial_state, _warnings) = parse_workflow(invocation.definition, registry)?;

    let req = ExecuteRequest {
        plan: &plan,
        workflow_uuid: invocation.workflow_uuid,
        workflow_id: invocation.workflow_id,
        trigger_kind: invocation.trigger_kind,
        input: invocation.input,
        initial_state,
        credentials: invocation.credentials,
        cancel: None,
        deadline: None,
    };

    Ok(executor.execute(req, store).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExecutionStatus;
    use serde_json::json;

    #[tokio::test]
    async fn invoke_runs_a_workflow_and_tags_the_trigger_kind() {
        let registry = Registry::with_builtins();
        let executor = WorkflowExecutor::new(Arc::new(Registry::with_builtins()));
        let def = json!({
            "id": "wf1", "name": "t", "version": "1.0.0",
            "workflow": [{"math": {"operation": "add", "values": [2, 2]}}]
        });
        let record = invoke(
            &registry,
            &executor,
            None,
            Invocation {
                workflow_uuid: Uuid::new_v4(),
                workflow_id: "wf1".to_string(),
                definition: &def,
                trigger_kind: TriggerKind::Webhook,
                input: Value::Null,
                credentials: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(record.status, ExecutionStatus::Completed);
        assert_eq!(record.trigger_kind, TriggerKind::Webhook);
    }

    #[tokio::test]
    async fn invoke_surfaces_validation_errors_without_executing() {
        let registry = Registry::with_builtins();
        let executor = WorkflowExecutor::new(Arc::new(Registry::with_builtins()));
        let def = json!({ "id": "wf1", "name": "t", "version": "1.0.0", "workflow": [] });
        let result = invoke(
            &registry,
            &executor,
            None,
            Invocation {
                workflow_uuid: Uuid::new_v4(),
                workflow_id: "wf1".to_string(),
                definition: &def,
                trigger_kind: TriggerKind::Manual,
                input: Value::Null,
                credentials: None,
            },
        )
        .await;

        assert!(result.is_err());
    }
}
