//! 4.I orchestration: load the Ghost, plan, execute, self-heal, finalize,
//! and write the immutable audit row — in that order, every time.

use std::collections::HashSet;

use chrono::Utc;
use ghost_llm::LlmProvider;
use ghost_store::Store;
use ghost_types::{Execution, ExecutionLog, ExecutionStatus, ExecutionStep, GhostStatus, StepStatus};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::{heal, planner, tools};

pub struct ExecutionResult {
    pub execution_id: Uuid,
    pub status: ExecutionStatus,
    pub steps: Vec<ExecutionStep>,
}

fn status_label(status: ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::Running => "running",
        ExecutionStatus::Completed => "completed",
        ExecutionStatus::Failed => "failed",
        ExecutionStatus::Cancelled => "cancelled",
    }
}

/// Runs `(ghostId, parameters, trigger)` through plan/execute/self-heal/finalize
/// (4.I). Rejects with [`Error::GhostNotFound`]/[`Error::GhostNotApproved`]
/// before any Execution row is created.
pub async fn run_ghost(
    store: &Store,
    llm: &dyn LlmProvider,
    ghost_id: Uuid,
    parameters: Value,
    trigger: &str,
) -> Result<ExecutionResult> {
    let ghost = match store.ghost_by_id(ghost_id) {
        Ok(ghost) => ghost,
        Err(ghost_store::Error::NotFound(_)) => return Err(Error::GhostNotFound(ghost_id)),
        Err(err) => return Err(err.into()),
    };
    if !matches!(ghost.status, GhostStatus::Approved | GhostStatus::Active) {
        return Err(Error::GhostNotApproved(ghost_id));
    }

    let execution = Execution {
        id: Uuid::new_v4(),
        ghost_id,
        status: ExecutionStatus::Running,
        parameters: parameters.clone(),
        trigger: trigger.to_string(),
        step_count: 0,
        started_at: Utc::now(),
        completed_at: None,
        error: None,
    };
    store.insert_execution(&execution)?;

    let client = reqwest::Client::new();
    let plan = planner::plan(llm, &ghost.execution_plan, &parameters, trigger).await;

    let mut steps: Vec<ExecutionStep> = Vec::new();
    // §8 "Self-heal closure": the execution is `completed` iff every recorded
    // step — including a failed original whose substitute later succeeded —
    // finished `completed`/`skipped`. One failure anywhere taints the run.
    let mut any_failed = false;
    let mut stop_early = false;

    for node in &plan {
        if stop_early {
            break;
        }
        let step = tools::execute_node(&client, node).await;
        let failed = step.status == StepStatus::Failed;
        let error_message = step.error.clone();
        store.insert_execution_step(execution.id, &step)?;
        steps.push(step);
        if !failed {
            continue;
        }
        any_failed = true;

        match heal::attempt_repair(llm, &client, node, error_message.as_deref().unwrap_or("unknown error")).await {
            Some(heal_step) => {
                let heal_failed = heal_step.status == StepStatus::Failed;
                store.insert_execution_step(execution.id, &heal_step)?;
                steps.push(heal_step);
                if heal_failed {
                    stop_early = true;
                }
            }
            None => stop_early = true,
        }
    }

    let final_status = if any_failed { ExecutionStatus::Failed } else { ExecutionStatus::Completed };
    let error_summary = if any_failed { Some("one or more steps failed") } else { None };
    store.finalize_execution(execution.id, final_status, steps.len() as u32, error_summary)?;

    let duration_ms = (Utc::now() - execution.started_at).num_milliseconds().max(0) as u64;
    let strategies_used: Vec<String> =
        steps.iter().map(|s| s.strategy.as_string()).collect::<HashSet<_>>().into_iter().collect();

    let log = ExecutionLog {
        id: Uuid::new_v4(),
        execution_id: execution.id,
        ghost_id,
        org_id: ghost.org_id.clone(),
        status: status_label(final_status).to_string(),
        steps: serde_json::to_value(&steps).unwrap_or(Value::Null),
        duration_ms,
        strategies_used,
        logged_at: Utc::now(),
    };
    store.insert_execution_log(&log)?;

    Ok(ExecutionResult { execution_id: execution.id, status: final_status, steps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghost_testing::llm_stub::{canned_response, ScriptedLlmProvider};
    use ghost_testing::{approved_ghost, pending_ghost};
    use ghost_types::{ActionSpec, ExecutionNode, NodeType, Strategy, Tool};

    fn api_plan(endpoint: &str) -> Vec<ExecutionNode> {
        vec![ExecutionNode {
            id: "s1".to_string(),
            node_type: NodeType::Action,
            action: Some(ActionSpec {
                tool: Tool::ApiCall,
                params: serde_json::json!({ "endpoint": endpoint, "method": "GET" }),
            }),
            condition: None,
            children: None,
            fallback: None,
            timeout_ms: None,
        }]
    }

    #[tokio::test]
    async fn rejects_a_ghost_that_does_not_exist() {
        let store = Store::open_in_memory().unwrap();
        let llm = ScriptedLlmProvider::new();
        let result = run_ghost(&store, &llm, Uuid::new_v4(), Value::Null, "manual").await;
        assert!(matches!(result, Err(Error::GhostNotFound(_))));
    }

    #[tokio::test]
    async fn rejects_a_ghost_that_is_not_approved() {
        let store = Store::open_in_memory().unwrap();
        let ghost = pending_ghost("org1", "not-approved");
        let id = ghost.id;
        store.insert_ghost(&ghost).unwrap();
        let llm = ScriptedLlmProvider::new();
        let result = run_ghost(&store, &llm, id, Value::Null, "manual").await;
        assert!(matches!(result, Err(Error::GhostNotApproved(_))));
    }

    /// Scenario 5: the executor routes an api_call node straight through.
    #[tokio::test]
    async fn an_ok_api_call_node_completes_with_api_strategy() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/ok"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let store = Store::open_in_memory().unwrap();
        let mut ghost = approved_ghost("org1", "routes-api-call");
        ghost.execution_plan = api_plan(&format!("{}/ok", server.uri()));
        let ghost_id = ghost.id;
        store.insert_ghost(&ghost).unwrap();

        let llm = ScriptedLlmProvider::new();
        let result = run_ghost(&store, &llm, ghost_id, Value::Null, "manual").await.unwrap();

        assert_eq!(result.status, ExecutionStatus::Completed);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].strategy, Strategy::Api);
        assert_eq!(result.steps[0].output.as_ref().unwrap()["status"], 200);

        let fetched = store.execution_by_id(result.execution_id).unwrap();
        assert_eq!(fetched.status, ExecutionStatus::Completed);
        assert_eq!(fetched.step_count, 1);
    }

    /// Scenario 6: a broken upstream fails the original step; the LLM repairs
    /// it with a human escalation, which itself completes — but the overall
    /// execution is still `failed` per the self-heal closure invariant, and
    /// both strategies are recorded.
    #[tokio::test]
    async fn a_failed_step_self_heals_but_the_execution_is_still_marked_failed() {
        let store = Store::open_in_memory().unwrap();
        let mut ghost = approved_ghost("org1", "self-heals-on-failure");
        ghost.execution_plan = api_plan("http://127.0.0.1:1/unreachable");
        let ghost_id = ghost.id;
        store.insert_ghost(&ghost).unwrap();

        let llm = ScriptedLlmProvider::new();
        llm.push_ok(canned_response(
            r#"{"tool": "human_escalation", "params": {"reason": "upstream unavailable"}}"#,
        ));

        let result = run_ghost(&store, &llm, ghost_id, Value::Null, "manual").await.unwrap();

        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.steps[0].status, StepStatus::Failed);
        assert_eq!(result.steps[0].strategy, Strategy::Direct);
        assert_eq!(result.steps[1].status, StepStatus::Completed);
        assert!(result.steps[1].strategy.is_self_healed());

        let logs = store.execution_logs_for_org("org1").unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, "failed");
        assert_eq!(logs[0].strategies_used.len(), 2);
    }

    #[tokio::test]
    async fn audit_row_is_written_even_when_repair_itself_cannot_be_parsed() {
        let store = Store::open_in_memory().unwrap();
        let mut ghost = approved_ghost("org1", "unrepairable");
        ghost.execution_plan = api_plan("http://127.0.0.1:1/unreachable");
        let ghost_id = ghost.id;
        store.insert_ghost(&ghost).unwrap();

        let llm = ScriptedLlmProvider::new();
        llm.push_ok(canned_response("no repair is possible"));

        let result = run_ghost(&store, &llm, ghost_id, Value::Null, "manual").await.unwrap();
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.steps.len(), 1);

        let logs = store.execution_logs_for_org("org1").unwrap();
        assert_eq!(logs.len(), 1);
    }
}
