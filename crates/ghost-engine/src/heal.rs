//! 4.I step 5: on a failed step, ask the LLM for a single substitute node and
//! execute it, recording its strategy prefixed `"self_healed:"`.

use ghost_llm::{ChatMessage, CompletionRequest, LlmProvider};
use ghost_types::{ActionSpec, ExecutionNode, ExecutionStep, NodeType, Strategy, Tool};
use serde::Deserialize;
use serde_json::Value;

use crate::tools::execute_node;

const SYSTEM_PROMPT: &str = "A workflow automation step just failed. Propose a single substitute \
step that accomplishes the same goal a different way. Respond with a single JSON object \
{\"tool\", \"params\"} using one of: navigate_to, click_element, input_text, api_call, \
extract_data, human_escalation. If no automated repair is plausible, propose human_escalation.";

#[derive(Debug, Deserialize)]
struct RepairSuggestion {
    tool: String,
    #[serde(default)]
    params: Value,
}

/// Same tolerant-prose object extraction as the clustering abstraction step;
/// duplicated locally rather than shared across crates for one small helper.
fn extract_first_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn repair_prompt(failed_node: &ExecutionNode, error: &str) -> String {
    format!(
        "Failed step: {}\nError: {error}",
        serde_json::to_string(failed_node).unwrap_or_else(|_| "{}".to_string())
    )
}

/// Returns `None` when the LLM repair call itself fails or is unparseable —
/// the caller treats that as "replan failed" and stops. Otherwise the
/// substitute step is executed and returned regardless of its own outcome;
/// the caller checks its status to decide whether healing succeeded.
pub async fn attempt_repair(
    llm: &dyn LlmProvider,
    client: &reqwest::Client,
    failed_node: &ExecutionNode,
    error: &str,
) -> Option<ExecutionStep> {
    let request = CompletionRequest {
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(repair_prompt(failed_node, error))],
        ..Default::default()
    };
    let response = llm.complete(request).await.ok()?;
    let content = response.content?;
    let json = extract_first_json_object(&content)?;
    let suggestion: RepairSuggestion = serde_json::from_str(json).ok()?;

    let substitute = ExecutionNode {
        id: format!("{}-repair", failed_node.id),
        node_type: NodeType::Action,
        action: Some(ActionSpec { tool: Tool::from(suggestion.tool.as_str()), params: suggestion.params }),
        condition: None,
        children: None,
        fallback: None,
        timeout_ms: failed_node.timeout_ms,
    };

    let mut step = execute_node(client, &substitute).await;
    step.strategy = Strategy::SelfHealed(Box::new(step.strategy));
    Some(step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghost_testing::llm_stub::{canned_response, ScriptedLlmProvider};
    use ghost_types::StepStatus;

    fn failed_node() -> ExecutionNode {
        ExecutionNode {
            id: "s1".to_string(),
            node_type: NodeType::Action,
            action: Some(ActionSpec {
                tool: Tool::ApiCall,
                params: serde_json::json!({ "endpoint": "https://broken", "method": "GET" }),
            }),
            condition: None,
            children: None,
            fallback: None,
            timeout_ms: None,
        }
    }

    #[tokio::test]
    async fn a_valid_repair_suggestion_is_executed_as_a_self_healed_step() {
        let llm = ScriptedLlmProvider::new();
        llm.push_ok(canned_response(
            r#"{"tool": "human_escalation", "params": {"reason": "upstream unavailable"}}"#,
        ));
        let client = reqwest::Client::new();
        let step = attempt_repair(&llm, &client, &failed_node(), "connection refused").await.unwrap();
        assert!(step.strategy.is_self_healed());
        assert_eq!(step.status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn an_llm_error_yields_no_substitute_step() {
        let llm = ScriptedLlmProvider::new();
        llm.push_err("upstream unavailable");
        let client = reqwest::Client::new();
        let step = attempt_repair(&llm, &client, &failed_node(), "connection refused").await;
        assert!(step.is_none());
    }

    #[tokio::test]
    async fn an_unparseable_repair_response_yields_no_substitute_step() {
        let llm = ScriptedLlmProvider::new();
        llm.push_ok(canned_response("sorry, I can't help"));
        let client = reqwest::Client::new();
        let step = attempt_repair(&llm, &client, &failed_node(), "connection refused").await;
        assert!(step.is_none());
    }
}
