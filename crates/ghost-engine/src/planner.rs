//! 4.I step 3: use a Ghost's stored plan as-is, or ask the LLM to draft one.

use ghost_llm::{ChatMessage, CompletionRequest, LlmProvider};
use ghost_types::{ActionSpec, ExecutionNode, NodeType, Tool};
use serde_json::Value;

const SYSTEM_PROMPT: &str = "You plan browser workflow automations. Respond with a single JSON array \
of execution nodes using only these tools: navigate_to, click_element, input_text, api_call, \
extract_data, human_escalation. Prefer api_call over browser-driving tools whenever an API \
equivalent exists. Every node must include an id, type (\"action\"), and an action object with \
tool and params. Include a fallback node id where a step might reasonably fail.";

fn escalation_plan(reason: &str) -> Vec<ExecutionNode> {
    vec![ExecutionNode {
        id: "escalate".to_string(),
        node_type: NodeType::Action,
        action: Some(ActionSpec {
            tool: Tool::HumanEscalation,
            params: serde_json::json!({ "reason": reason }),
        }),
        condition: None,
        children: None,
        fallback: None,
        timeout_ms: None,
    }]
}

/// Finds the first top-level `[...]` array in `text`, tolerating surrounding
/// prose and brackets nested inside quoted strings.
fn extract_first_json_array(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('[')?;
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
            b'[' => depth += 1,
            b']' => {
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

/// Returns the Ghost's stored plan unchanged, or asks `llm` to draft one.
/// Any planner failure (LLM error, unparseable response) yields a single-step
/// plan escalating to a human rather than propagating an error (4.I step 3).
pub async fn plan(llm: &dyn LlmProvider, stored_plan: &[ExecutionNode], parameters: &Value, trigger: &str) -> Vec<ExecutionNode> {
    if !stored_plan.is_empty() {
        return stored_plan.to_vec();
    }

    let user_prompt = format!(
        "Trigger: {trigger}\nParameters: {}",
        serde_json::to_string(parameters).unwrap_or_else(|_| "{}".to_string())
    );
    let request = CompletionRequest {
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user_prompt)],
        ..Default::default()
    };

    let response = match llm.complete(request).await {
        Ok(response) => response,
        Err(_) => return escalation_plan("Could not generate execution plan automatically"),
    };
    let Some(content) = response.content else {
        return escalation_plan("Could not generate execution plan automatically");
    };
    let Some(array) = extract_first_json_array(&content) else {
        return escalation_plan("Could not generate execution plan automatically");
    };
    match serde_json::from_str::<Vec<ExecutionNode>>(array) {
        Ok(nodes) if !nodes.is_empty() => nodes,
        _ => escalation_plan("Could not generate execution plan automatically"),
    }
}
