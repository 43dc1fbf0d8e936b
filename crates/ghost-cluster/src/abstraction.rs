//! Step 3 of 4.H: LLM abstraction lifting — name and describe a cluster in
//! domain terms instead of raw intent-class placeholders.

use std::collections::HashMap;

use ghost_llm::{ChatMessage, CompletionRequest, LlmProvider};
use serde::Deserialize;
use serde_json::Value;

use crate::windowing::EventSequence;

const MAX_SAMPLE_MEMBERS: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct LlmAbstraction {
    pub name: String,
    pub description: Option<String>,
    pub confidence: Option<f64>,
    #[serde(default)]
    pub trigger: Value,
    #[serde(default)]
    pub parameters: Value,
}

const SYSTEM_PROMPT: &str = "You name recurring browser workflows for a non-technical operator. \
Given a series of observed intent transitions, respond with a single JSON object \
{\"name\", \"description\", \"confidence\", \"trigger\", \"parameters\"} describing the workflow \
in domain-specific terms. Never use generic placeholder names like \"Navigation\" or \"Data Entry\" — \
name the underlying business task instead.";

fn build_user_prompt(members: &[&EventSequence]) -> String {
    let mut frequency: HashMap<&str, u32> = HashMap::new();
    let mut lines = Vec::new();
    for (i, member) in members.iter().take(MAX_SAMPLE_MEMBERS).enumerate() {
        lines.push(format!("Instance {}: {}", i + 1, member.render_arrow()));
        for event in &member.events {
            *frequency.entry(event.intent_label.as_str()).or_insert(0) += 1;
        }
    }
    let mut summary: Vec<String> = frequency.into_iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    summary.sort();
    lines.push(format!("Intent frequency: {}", summary.join(", ")));
    lines.join("\n")
}

/// Finds the first top-level `{...}` object in `text`, tolerating
/// surrounding prose, and respecting string-quoted braces.
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

/// Calls the LLM to name up to 5 sampled members of one surviving cluster.
/// Returns `None` on any parse failure, per 4.H's per-cluster error isolation.
pub async fn lift_abstraction(
    llm: &dyn LlmProvider,
    members: &[&EventSequence],
) -> Option<LlmAbstraction> {
    let request = CompletionRequest {
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(&build_user_prompt(members))],
        ..Default::default()
    };
    let response = llm.complete(request).await.ok()?;
    let content = response.content?;
    let json = extract_first_json_object(&content)?;
    serde_json::from_str(json).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_a_json_object_surrounded_by_prose() {
        let text = "Sure, here you go:\n{\"name\": \"Invoice Approval\", \"confidence\": 0.9}\nHope that helps!";
        let extracted = extract_first_json_object(text).unwrap();
        assert_eq!(extracted, "{\"name\": \"Invoice Approval\", \"confidence\": 0.9}");
    }

    #[test]
    fn extraction_tolerates_braces_inside_quoted_strings() {
        let text = "{\"name\": \"Close the {ticket}\", \"confidence\": 0.5}";
        let extracted = extract_first_json_object(text).unwrap();
        let parsed: LlmAbstraction = serde_json::from_str(extracted).unwrap();
        assert_eq!(parsed.name, "Close the {ticket}");
    }

    #[test]
    fn returns_none_when_no_object_is_present() {
        assert!(extract_first_json_object("no json here").is_none());
    }
}
