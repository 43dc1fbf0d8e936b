//! 4.I step 4: per-node tool dispatch over the closed [`Tool`] set.

use std::time::{Duration, Instant};

use ghost_types::{ExecutionNode, ExecutionStep, StepStatus, Strategy, Tool};
use serde_json::Value;

fn selector_strategy(params: &Value) -> Strategy {
    match params.get("selector_strategy").and_then(|v| v.as_str()) {
        Some(s) => Strategy::from_str(s),
        None => Strategy::Semantic,
    }
}

async fn call_api(client: &reqwest::Client, params: &Value) -> Result<Value, String> {
    let endpoint = params
        .get("endpoint")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "api_call missing endpoint".to_string())?;
    let method = params.get("method").and_then(|v| v.as_str()).unwrap_or("GET");
    let method: reqwest::Method = method.parse().map_err(|_| format!("invalid HTTP method: {method}"))?;

    let mut request = client.request(method, endpoint);
    if let Some(headers) = params.get("headers").and_then(|v| v.as_object()) {
        for (key, value) in headers {
            if let Some(value) = value.as_str() {
                request = request.header(key.as_str(), value);
            }
        }
    }
    if let Some(body) = params.get("body") {
        request = request.json(body);
    }

    let response = request.send().await.map_err(|e| e.to_string())?;
    let status = response.status().as_u16();
    let headers: serde_json::Map<String, Value> = response
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), Value::String(v.to_string()))))
        .collect();
    let raw = response.text().await.map_err(|e| e.to_string())?;
    let body = serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw));

    Ok(serde_json::json!({ "status": status, "headers": Value::Object(headers), "body": body }))
}

/// Executes one action node, honoring its `timeout_ms` if set. Exceptions
/// (including timeouts) yield `strategy="direct"`, `status="failed"` per
/// 4.I step 4.
pub async fn execute_node(client: &reqwest::Client, node: &ExecutionNode) -> ExecutionStep {
    let started = Instant::now();
    let Some(action) = &node.action else {
        return ExecutionStep {
            node_id: node.id.clone(),
            status: StepStatus::Failed,
            strategy: Strategy::Direct,
            duration_ms: started.elapsed().as_millis() as u64,
            output: None,
            error: Some("node has no action".to_string()),
        };
    };

    let body = dispatch(client, action.tool.clone(), &action.params);
    let result = match node.timeout_ms {
        Some(ms) => tokio::time::timeout(Duration::from_millis(ms), body)
            .await
            .unwrap_or_else(|_| DispatchOutcome::failed(Strategy::Direct, "step exceeded its configured timeout".to_string())),
        None => body.await,
    };

    ExecutionStep {
        node_id: node.id.clone(),
        status: result.status,
        strategy: result.strategy,
        duration_ms: started.elapsed().as_millis() as u64,
        output: result.output,
        error: result.error,
    }
}

struct DispatchOutcome {
    status: StepStatus,
    strategy: Strategy,
    output: Option<Value>,
    error: Option<String>,
}

impl DispatchOutcome {
    fn completed(strategy: Strategy, output: Value) -> Self {
        Self { status: StepStatus::Completed, strategy, output: Some(output), error: None }
    }

    fn failed(strategy: Strategy, error: String) -> Self {
        Self { status: StepStatus::Failed, strategy, output: None, error: Some(error) }
    }
}

async fn dispatch(client: &reqwest::Client, tool: Tool, params: &Value) -> DispatchOutcome {
    match tool {
        Tool::ApiCall => match call_api(client, params).await {
            Ok(output) => DispatchOutcome::completed(Strategy::Api, output),
            Err(err) => DispatchOutcome::failed(Strategy::Direct, err),
        },
        Tool::NavigateTo | Tool::ClickElement | Tool::InputText | Tool::ExtractData => DispatchOutcome::completed(
            selector_strategy(params),
            serde_json::json!({
                "action": tool.as_str(),
                "params": params,
                "note": "Queued for client-side browser execution",
            }),
        ),
        Tool::HumanEscalation => DispatchOutcome::completed(
            Strategy::Human,
            serde_json::json!({
                "escalated": true,
                "reason": params.get("reason").cloned().unwrap_or(Value::Null),
                "context": params.get("context").cloned().unwrap_or(Value::Null),
            }),
        ),
        Tool::Other(name) => DispatchOutcome {
            status: StepStatus::Completed,
            strategy: Strategy::Unknown,
            output: Some(serde_json::json!({ "error": format!("unknown tool: {name}") })),
            error: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghost_types::{ActionSpec, NodeType};

    fn action_node(id: &str, tool: Tool, params: Value) -> ExecutionNode {
        ExecutionNode {
            id: id.to_string(),
            node_type: NodeType::Action,
            action: Some(ActionSpec { tool, params }),
            condition: None,
            children: None,
            fallback: None,
            timeout_ms: None,
        }
    }

    #[tokio::test]
    async fn navigate_to_records_intent_without_driving_a_browser() {
        let client = reqwest::Client::new();
        let node = action_node("n1", Tool::NavigateTo, serde_json::json!({ "url": "https://example.com" }));
        let step = execute_node(&client, &node).await;
        assert_eq!(step.status, StepStatus::Completed);
        assert_eq!(step.strategy, Strategy::Semantic);
        assert_eq!(step.output.unwrap()["note"], "Queued for client-side browser execution");
    }

    #[tokio::test]
    async fn click_element_honors_an_explicit_selector_strategy() {
        let client = reqwest::Client::new();
        let node = action_node(
            "n1",
            Tool::ClickElement,
            serde_json::json!({ "selector_strategy": "structural" }),
        );
        let step = execute_node(&client, &node).await;
        assert_eq!(step.strategy, Strategy::Structural);
    }

    #[tokio::test]
    async fn human_escalation_records_reason_and_context() {
        let client = reqwest::Client::new();
        let node = action_node(
            "n1",
            Tool::HumanEscalation,
            serde_json::json!({ "reason": "needs review", "context": {"foo": "bar"} }),
        );
        let step = execute_node(&client, &node).await;
        assert_eq!(step.strategy, Strategy::Human);
        assert_eq!(step.output.unwrap()["escalated"], true);
    }

    #[tokio::test]
    async fn an_unknown_tool_is_completed_with_an_error_payload() {
        let client = reqwest::Client::new();
        let node = action_node("n1", Tool::Other("scroll_page".to_string()), serde_json::json!({}));
        let step = execute_node(&client, &node).await;
        assert_eq!(step.status, StepStatus::Completed);
        assert_eq!(step.strategy, Strategy::Unknown);
        assert!(step.output.unwrap()["error"].as_str().unwrap().contains("scroll_page"));
    }

    #[tokio::test]
    async fn an_api_call_without_an_endpoint_fails_with_direct_strategy() {
        let client = reqwest::Client::new();
        let node = action_node("n1", Tool::ApiCall, serde_json::json!({ "method": "GET" }));
        let step = execute_node(&client, &node).await;
        assert_eq!(step.status, StepStatus::Failed);
        assert_eq!(step.strategy, Strategy::Direct);
    }

    #[tokio::test]
    async fn an_api_call_against_a_mock_server_reports_status_and_body() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/ok"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let node = action_node(
            "n1",
            Tool::ApiCall,
            serde_json::json!({ "endpoint": format!("{}/ok", server.uri()), "method": "GET" }),
        );
        let step = execute_node(&client, &node).await;
        assert_eq!(step.status, StepStatus::Completed);
        assert_eq!(step.strategy, Strategy::Api);
        let output = step.output.unwrap();
        assert_eq!(output["status"], 200);
        assert_eq!(output["body"]["ok"], true);
    }
}
