//! Reqwest-backed adapter for any OpenAI-compatible chat-completions endpoint.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use ghost_types::{Error, Result};
use serde_json::{json, Value};

use crate::provider::LlmProvider;
use crate::types::{CompletionRequest, CompletionResponse, FinishReason, FunctionCall, ToolCall, Usage};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), api_key: api_key.into(), model: model.into(), timeout: Duration::from_secs(30) }
    }
}

pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Self {
        Self { client: reqwest::Client::new(), config }
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "messages": request.messages,
        });
        let obj = body.as_object_mut().expect("object literal");
        if let Some(tools) = &request.tools {
            obj.insert(
                "tools".to_string(),
                json!(tools
                    .iter()
                    .map(|t| json!({
                        "type": "function",
                        "function": {"name": t.name, "description": t.description, "parameters": t.parameters},
                    }))
                    .collect::<Vec<_>>()),
            );
        }
        if let Some(temperature) = request.temperature {
            obj.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            obj.insert("max_tokens".to_string(), json!(max_tokens));
        }
        if let Some(tool_choice) = &request.tool_choice {
            obj.insert("tool_choice".to_string(), tool_choice.clone());
        }
        body
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let started = Instant::now();
        let body = self.request_body(&request);

        let send = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .timeout(self.config.timeout)
            .send();

        let response = tokio::time::timeout(self.config.timeout, send)
            .await
            .map_err(|_| Error::Timeout("LLM completion exceeded configured timeout".to_string()))?
            .map_err(|e| Error::Upstream(e.to_string()))?;

        if response.status().is_server_error() {
            return Err(Error::Upstream(format!("LLM provider returned {}", response.status())));
        }
        if !response.status().is_success() {
            return Err(Error::Invariant(format!("LLM provider returned {}", response.status())));
        }

        let payload: Value = response.json().await.map_err(|e| Error::Upstream(e.to_string()))?;
        let latency_ms = started.elapsed().as_millis() as u64;
        parse_completion(&payload, latency_ms)
    }

    async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/models", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

fn parse_completion(payload: &Value, latency_ms: u64) -> Result<CompletionResponse> {
    let choice = payload
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| Error::Invariant("LLM response missing choices[0]".to_string()))?;

    let message = choice.get("message").cloned().unwrap_or(Value::Null);
    let content = message.get("content").and_then(|c| c.as_str()).map(|s| s.to_string());

    let tool_calls = message
        .get("tool_calls")
        .and_then(|tc| tc.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|tc| {
                    let id = tc.get("id")?.as_str()?.to_string();
                    let function = tc.get("function")?;
                    let name = function.get("name")?.as_str()?.to_string();
                    let arguments = function.get("arguments")?.as_str()?.to_string();
                    Some(ToolCall { id, kind: "function".to_string(), function: FunctionCall { name, arguments } })
                })
                .collect()
        })
        .unwrap_or_default();

    let finish_reason = choice
        .get("finish_reason")
        .and_then(|f| f.as_str())
        .map(FinishReason::from_provider_str)
        .unwrap_or(FinishReason::Stop);

    let usage = payload.get("usage").map(|u| Usage {
        prompt: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        completion: u.get("completion_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        total: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
    }).unwrap_or(Usage { prompt: 0, completion: 0, total: 0 });

    Ok(CompletionResponse {
        id: payload.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        content,
        tool_calls,
        usage,
        finish_reason,
        model: payload.get("model").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        latency_ms,
    })
}
