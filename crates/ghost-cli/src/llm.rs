//! Picks the LLM port backing a command: a real OpenAI-compatible adapter
//! when a base URL is configured, otherwise a provider that always declines —
//! every caller (planner, self-heal, TIC abstraction lifting) already
//! degrades gracefully to its safe fallback on `content: None`.

use std::sync::Arc;

use async_trait::async_trait;
use ghost_llm::{CompletionResponse, FinishReason, LlmProvider, OpenAiConfig, OpenAiProvider, Usage};
use ghost_types::Result;

pub struct DecliningLlmProvider;

#[async_trait]
impl LlmProvider for DecliningLlmProvider {
    async fn complete(&self, _request: ghost_llm::CompletionRequest) -> Result<CompletionResponse> {
        Ok(CompletionResponse {
            id: "no-llm-configured".to_string(),
            content: None,
            tool_calls: vec![],
            usage: Usage { prompt: 0, completion: 0, total: 0 },
            finish_reason: FinishReason::Stop,
            model: "none".to_string(),
            latency_ms: 0,
        })
    }

    async fn health_check(&self) -> bool {
        false
    }
}

pub fn build(base_url: Option<String>, api_key: Option<String>, model: String) -> Arc<dyn LlmProvider> {
    match base_url {
        Some(base_url) => {
            let config = OpenAiConfig::new(base_url, api_key.unwrap_or_default(), model);
            Arc::new(OpenAiProvider::new(config))
        }
        None => {
            tracing::warn!("no --llm-base-url configured; LLM-driven steps will fall back to their safe defaults");
            Arc::new(DecliningLlmProvider)
        }
    }
}
