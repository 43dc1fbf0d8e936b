//! A scripted [`LlmProvider`] that replays canned responses in order, the
//! way `agtrace-testing`'s fixtures replay canned provider sessions instead
//! of touching a real provider.

use async_trait::async_trait;
use ghost_llm::{CompletionRequest, CompletionResponse, LlmProvider};
use ghost_types::{Error, Result};
use std::collections::VecDeque;
use tokio::sync::Mutex;

pub struct ScriptedLlmProvider {
    responses: Mutex<VecDeque<Result<CompletionResponse>>>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlmProvider {
    pub fn new() -> Self {
        Self { responses: Mutex::new(VecDeque::new()), calls: Mutex::new(Vec::new()) }
    }

    pub fn with_responses(responses: Vec<CompletionResponse>) -> Self {
        let stub = Self::new();
        for r in responses {
            stub.push_ok(r);
        }
        stub
    }

    pub fn push_ok(&self, response: CompletionResponse) {
        self.responses.try_lock().expect("stub not shared across await points during setup").push_back(Ok(response));
    }

    pub fn push_err(&self, message: impl Into<String>) {
        self.responses
            .try_lock()
            .expect("stub not shared across await points during setup")
            .push_back(Err(Error::Upstream(message.into())));
    }

    /// Requests received so far, for asserting what a caller sent upstream.
    pub async fn recorded_calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().await.clone()
    }
}

impl Default for ScriptedLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlmProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.calls.lock().await.push(request);
        let mut queue = self.responses.lock().await;
        queue
            .pop_front()
            .unwrap_or_else(|| Err(Error::Upstream("scripted LLM stub exhausted".to_string())))
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Builds a minimal, well-formed [`CompletionResponse`] for a test to enqueue.
pub fn canned_response(content: &str) -> CompletionResponse {
    CompletionResponse {
        id: "stub-completion".to_string(),
        content: Some(content.to_string()),
        tool_calls: vec![],
        usage: ghost_llm::Usage { prompt: 0, completion: 0, total: 0 },
        finish_reason: ghost_llm::FinishReason::Stop,
        model: "stub-model".to_string(),
        latency_ms: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_responses_in_order_then_errors() {
        let stub = ScriptedLlmProvider::new();
        stub.push_ok(canned_response("first"));
        stub.push_ok(canned_response("second"));

        let r1 = stub.complete(CompletionRequest::default()).await.unwrap();
        assert_eq!(r1.content.as_deref(), Some("first"));
        let r2 = stub.complete(CompletionRequest::default()).await.unwrap();
        assert_eq!(r2.content.as_deref(), Some("second"));

        let err = stub.complete(CompletionRequest::default()).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn records_every_request_it_receives() {
        let stub = ScriptedLlmProvider::new();
        stub.push_ok(canned_response("ok"));
        let mut request = CompletionRequest::default();
        request.temperature = Some(0.2);
        stub.complete(request).await.unwrap();
        let calls = stub.recorded_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].temperature, Some(0.2));
    }
}
