//! The LLM port (§6): a black-box `complete(messages, tools)` contract every
//! caller (TIC's abstraction lifting, the execution engine's planner and
//! self-heal loop) takes as a constructor-injected collaborator, never a
//! global (§9 "LLM as implicit global" redesign).

use async_trait::async_trait;
use ghost_types::Result;

use crate::types::CompletionRequest;
use crate::types::CompletionResponse;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Lightweight liveness probe; never panics.
    async fn health_check(&self) -> bool;
}
