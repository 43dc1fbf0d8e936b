//! The LLM port (§6): a `complete(messages, tools)` trait plus an
//! OpenAI-compatible adapter. Callers depend on [`LlmProvider`], never a
//! concrete implementation, so tests can swap in a scripted stub.

pub mod openai;
pub mod provider;
pub mod types;

pub use openai::{OpenAiConfig, OpenAiProvider};
pub use provider::LlmProvider;
pub use types::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, FunctionCall, ToolCall,
    ToolDef, Usage,
};
