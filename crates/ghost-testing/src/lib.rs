//! Test-only infrastructure shared across crate test suites: a scripted LLM
//! provider and fixture builders for Raw/Secure Events, Ghosts, and Patterns.

pub mod events;
pub mod fixtures;
pub mod llm_stub;

pub use events::{secure_event, RawEventBuilder};
pub use fixtures::{approved_ghost, detected_pattern, pending_ghost};
pub use llm_stub::{canned_response, ScriptedLlmProvider};
