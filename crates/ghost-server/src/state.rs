use std::sync::Arc;

use ghost_llm::LlmProvider;
use ghost_store::Store;

use crate::rate_limit::RateLimiter;

const INGEST_PER_MINUTE_LIMIT: u32 = 1000;

/// Shared application state, the way `ServerState` is threaded through
/// `IHP-main`'s router via `Arc` + `with_state`.
pub struct AppState {
    pub store: Store,
    pub llm: Arc<dyn LlmProvider>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(store: Store, llm: Arc<dyn LlmProvider>) -> Arc<Self> {
        Arc::new(Self { store, llm, rate_limiter: RateLimiter::new(INGEST_PER_MINUTE_LIMIT) })
    }
}
