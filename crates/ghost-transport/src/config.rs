use std::path::PathBuf;

/// All tunables named in 4.F; every field is overridable from the caller,
/// matching `agtrace-runtime::config::Config`'s load-with-defaults shape.
#[derive(Debug, Clone)]
pub struct TransmitterConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub max_batch_size: usize,
    pub flush_interval_ms: u64,
    pub max_retries: u32,
    pub retry_base_ms: u64,
    pub per_minute_limit: u32,
    /// Where the failed-batch queue is persisted across restarts. `None` disables
    /// durability (used by in-process tests that don't want a temp file).
    pub durable_queue_path: Option<PathBuf>,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            max_batch_size: 100,
            flush_interval_ms: 10_000,
            max_retries: 3,
            retry_base_ms: 1_000,
            per_minute_limit: 1000,
            durable_queue_path: None,
        }
    }
}
