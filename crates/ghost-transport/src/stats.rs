use serde::{Deserialize, Serialize};

/// Snapshot returned by `Transmitter::get_stats` (4.F).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TransmitterStats {
    pub total_sent: u64,
    pub total_failed: u64,
    pub total_dropped: u64,
    pub total_batches: u64,
    pub buffer_size: usize,
    pub failed_batch_count: usize,
    pub events_this_minute: u32,
}
