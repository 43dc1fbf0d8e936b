//! Per-device rolling-minute rate limiting for `/ingest-events` (§8
//! rate-limit conformance): 1000 accepted events per device key per 60s.

use std::time::{Duration, Instant};

use dashmap::DashMap;

const WINDOW: Duration = Duration::from_secs(60);

struct Window {
    started_at: Instant,
    count: u32,
}

/// One counter per device fingerprint, reset whenever the rolling window
/// elapses. Deliberately process-local — `ghost-transport`'s own client-side
/// limiter is the first line of defense; this is the server's backstop.
pub struct RateLimiter {
    limit: u32,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(limit: u32) -> Self {
        Self { limit, windows: DashMap::new() }
    }

    /// Returns `true` if `events_in_batch` more events are still within the
    /// device's rolling-minute budget, recording the acceptance.
    pub fn try_accept(&self, device_fingerprint: &str, events_in_batch: u32) -> bool {
        let mut entry = self.windows.entry(device_fingerprint.to_string()).or_insert_with(|| Window {
            started_at: Instant::now(),
            count: 0,
        });
        if entry.started_at.elapsed() >= WINDOW {
            entry.started_at = Instant::now();
            entry.count = 0;
        }
        if entry.count + events_in_batch > self.limit {
            return false;
        }
        entry.count += events_in_batch;
        true
    }
}
