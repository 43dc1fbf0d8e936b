use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use chrono::Utc;
use ghost_types::{SecureEvent, SecureEventBatch};
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::config::TransmitterConfig;
use crate::durable;
use crate::error::Result;
use crate::stats::TransmitterStats;

const FAILED_QUEUE_CAP: usize = 10;
const MINUTE_WINDOW: Duration = Duration::from_secs(60);

struct Inner {
    buffer: Vec<SecureEvent>,
    failed_queue: VecDeque<SecureEventBatch>,
    stats: TransmitterStats,
    minute_window_start: Instant,
    flushing: bool,
}

fn roll_minute_window(inner: &mut Inner) {
    if inner.minute_window_start.elapsed() >= MINUTE_WINDOW {
        inner.minute_window_start = Instant::now();
        inner.stats.events_this_minute = 0;
    }
}

/// Exclusive owner of an in-memory buffer, failed-batch queue, and rate
/// counters (4.F). External callers only ever see `enqueue`/`flush`/
/// `get_stats`/`shutdown` — the buffer itself never escapes this type.
pub struct Transmitter {
    config: TransmitterConfig,
    device_fingerprint: String,
    client: reqwest::Client,
    inner: Mutex<Inner>,
}

impl Transmitter {
    /// Restores any failed batches left over from a prior run and clears
    /// the durable file, per 4.F's start-up contract.
    pub fn new(config: TransmitterConfig, device_fingerprint: impl Into<String>) -> Result<Self> {
        let failed_queue = match &config.durable_queue_path {
            Some(path) => {
                let queue = durable::load(path)?;
                durable::clear(path)?;
                queue
            }
            None => VecDeque::new(),
        };
        let failed_batch_count = failed_queue.len();
        Ok(Self {
            client: reqwest::Client::new(),
            device_fingerprint: device_fingerprint.into(),
            inner: Mutex::new(Inner {
                buffer: Vec::new(),
                failed_queue,
                stats: TransmitterStats {
                    failed_batch_count,
                    ..Default::default()
                },
                minute_window_start: Instant::now(),
                flushing: false,
            }),
            config,
        })
    }

    /// 4.F `enqueue`: drops and counts `totalDropped` once the per-minute cap
    /// is reached; otherwise buffers and triggers a flush at `maxBatchSize`.
    pub async fn enqueue(&self, event: SecureEvent) -> Result<()> {
        let should_flush = {
            let mut inner = self.inner.lock().await;
            roll_minute_window(&mut inner);
            if inner.stats.events_this_minute >= self.config.per_minute_limit {
                inner.stats.total_dropped += 1;
                return Ok(());
            }
            inner.stats.events_this_minute += 1;
            inner.buffer.push(event);
            inner.stats.buffer_size = inner.buffer.len();
            inner.buffer.len() >= self.config.max_batch_size
        };
        if should_flush {
            self.flush().await?;
        }
        Ok(())
    }

    /// 4.F `flush`: no-op if already flushing or the buffer is empty. Takes up
    /// to `maxBatchSize` events, sends them, then attempts to drain the
    /// failed-batch queue.
    pub async fn flush(&self) -> Result<()> {
        let batch = {
            let mut inner = self.inner.lock().await;
            if inner.flushing || inner.buffer.is_empty() {
                return Ok(());
            }
            inner.flushing = true;
            let take = inner.buffer.len().min(self.config.max_batch_size);
            let events: Vec<SecureEvent> = inner.buffer.drain(..take).collect();
            inner.stats.buffer_size = inner.buffer.len();
            SecureEventBatch {
                events,
                device_fingerprint: self.device_fingerprint.clone(),
                batch_id: Uuid::new_v4(),
                sent_at: Utc::now(),
            }
        };

        self.send_batch(batch, 0).await;

        {
            let mut inner = self.inner.lock().await;
            inner.flushing = false;
        }
        self.drain_failed_queue().await
    }

    /// Re-attempts every batch currently in the failed queue exactly once.
    /// Batches that fail again are re-queued by `send_batch` itself.
    async fn drain_failed_queue(&self) -> Result<()> {
        let pending: Vec<SecureEventBatch> = {
            let mut inner = self.inner.lock().await;
            inner.failed_queue.drain(..).collect()
        };
        for batch in pending {
            self.send_batch(batch, 0).await;
        }
        self.persist_failed_queue().await
    }

    /// 4.F `sendBatch`: POSTs the batch, applying 429/5xx retry policy.
    /// Boxed because `async fn` cannot recurse directly (the future would be
    /// infinitely sized).
    fn send_batch<'a>(
        &'a self,
        batch: SecureEventBatch,
        retry: u32,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let Some(endpoint) = self.config.endpoint.clone() else {
                self.queue_failed(batch).await;
                return;
            };

            let mut request = self
                .client
                .post(&endpoint)
                .json(&batch)
                .header("X-Ghost-Batch-Id", batch.batch_id.to_string())
                .header("X-Ghost-Device", self.device_fingerprint.clone());
            if let Some(key) = &self.config.api_key {
                request = request.bearer_auth(key);
            }

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(err) if retry < self.config.max_retries => {
                    warn!(error = %err, retry, "batch send failed, retrying after backoff");
                    self.backoff_sleep(retry).await;
                    self.send_batch(batch, retry + 1).await;
                    return;
                }
                Err(err) => {
                    warn!(error = %err, "batch send failed, exhausted retries");
                    self.queue_failed(batch).await;
                    return;
                }
            };

            match response.status() {
                StatusCode::OK | StatusCode::ACCEPTED => {
                    let mut inner = self.inner.lock().await;
                    inner.stats.total_sent += batch.events.len() as u64;
                    inner.stats.total_batches += 1;
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(1);
                    tokio::time::sleep(Duration::from_secs(retry_after)).await;
                    self.send_batch(batch, retry).await;
                }
                status if status.is_server_error() && retry < self.config.max_retries => {
                    self.backoff_sleep(retry).await;
                    self.send_batch(batch, retry + 1).await;
                }
                status => {
                    warn!(%status, "batch rejected, queueing to failed-batch store");
                    let mut inner = self.inner.lock().await;
                    inner.stats.total_failed += batch.events.len() as u64;
                    drop(inner);
                    self.queue_failed(batch).await;
                }
            }
        })
    }

    async fn backoff_sleep(&self, retry: u32) {
        let millis = self.config.retry_base_ms.saturating_mul(1u64 << retry);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    async fn queue_failed(&self, batch: SecureEventBatch) {
        let mut inner = self.inner.lock().await;
        inner.failed_queue.push_back(batch);
        while inner.failed_queue.len() > FAILED_QUEUE_CAP {
            inner.failed_queue.pop_front();
        }
        inner.stats.failed_batch_count = inner.failed_queue.len();
        drop(inner);
        let _ = self.persist_failed_queue().await;
    }

    async fn persist_failed_queue(&self) -> Result<()> {
        let Some(path) = &self.config.durable_queue_path else {
            return Ok(());
        };
        let inner = self.inner.lock().await;
        durable::save(path, &inner.failed_queue)
    }

    pub async fn get_stats(&self) -> TransmitterStats {
        let inner = self.inner.lock().await;
        TransmitterStats {
            buffer_size: inner.buffer.len(),
            failed_batch_count: inner.failed_queue.len(),
            ..inner.stats
        }
    }

    /// Flushes whatever remains and persists the failed queue one final time.
    pub async fn shutdown(&self) -> Result<()> {
        self.flush().await?;
        self.persist_failed_queue().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghost_testing::secure_event;
    use ghost_types::IntentClass;

    fn config_without_endpoint() -> TransmitterConfig {
        TransmitterConfig {
            max_batch_size: 2,
            ..TransmitterConfig::default()
        }
    }

    #[tokio::test]
    async fn enqueue_below_batch_size_does_not_flush() {
        let transmitter = Transmitter::new(config_without_endpoint(), "device-1").unwrap();
        transmitter
            .enqueue(secure_event("org1", IntentClass::Navigation, "fp-1", 0))
            .await
            .unwrap();

        let stats = transmitter.get_stats().await;
        assert_eq!(stats.buffer_size, 1);
        assert_eq!(stats.total_batches, 0);
    }

    #[tokio::test]
    async fn enqueue_reaching_batch_size_triggers_flush_and_queues_failed_without_endpoint() {
        let transmitter = Transmitter::new(config_without_endpoint(), "device-1").unwrap();
        transmitter
            .enqueue(secure_event("org1", IntentClass::Navigation, "fp-1", 0))
            .await
            .unwrap();
        transmitter
            .enqueue(secure_event("org1", IntentClass::Navigation, "fp-1", 1))
            .await
            .unwrap();

        let stats = transmitter.get_stats().await;
        assert_eq!(stats.buffer_size, 0);
        assert_eq!(stats.failed_batch_count, 1);
    }

    #[tokio::test]
    async fn per_minute_limit_drops_events_past_the_cap() {
        let config = TransmitterConfig {
            per_minute_limit: 1,
            max_batch_size: 100,
            ..TransmitterConfig::default()
        };
        let transmitter = Transmitter::new(config, "device-1").unwrap();
        transmitter
            .enqueue(secure_event("org1", IntentClass::Navigation, "fp-1", 0))
            .await
            .unwrap();
        transmitter
            .enqueue(secure_event("org1", IntentClass::Navigation, "fp-1", 1))
            .await
            .unwrap();

        let stats = transmitter.get_stats().await;
        assert_eq!(stats.buffer_size, 1);
        assert_eq!(stats.total_dropped, 1);
    }

    #[tokio::test]
    async fn shutdown_flushes_remaining_buffer() {
        let transmitter = Transmitter::new(config_without_endpoint(), "device-1").unwrap();
        transmitter
            .enqueue(secure_event("org1", IntentClass::Navigation, "fp-1", 0))
            .await
            .unwrap();
        transmitter.shutdown().await.unwrap();

        let stats = transmitter.get_stats().await;
        assert_eq!(stats.buffer_size, 0);
        assert_eq!(stats.failed_batch_count, 1);
    }

    #[tokio::test]
    async fn restart_restores_and_clears_the_durable_failed_queue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failed.jsonl");
        let config = TransmitterConfig {
            max_batch_size: 1,
            durable_queue_path: Some(path.clone()),
            ..TransmitterConfig::default()
        };
        let transmitter = Transmitter::new(config.clone(), "device-1").unwrap();
        transmitter
            .enqueue(secure_event("org1", IntentClass::Navigation, "fp-1", 0))
            .await
            .unwrap();
        assert!(path.exists());

        let restarted = Transmitter::new(config, "device-1").unwrap();
        let stats = restarted.get_stats().await;
        assert_eq!(stats.failed_batch_count, 1);
    }
}
