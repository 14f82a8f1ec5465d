/*
[INPUT]:  Pipeline and polling interval
[OUTPUT]: Latest block number via `watch`
[POS]:    Engine layer - background block polling owned by each engine
[UPDATE]: When changing poll cadence or start/stop semantics
*/

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::Pipeline;
use crate::types::JsonRpcRequest;

/// Poll interval used when the caller does not pick one
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(4);

const MIN_POLLING_INTERVAL: Duration = Duration::from_millis(1);

/// Polls `eth_blockNumber` through the pipeline while running
#[derive(Debug)]
pub struct BlockTracker {
    pipeline: Arc<Pipeline>,
    polling_interval: Duration,
    latest: watch::Sender<Option<u64>>,
    running: Mutex<Option<CancellationToken>>,
}

impl BlockTracker {
    pub fn new(pipeline: Arc<Pipeline>, polling_interval: Duration) -> Self {
        let (latest, _rx) = watch::channel(None);
        Self {
            pipeline,
            polling_interval: polling_interval.max(MIN_POLLING_INTERVAL),
            latest,
            running: Mutex::new(None),
        }
    }

    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    pub fn latest_block(&self) -> Option<u64> {
        *self.latest.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<u64>> {
        self.latest.subscribe()
    }

    pub fn is_running(&self) -> bool {
        let guard = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().is_some_and(|token| !token.is_cancelled())
    }

    /// Start polling; no-op if already running or outside a Tokio runtime
    pub fn start(&self) {
        let mut guard = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.as_ref().is_some_and(|token| !token.is_cancelled()) {
            return;
        }

        if tokio::runtime::Handle::try_current().is_err() {
            warn!("BlockTracker started without Tokio runtime; polling not started");
            return;
        }

        let token = CancellationToken::new();
        *guard = Some(token.clone());

        let pipeline = self.pipeline.clone();
        let latest = self.latest.clone();
        let period = self.polling_interval;
        tokio::spawn(async move {
            poll_blocks(pipeline, latest, period, token).await;
        });
        info!(interval_ms = period.as_millis() as u64, "block tracker started");
    }

    /// Stop polling; the tracker can be started again
    pub fn stop(&self) {
        let mut guard = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = guard.take() {
            token.cancel();
            info!("block tracker stopped");
        }
    }
}

impl Drop for BlockTracker {
    fn drop(&mut self) {
        let guard = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = guard.as_ref() {
            token.cancel();
        }
    }
}

async fn poll_blocks(
    pipeline: Arc<Pipeline>,
    latest: watch::Sender<Option<u64>>,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let request = JsonRpcRequest::new(pipeline.next_id(), "eth_blockNumber", json!([]));
        let result = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = pipeline.dispatch(&request) => result,
        };

        match result {
            Ok(value) => match parse_block_number(&value) {
                Some(number) => {
                    latest.send_if_modified(|current| {
                        if *current == Some(number) {
                            return false;
                        }
                        *current = Some(number);
                        true
                    });
                }
                None => warn!(value = %value, "unexpected eth_blockNumber result"),
            },
            Err(err) => debug!(error = %err, "block poll failed"),
        }
    }
}

/// Parse a hex quantity (`"0x1b4"`) or plain number
fn parse_block_number(value: &Value) -> Option<u64> {
    match value {
        Value::String(text) => {
            let digits = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))?;
            u64::from_str_radix(digits, 16).ok()
        }
        Value::Number(number) => number.as_u64(),
        _ => None,
    }
}
