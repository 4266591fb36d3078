//! Real-time store tailing.
//!
//! The aggregator is the single producer of the merged alert stream. It
//! polls the store, keeps a sequence watermark, and republishes records it
//! has not seen before in (timestamp, seq) order. Queries are restartable,
//! so overlapping poll windows are the normal case; the watermark
//! guarantees no record is ever emitted twice.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use larmvakt_core::alert::TimeRange;
use larmvakt_core::AlertBus;
use larmvakt_store::{AlertStore, StoreError};

pub struct Aggregator {
    store: Arc<dyn AlertStore>,
    bus: AlertBus,
    poll_interval: Duration,
    /// Highest insertion sequence republished so far.
    watermark: Option<u64>,
    total_emitted: u64,
}

impl Aggregator {
    pub fn new(store: Arc<dyn AlertStore>, bus: AlertBus, poll_interval: Duration) -> Self {
        Self {
            store,
            bus,
            poll_interval,
            watermark: None,
            total_emitted: 0,
        }
    }

    /// Records republished on the stream over the aggregator's lifetime.
    pub fn total_emitted(&self) -> u64 {
        self.total_emitted
    }

    /// One poll cycle: republish every record the watermark has not
    /// covered yet, as a single ordered batch. Returns the number of
    /// records emitted.
    pub fn poll_once(&mut self) -> Result<usize, StoreError> {
        let records = self.store.query(TimeRange::all(), None)?;

        // Query order is (timestamp, seq); the batch inherits it.
        let fresh: Vec<_> = records
            .into_iter()
            .filter(|r| self.watermark.map_or(true, |w| r.seq > w))
            .collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        let highest = fresh.iter().map(|r| r.seq).max();
        let emitted = self.bus.publish_batch(fresh);
        if let Some(h) = highest {
            if self.watermark.map_or(true, |w| h > w) {
                self.watermark = Some(h);
            }
        }
        self.total_emitted += emitted as u64;

        debug!(emitted, watermark = ?self.watermark, "Aggregator republished records");
        Ok(emitted)
    }

    /// Poll until `shutdown` is set, then run one final drain pass so
    /// records appended just before shutdown still reach the stream.
    /// Store unavailability is logged and retried on the next poll; the
    /// orchestrator keeps running so the operator can restart the backend.
    pub async fn run(mut self, shutdown: Arc<AtomicBool>) -> Self {
        loop {
            let stopping = shutdown.load(Ordering::Acquire);
            if let Err(e) = self.poll_once() {
                error!(error = %e, "Aggregator poll failed");
            }
            if stopping {
                return self;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
