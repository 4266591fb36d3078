//! Bounded in-memory queue carrying the merged alert stream.
//!
//! The aggregator publishes whole poll batches in (timestamp, seq) order
//! and the merge service drains them record by record. Alert rates are
//! human-scale, so a mutex-guarded queue is the right weight; capacity
//! bounds how far the producer can run ahead of a stalled consumer.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::alert::AlertRecord;

/// Alert stream error conditions.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Alert stream at capacity")]
    StreamFull,

    #[error("Alert stream capacity must be nonzero")]
    InvalidCapacity,
}

struct Shared {
    queue: Mutex<VecDeque<AlertRecord>>,
    capacity: usize,
}

/// Handle to the merged alert stream between aggregator and merge service.
pub struct AlertBus {
    shared: Arc<Shared>,
}

impl AlertBus {
    pub fn with_capacity(capacity: usize) -> Result<Self, StreamError> {
        if capacity == 0 {
            return Err(StreamError::InvalidCapacity);
        }
        Ok(Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::with_capacity(capacity)),
                capacity,
            }),
        })
    }

    /// Creates a new handle to the shared stream.
    pub fn share(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Publish one record; fails when the consumer has fallen a full
    /// `capacity` behind.
    pub fn publish(&self, record: AlertRecord) -> Result<(), StreamError> {
        let mut queue = self.shared.queue.lock();
        if queue.len() >= self.shared.capacity {
            return Err(StreamError::StreamFull);
        }
        queue.push_back(record);
        Ok(())
    }

    /// Publish a whole poll batch, preserving its order. Blocks (yielding
    /// between attempts) until every record is enqueued: backpressure from
    /// a slow consumer stalls the producer instead of dropping alerts.
    pub fn publish_batch(&self, batch: Vec<AlertRecord>) -> usize {
        let total = batch.len();
        let mut pending = VecDeque::from(batch);
        while !pending.is_empty() {
            {
                let mut queue = self.shared.queue.lock();
                while queue.len() < self.shared.capacity {
                    match pending.pop_front() {
                        Some(record) => queue.push_back(record),
                        None => break,
                    }
                }
            }
            if !pending.is_empty() {
                std::thread::yield_now();
            }
        }
        total
    }

    /// Take the oldest record off the stream, if any.
    pub fn recv(&self) -> Option<AlertRecord> {
        self.shared.queue.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.shared.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{Severity, SourceKind};
    use chrono::{TimeZone, Utc};

    fn record(seq: u64) -> AlertRecord {
        AlertRecord {
            seq,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            source_kind: SourceKind::Network,
            detector_id: format!("plc{seq}"),
            severity: Severity::Medium,
            payload: serde_json::json!({}),
        }
    }

    #[test]
    fn rejects_zero_capacity() {
        assert!(matches!(
            AlertBus::with_capacity(0),
            Err(StreamError::InvalidCapacity)
        ));
    }

    #[test]
    fn fifo_order_preserved() {
        let bus = AlertBus::with_capacity(8).unwrap();
        for seq in 0..5 {
            bus.publish(record(seq)).unwrap();
        }
        for seq in 0..5 {
            assert_eq!(bus.recv().unwrap().seq, seq);
        }
        assert!(bus.recv().is_none());
    }

    #[test]
    fn full_stream_reports_backpressure() {
        let bus = AlertBus::with_capacity(2).unwrap();
        bus.publish(record(0)).unwrap();
        bus.publish(record(1)).unwrap();
        assert!(matches!(bus.publish(record(2)), Err(StreamError::StreamFull)));
    }

    #[test]
    fn batch_survives_capacity_pressure_in_order() {
        let bus = AlertBus::with_capacity(4).unwrap();
        let producer = bus.share();

        let writer = std::thread::spawn(move || {
            producer.publish_batch((0..50).map(record).collect())
        });

        let mut seen = Vec::new();
        while seen.len() < 50 {
            if let Some(r) = bus.recv() {
                seen.push(r.seq);
            } else {
                std::thread::yield_now();
            }
        }
        assert_eq!(writer.join().unwrap(), 50);
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }
}
