//! Combined operator view.
//!
//! Folds the merged stream and the end-of-run snapshot into one
//! per-source-kind severity timeline, bucketed by minute. A window with no
//! records for a source is a gap, not an error: detectors only speak up
//! when something is anomalous.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use larmvakt_core::alert::{AlertRecord, Severity, SourceKind};
use larmvakt_core::AlertBus;
use larmvakt_store::Snapshot;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Failed to write merged view: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode merged view: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Alert counts for one timeline bucket.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub critical: u64,
}

impl SeverityCounts {
    fn bump(&mut self, severity: Severity) {
        match severity {
            Severity::Low => self.low += 1,
            Severity::Medium => self.medium += 1,
            Severity::High => self.high += 1,
            Severity::Critical => self.critical += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.low + self.medium + self.high + self.critical
    }
}

type Timeline = BTreeMap<DateTime<Utc>, SeverityCounts>;

/// The combined view rendered for the operator: one severity timeline per
/// source kind, keyed by minute bucket.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MergedView {
    pub network: Timeline,
    pub physical: Timeline,
}

impl MergedView {
    fn timeline_mut(&mut self, kind: SourceKind) -> &mut Timeline {
        match kind {
            SourceKind::Network => &mut self.network,
            SourceKind::Physical => &mut self.physical,
        }
    }

    fn timeline(&self, kind: SourceKind) -> &Timeline {
        match kind {
            SourceKind::Network => &self.network,
            SourceKind::Physical => &self.physical,
        }
    }

    /// Counts for one source kind in one bucket. A gap yields zero
    /// counts, never an error.
    pub fn counts_at(&self, kind: SourceKind, bucket: DateTime<Utc>) -> SeverityCounts {
        self.timeline(kind).get(&bucket).copied().unwrap_or_default()
    }
}

/// Truncate a timestamp to its minute bucket.
fn bucket_of(ts: DateTime<Utc>) -> DateTime<Utc> {
    // Truncation cannot fail for a positive, sub-day granule.
    ts.duration_trunc(TimeDelta::minutes(1)).expect("minute granule")
}

/// Consumes the merged stream and the extracted snapshot.
pub struct MergeService {
    bus: AlertBus,
    view: MergedView,
    /// Record identities already folded in; the snapshot overlaps the
    /// stream and must not double-count.
    seen: HashSet<u64>,
}

impl MergeService {
    pub fn new(bus: AlertBus) -> Self {
        Self {
            bus,
            view: MergedView::default(),
            seen: HashSet::new(),
        }
    }

    fn observe(&mut self, record: &AlertRecord) {
        if !self.seen.insert(record.seq) {
            return;
        }
        self.view
            .timeline_mut(record.source_kind)
            .entry(bucket_of(record.timestamp))
            .or_default()
            .bump(record.severity);
    }

    /// Drain everything currently on the stream. Returns records folded.
    pub fn drain(&mut self) -> usize {
        let mut folded = 0;
        while let Some(record) = self.bus.recv() {
            self.observe(&record);
            folded += 1;
        }
        if folded > 0 {
            debug!(folded, "Merge service folded stream records");
        }
        folded
    }

    /// Fold in the end-of-run snapshot. Records already seen on the live
    /// stream are skipped by identity.
    pub fn ingest_snapshot(&mut self, snapshot: &Snapshot) {
        let before = self.seen.len();
        for record in &snapshot.records {
            self.observe(record);
        }
        info!(
            new = self.seen.len() - before,
            total = self.seen.len(),
            "Snapshot folded into merged view"
        );
    }

    pub fn view(&self) -> &MergedView {
        &self.view
    }

    /// Render the merged view as a JSON artifact in the run output dir.
    pub fn write_view(&self, path: &Path) -> Result<(), MergeError> {
        let json = serde_json::to_string_pretty(&self.view)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Merged view written");
        Ok(())
    }

    /// Drain until `shutdown` is set, then one final drain.
    pub async fn run(mut self, shutdown: Arc<AtomicBool>, interval: Duration) -> Self {
        loop {
            let stopping = shutdown.load(Ordering::Acquire);
            self.drain();
            if stopping {
                return self;
            }
            tokio::time::sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(seq: u64, minute: u32, kind: SourceKind, severity: Severity) -> AlertRecord {
        AlertRecord {
            seq,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, minute, 30).unwrap(),
            source_kind: kind,
            detector_id: "d".into(),
            severity,
            payload: serde_json::json!({}),
        }
    }

    fn bucket(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, minute, 0).unwrap()
    }

    #[test]
    fn buckets_by_source_kind_and_minute() {
        let bus = AlertBus::with_capacity(16).unwrap();
        let producer = bus.share();
        let mut merge = MergeService::new(bus);

        producer.publish(record(0, 1, SourceKind::Network, Severity::High)).unwrap();
        producer.publish(record(1, 1, SourceKind::Network, Severity::High)).unwrap();
        producer.publish(record(2, 1, SourceKind::Physical, Severity::Critical)).unwrap();
        producer.publish(record(3, 4, SourceKind::Network, Severity::Low)).unwrap();
        assert_eq!(merge.drain(), 4);

        let view = merge.view();
        assert_eq!(view.counts_at(SourceKind::Network, bucket(1)).high, 2);
        assert_eq!(view.counts_at(SourceKind::Physical, bucket(1)).critical, 1);
        assert_eq!(view.counts_at(SourceKind::Network, bucket(4)).low, 1);
    }

    #[test]
    fn gaps_are_zero_not_errors() {
        let bus = AlertBus::with_capacity(16).unwrap();
        let merge = MergeService::new(bus);
        let counts = merge.view().counts_at(SourceKind::Physical, bucket(7));
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn snapshot_does_not_double_count_stream_records() {
        let bus = AlertBus::with_capacity(16).unwrap();
        let producer = bus.share();
        let mut merge = MergeService::new(bus);

        let live = record(0, 1, SourceKind::Network, Severity::Medium);
        producer.publish(live.clone()).unwrap();
        merge.drain();

        // Snapshot holds the live record plus one the stream missed.
        let snapshot = Snapshot::new(vec![
            live,
            record(1, 2, SourceKind::Physical, Severity::High),
        ]);
        merge.ingest_snapshot(&snapshot);

        let view = merge.view();
        assert_eq!(view.counts_at(SourceKind::Network, bucket(1)).medium, 1);
        assert_eq!(view.counts_at(SourceKind::Physical, bucket(2)).high, 1);
    }

    #[test]
    fn view_round_trips_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let bus = AlertBus::with_capacity(16).unwrap();
        let producer = bus.share();
        let mut merge = MergeService::new(bus);
        producer.publish(record(0, 1, SourceKind::Network, Severity::High)).unwrap();
        merge.drain();

        let path = dir.path().join("merged_view.json");
        merge.write_view(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: MergedView = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.counts_at(SourceKind::Network, bucket(1)).high, 1);
    }
}
