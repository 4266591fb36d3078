//! The store contract shared by every backend.

use larmvakt_core::alert::{AlertRecord, NewAlert, SourceKind, TimeRange};

use crate::error::StoreError;
use crate::snapshot::Snapshot;

/// Append-only alert store.
///
/// Implementations must guarantee:
/// - `append` never blocks indefinitely and publishes records atomically:
///   no reader ever observes a partially written record;
/// - `query` returns records in (timestamp, insertion-sequence) order and
///   re-reads the store on every call;
/// - `extract_all` returns a consistent snapshot that never includes an
///   in-flight record. Extraction copies; it never truncates the store.
pub trait AlertStore: Send + Sync {
    fn append(&self, alert: NewAlert) -> Result<AlertRecord, StoreError>;

    fn query(
        &self,
        range: TimeRange,
        source_kind: Option<SourceKind>,
    ) -> Result<Vec<AlertRecord>, StoreError>;

    fn extract_all(&self) -> Result<Snapshot, StoreError>;
}

/// Sort records into the canonical (timestamp, seq) order.
pub(crate) fn sort_records(records: &mut [AlertRecord]) {
    records.sort_by_key(|r| r.order_key());
}

/// Apply query filters and sort into the canonical order.
pub(crate) fn filter_records(
    records: impl IntoIterator<Item = AlertRecord>,
    range: TimeRange,
    source_kind: Option<SourceKind>,
) -> Vec<AlertRecord> {
    let mut out: Vec<AlertRecord> = records
        .into_iter()
        .filter(|r| range.contains(r.timestamp))
        .filter(|r| source_kind.map_or(true, |kind| r.source_kind == kind))
        .collect();
    sort_records(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use larmvakt_core::alert::Severity;
    use proptest::prelude::*;

    fn record(seq: u64, minute: u32) -> AlertRecord {
        AlertRecord {
            seq,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, minute, 0).unwrap(),
            source_kind: SourceKind::Network,
            detector_id: "plc".into(),
            severity: Severity::Low,
            payload: serde_json::json!({}),
        }
    }

    proptest! {
        #[test]
        fn any_permutation_sorts_canonically(minutes in proptest::collection::vec(0u32..60, 0..40)) {
            let records: Vec<AlertRecord> = minutes
                .iter()
                .enumerate()
                .map(|(seq, &m)| record(seq as u64, m))
                .collect();
            let sorted = filter_records(records, TimeRange::all(), None);
            for pair in sorted.windows(2) {
                prop_assert!(pair[0].order_key() <= pair[1].order_key());
            }
        }
    }
}
