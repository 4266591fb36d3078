//! In-memory store backend.
//!
//! Same contract as the document store without durability. Used by the
//! aggregator/merge tests and available as a fixture backend.

use parking_lot::RwLock;

use larmvakt_core::alert::{AlertRecord, NewAlert, SourceKind, TimeRange};

use crate::error::StoreError;
use crate::snapshot::Snapshot;
use crate::store::{filter_records, AlertStore};

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<AlertRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlertStore for MemoryStore {
    fn append(&self, alert: NewAlert) -> Result<AlertRecord, StoreError> {
        let mut records = self.records.write();
        let record = AlertRecord {
            seq: records.len() as u64,
            timestamp: alert.timestamp,
            source_kind: alert.source_kind,
            detector_id: alert.detector_id,
            severity: alert.severity,
            payload: alert.payload,
        };
        records.push(record.clone());
        Ok(record)
    }

    fn query(
        &self,
        range: TimeRange,
        source_kind: Option<SourceKind>,
    ) -> Result<Vec<AlertRecord>, StoreError> {
        let records = self.records.read().clone();
        Ok(filter_records(records, range, source_kind))
    }

    fn extract_all(&self) -> Result<Snapshot, StoreError> {
        let records = self.query(TimeRange::all(), None)?;
        Ok(Snapshot::new(records))
    }
}
