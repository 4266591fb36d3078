//! Consistent store snapshots for export.

use chrono::{DateTime, Utc};
use larmvakt_core::alert::AlertRecord;
use serde::{Deserialize, Serialize};

/// A consistent copy of the store at one instant, ordered by
/// (timestamp, seq). Produced by `extract_all`; consumed by the exporter
/// and, at run end, by the merge service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub records: Vec<AlertRecord>,
}

impl Snapshot {
    pub fn new(records: Vec<AlertRecord>) -> Self {
        Self {
            taken_at: Utc::now(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Content hash of the snapshot, logged on export so an operator can
    /// tell two exports of the same run apart from a corrupted copy.
    pub fn integrity_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for record in &self.records {
            // Serialization of an already-deserialized record cannot fail.
            let line = serde_json::to_vec(record).expect("record serializes");
            hasher.update(&line);
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize().as_bytes())
    }
}
