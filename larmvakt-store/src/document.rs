//! Durable JSON-lines document store.
//!
//! One document per line. An append serializes the record, writes the
//! whole line plus newline, and flushes before releasing the writer lock,
//! so a record is durable before it can become visible. Readers re-read
//! the file on every query and skip any trailing line that does not parse
//! as a complete document, which is the only form a torn write can take.
//! The insertion sequence is positional: line `n` has `seq == n`.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use larmvakt_core::alert::{AlertRecord, NewAlert, SourceKind, TimeRange};

use crate::error::StoreError;
use crate::snapshot::Snapshot;
use crate::store::{filter_records, AlertStore};

pub struct DocumentStore {
    path: PathBuf,
    writer: Mutex<WriterState>,
}

struct WriterState {
    file: File,
    next_seq: u64,
}

impl DocumentStore {
    /// Open (or create) the backing document file. Fails with
    /// `StoreError::Unavailable` when the backend cannot be reached.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Unavailable {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| StoreError::Unavailable {
                path: path.to_path_buf(),
                source,
            })?;

        // Existing documents keep their positional sequence numbers.
        let existing = count_complete_lines(path)?;
        if existing > 0 {
            debug!(path = %path.display(), existing, "Reopened store with existing records");
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(WriterState {
                file,
                next_seq: existing,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<AlertRecord>, StoreError> {
        let file = File::open(&self.path).map_err(|source| StoreError::Unavailable {
            path: self.path.clone(),
            source,
        })?;

        let mut records = Vec::new();
        for (seq, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            match serde_json::from_str::<NewAlert>(&line) {
                Ok(alert) => records.push(with_seq(alert, seq as u64)),
                Err(e) => {
                    // A torn trailing line is expected during a live run;
                    // anything else is worth surfacing.
                    warn!(seq, error = %e, "Skipping incomplete store document");
                }
            }
        }
        Ok(records)
    }
}

impl AlertStore for DocumentStore {
    fn append(&self, alert: NewAlert) -> Result<AlertRecord, StoreError> {
        let line = serde_json::to_string(&alert)?;

        let mut writer = self.writer.lock();
        writer.file.write_all(line.as_bytes())?;
        writer.file.write_all(b"\n")?;
        writer.file.flush()?;
        let seq = writer.next_seq;
        writer.next_seq += 1;
        drop(writer);

        Ok(with_seq(alert, seq))
    }

    fn query(
        &self,
        range: TimeRange,
        source_kind: Option<SourceKind>,
    ) -> Result<Vec<AlertRecord>, StoreError> {
        Ok(filter_records(self.read_all()?, range, source_kind))
    }

    fn extract_all(&self) -> Result<Snapshot, StoreError> {
        let records = filter_records(self.read_all()?, TimeRange::all(), None);
        Ok(Snapshot::new(records))
    }
}

fn with_seq(alert: NewAlert, seq: u64) -> AlertRecord {
    AlertRecord {
        seq,
        timestamp: alert.timestamp,
        source_kind: alert.source_kind,
        detector_id: alert.detector_id,
        severity: alert.severity,
        payload: alert.payload,
    }
}

fn count_complete_lines(path: &Path) -> Result<u64, StoreError> {
    let file = File::open(path).map_err(|source| StoreError::Unavailable {
        path: path.to_path_buf(),
        source,
    })?;
    let mut count = 0;
    for line in BufReader::new(file).lines() {
        line?;
        count += 1;
    }
    Ok(count)
}
