//! Alert record model.
//!
//! Records are append-only and immutable once written. Ordering is by
//! timestamp with ties broken by the store-assigned insertion sequence;
//! that sequence is also the record identity the aggregator dedups on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the cyber-physical boundary produced the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Physical,
    Network,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Physical => "physical",
            SourceKind::Network => "network",
        }
    }
}

/// Alert severity, ordered from least to most urgent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// A record as submitted by a detector, before the store assigns its
/// insertion sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAlert {
    pub timestamp: DateTime<Utc>,
    pub source_kind: SourceKind,
    pub detector_id: String,
    pub severity: Severity,
    /// Opaque detector payload (IP pairs, tank levels, scores).
    pub payload: serde_json::Value,
}

/// A fully written, immutable alert record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Store-assigned insertion sequence; record identity within a run.
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub source_kind: SourceKind,
    pub detector_id: String,
    pub severity: Severity,
    pub payload: serde_json::Value,
}

impl AlertRecord {
    /// Ordering key: timestamp first, insertion sequence as tie-breaker.
    pub fn order_key(&self) -> (DateTime<Utc>, u64) {
        (self.timestamp, self.seq)
    }
}

/// Half-open query window. `None` bounds are unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if ts < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if ts >= end {
                return false;
            }
        }
        true
    }
}
