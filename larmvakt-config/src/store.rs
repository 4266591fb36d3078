//! Alert store configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Alert store backend location. Local-trust: no authentication contract.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct StoreConfig {
    /// Backing document file for the store.
    #[validate(custom(function = validation::validate_executable))]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("alerts.jsonl"),
        }
    }
}

/// Run artifact layout roots. Each run recreates
/// `<logs_root>/<run-id>/` and `<output_root>/<run-id>/`.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_logs_root")]
    pub logs_root: PathBuf,

    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
}

fn default_logs_root() -> PathBuf {
    PathBuf::from("logs")
}

fn default_output_root() -> PathBuf {
    PathBuf::from("output")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            logs_root: default_logs_root(),
            output_root: default_output_root(),
        }
    }
}

/// Aggregator / merge service tuning.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct MergeConfig {
    /// Store poll interval for the real-time aggregator (milliseconds).
    #[validate(range(min = 50, max = 60_000))]
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Capacity of the merged alert stream; bounds how far the
    /// aggregator can run ahead of the merge service.
    #[validate(range(min = 1))]
    #[serde(default = "default_stream_capacity")]
    pub stream_capacity: usize,
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_stream_capacity() -> usize {
    1024
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            stream_capacity: default_stream_capacity(),
        }
    }
}
