//! Monitoring unit declarations.
//!
//! A unit binds one detector executable to one network interface and one
//! log category. Units are immutable after load; identity is the
//! (interface, detector_id) pair. Multiple units may share an interface,
//! and the detector supervisor partitions them by category.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// The class of capture log a detector consumes.
///
/// The set matches the structured log types the capture engine emits into
/// each interface directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    Conn,
    Arp,
    Dns,
    Cip,
    Enip,
    Reporter,
}

impl LogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Conn => "conn",
            LogCategory::Arp => "arp",
            LogCategory::Dns => "dns",
            LogCategory::Cip => "cip",
            LogCategory::Enip => "enip",
            LogCategory::Reporter => "reporter",
        }
    }

    /// File name of the capture log this category reads, e.g. `conn.log`.
    pub fn log_file_name(&self) -> String {
        format!("{}.log", self.as_str())
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One monitoring unit: a detector bound to an interface and log category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct MonitoringUnit {
    /// Network interface the unit observes.
    #[validate(custom(function = validation::validate_interface))]
    pub interface: String,

    /// Detector identity, unique together with the interface.
    #[validate(custom(function = validation::validate_detector_id))]
    pub detector_id: String,

    /// Log category the detector consumes.
    #[serde(default = "default_category")]
    pub log_category: LogCategory,

    /// Detector executable to launch.
    #[validate(custom(function = validation::validate_executable))]
    pub executable: PathBuf,
}

fn default_category() -> LogCategory {
    LogCategory::Conn
}

impl MonitoringUnit {
    /// Identity of the unit within a run.
    pub fn identity(&self) -> (&str, &str) {
        (&self.interface, &self.detector_id)
    }

    /// Deterministic per-unit log file name: `<script-stem>_<interface>_<category>.log`.
    pub fn log_file_name(&self) -> String {
        let stem = self
            .executable
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "detector".to_string());
        format!("{}_{}_{}.log", stem, self.interface, self.log_category)
    }
}
