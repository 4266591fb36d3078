//! # Larmvakt Configuration System
//!
//! Typed configuration loader for the monitoring orchestrator. Replaces
//! shell-parsed configuration piped between helper scripts with an
//! in-process, validated `MonitoringUnit` sequence.
//!
//! ## Features
//! - **Declarative units**: one entry per (interface, detector, category)
//! - **Validation**: interface names, detector identities, and executable
//!   paths are checked before any process launch
//! - **Environment overlay**: `LARMVAKT_*` variables override file values

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod capture;
mod error;
mod simulation;
mod store;
mod units;
mod validation;

pub use capture::CaptureConfig;
pub use error::ConfigError;
pub use simulation::SimulationConfig;
pub use store::MergeConfig;
pub use store::PathsConfig;
pub use store::StoreConfig;
pub use units::LogCategory;
pub use units::MonitoringUnit;

/// Top-level configuration container for a monitoring run.
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct LarmvaktConfig {
    /// Monitoring units, ordered as declared. An empty list is valid and
    /// skips all capture/detector setup.
    #[validate(nested)]
    #[serde(default)]
    pub units: Vec<MonitoringUnit>,

    /// Simulation engine launch parameters.
    #[validate(nested)]
    pub simulation: SimulationConfig,

    /// Capture engine launch parameters.
    #[validate(nested)]
    pub capture: CaptureConfig,

    /// Alert store backend location.
    #[validate(nested)]
    pub store: StoreConfig,

    /// Run artifact layout roots.
    #[validate(nested)]
    #[serde(default)]
    pub paths: PathsConfig,

    /// Aggregator and merge service tuning.
    #[validate(nested)]
    #[serde(default)]
    pub merge: MergeConfig,
}

impl LarmvaktConfig {
    /// Load configuration from a specific path.
    ///
    /// Hierarchy: file values, then `LARMVAKT_*` environment variables.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(
                path.to_string_lossy().to_string(),
            )));
        }

        Figment::from(Serialized::defaults(LarmvaktConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("LARMVAKT_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Distinct interfaces referenced by any unit, first-seen order.
    /// Exact string match only; two names for the same physical device
    /// stay distinct.
    pub fn distinct_interfaces(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for unit in &self.units {
            if !seen.contains(&unit.interface.as_str()) {
                seen.push(unit.interface.as_str());
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    const VALID: &str = r#"
units:
  - interface: eth0
    detector_id: plc1
    log_category: conn
    executable: detectors/net.py
  - interface: eth0
    detector_id: plc1_arp
    log_category: arp
    executable: detectors/net.py
  - interface: eth1
    detector_id: plc2
    log_category: conn
    executable: detectors/net.py
simulation:
  engine: sim/engine
  config: sim/topo.yaml
capture:
  engine: capture/engine
  artifact: capture/capture.cfg
store:
  path: alerts.jsonl
"#;

    #[test]
    fn loads_and_orders_units() {
        let file = write_config(VALID);
        let config = LarmvaktConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.units.len(), 3);
        assert_eq!(config.units[0].detector_id, "plc1");
        assert_eq!(config.distinct_interfaces(), vec!["eth0", "eth1"]);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = LarmvaktConfig::load_from_path("no/such/config.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn empty_interface_fails_validation() {
        let file = write_config(
            r#"
units:
  - interface: ""
    detector_id: plc1
    executable: detectors/net.py
"#,
        );
        let err = LarmvaktConfig::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn empty_unit_list_is_valid() {
        let file = write_config("units: []\n");
        let config = LarmvaktConfig::load_from_path(file.path()).unwrap();
        assert!(config.units.is_empty());
        assert!(config.distinct_interfaces().is_empty());
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let file = write_config("units: [intruder");
        let err = LarmvaktConfig::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parsing(_)));
    }
}
