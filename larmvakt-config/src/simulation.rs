//! Simulation engine configuration.
//!
//! The engine is an external black box: the orchestrator passes it a
//! configuration file path and an output directory, then observes only the
//! exit code and the stdout/stderr stream.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Simulation engine launch parameters.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct SimulationConfig {
    /// Engine executable.
    #[validate(custom(function = validation::validate_executable))]
    pub engine: PathBuf,

    /// Configuration file handed to the engine as its first argument.
    #[validate(custom(function = validation::validate_executable))]
    pub config: PathBuf,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            engine: PathBuf::from("simulation/engine"),
            config: PathBuf::from("simulation/config.yaml"),
        }
    }
}
