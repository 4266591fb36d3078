//! Capture engine configuration.
//!
//! One capture process is launched per unique interface; every process
//! shares the same capture-configuration artifact (dissection scripts,
//! filter rules) and writes structured logs into an interface-scoped
//! working directory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Capture engine launch parameters.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct CaptureConfig {
    /// Capture engine executable.
    #[validate(custom(function = validation::validate_executable))]
    pub engine: PathBuf,

    /// Shared capture-configuration artifact passed to every session.
    #[validate(custom(function = validation::validate_executable))]
    pub artifact: PathBuf,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            engine: PathBuf::from("capture/engine"),
            artifact: PathBuf::from("capture/capture.cfg"),
        }
    }
}
