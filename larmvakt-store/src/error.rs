//! Store error conditions.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Alert store failures. `Unavailable` is fatal for the caller that hit
/// it; the orchestrator itself keeps running so the operator can diagnose
/// the backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Alert store backend unreachable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to encode alert record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Store I/O error: {0}")]
    Io(#[from] io::Error),
}
