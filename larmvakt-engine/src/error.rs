use larmvakt_core::{SpawnError, StreamError};
use larmvakt_store::StoreError;
use thiserror::Error;

use crate::lifecycle::LifecycleState;

/// Failures that abort an orchestration run.
///
/// Extraction and export problems are deliberately absent: once the
/// simulation has produced data the runtime reports those and keeps
/// going, so that one broken artifact never discards the rest.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("alert store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("simulation engine failed to launch: {0}")]
    Simulation(#[from] SpawnError),

    #[error("alert stream setup failed: {0}")]
    Stream(#[from] StreamError),

    #[error("invalid lifecycle transition: {from} -> {to}")]
    Lifecycle {
        from: LifecycleState,
        to: LifecycleState,
    },

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("run directory setup failed: {0}")]
    Io(#[from] std::io::Error),
}
