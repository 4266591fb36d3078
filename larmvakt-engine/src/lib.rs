//! Orchestration runtime tying a monitored simulation run together.
//!
//! The engine drives a single run end to end: it opens the alert store,
//! launches traffic capture and detector processes, starts the streaming
//! aggregation pipeline, supervises the simulation engine, and finishes
//! with extraction, export, and cleanup. Progress through those phases is
//! tracked by an explicit [`lifecycle::LifecycleState`] machine.

pub mod error;
pub mod export;
pub mod lifecycle;
pub mod runtime;

pub use error::OrchestrationError;
pub use export::ExportPaths;
pub use lifecycle::{Lifecycle, LifecycleState, StateObserver};
pub use runtime::{OrchestratorRuntime, RunSummary};
