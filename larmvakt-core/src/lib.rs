//! # Larmvakt Core
//!
//! Shared data model and supervision primitives:
//! - `alert`: append-only alert records written by detectors
//! - `run_context`: per-run artifact namespace
//! - `proc`: structured child process handles (the supervision tree's leaf
//!   type, replacing human-visible terminal panes)
//! - `bus`: bounded queue carrying the merged alert stream

pub mod alert;
pub mod bus;
pub mod proc;
pub mod run_context;

pub use alert::{AlertRecord, NewAlert, Severity, SourceKind, TimeRange};
pub use bus::{AlertBus, StreamError};
pub use proc::{ChildHandle, SpawnError};
pub use run_context::RunContext;
