//! # Larmvakt Detector Supervisor
//!
//! Partitions monitoring units by log category into execution groups and
//! launches one detector process per unit. Detectors are independent
//! observers: a crashing unit is logged with its exit context and its log
//! artifact is retained for postmortem inspection, but siblings keep
//! running. Partial detector coverage beats losing the simulation run.

pub mod supervisor;

pub use supervisor::{DetectorSupervisor, DetectorUnit};
