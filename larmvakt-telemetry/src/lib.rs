//! # Larmvakt Telemetry
//!
//! Crate for logging and metrics functionalities shared by the
//! orchestration components.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
