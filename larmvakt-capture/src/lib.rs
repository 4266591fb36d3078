//! # Larmvakt Capture Supervisor
//!
//! Launches one capture engine process per unique interface, each writing
//! structured logs into an interface-scoped directory under the run's
//! output namespace. Capture processes are never restarted: a crashed
//! session is observed and logged, and its detectors continue reading the
//! now-static directory. Silently patching the gap would corrupt the
//! alert timeline's completeness guarantee.

pub mod supervisor;

pub use supervisor::{CaptureError, CaptureSession, CaptureSupervisor};
