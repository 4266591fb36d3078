//! Capture session supervision.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info, warn};

use larmvakt_config::{CaptureConfig, MonitoringUnit};
use larmvakt_core::proc::{ChildHandle, SpawnError};
use larmvakt_core::RunContext;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to create capture directory {path}: {source}")]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Spawn(#[from] SpawnError),
}

/// One capture engine process bound to one interface. The session owns the
/// directory its logs land in; detectors for the interface read it, never
/// write it.
#[derive(Debug)]
pub struct CaptureSession {
    pub interface: String,
    pub output_dir: PathBuf,
    handle: ChildHandle,
    exited: Option<ExitStatus>,
}

impl CaptureSession {
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exited
    }
}

/// Supervises the capture process population for one run.
pub struct CaptureSupervisor {
    config: CaptureConfig,
    sessions: Vec<CaptureSession>,
}

impl CaptureSupervisor {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            sessions: Vec::new(),
        }
    }

    /// Launch one capture session per distinct interface referenced by the
    /// units, in first-seen order. Interface names are compared as exact
    /// strings; two names for the same physical device stay distinct.
    ///
    /// A failed launch is logged and does not abort sibling launches.
    pub fn launch_all(&mut self, units: &[MonitoringUnit], ctx: &RunContext) {
        for interface in distinct_interfaces(units) {
            match self.launch_session(interface, ctx) {
                Ok(session) => self.sessions.push(session),
                Err(e) => {
                    error!(interface, error = %e, "Capture session launch failed");
                }
            }
        }
        info!(sessions = self.sessions.len(), "Capture sessions launched");
    }

    fn launch_session(
        &self,
        interface: &str,
        ctx: &RunContext,
    ) -> Result<CaptureSession, CaptureError> {
        let output_dir = ctx.interface_dir(interface);
        std::fs::create_dir_all(&output_dir).map_err(|source| CaptureError::Directory {
            path: output_dir.clone(),
            source,
        })?;

        let mut command = Command::new(&self.config.engine);
        command
            .arg(interface)
            .arg(&self.config.artifact)
            .current_dir(&output_dir);

        let name = format!("capture_{interface}");
        let handle = ChildHandle::spawn_logged(&name, command, &ctx.component_log(&name))?;

        Ok(CaptureSession {
            interface: interface.to_string(),
            output_dir,
            handle,
            exited: None,
        })
    }

    /// Session directory for one interface, if a session was launched.
    pub fn session_dir(&self, interface: &str) -> Option<PathBuf> {
        self.sessions
            .iter()
            .find(|s| s.interface == interface)
            .map(|s| s.output_dir.clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn sessions(&self) -> &[CaptureSession] {
        &self.sessions
    }

    /// Observe session exits without blocking. A capture exit during a run
    /// is a failure: it is logged, never corrected, and its detectors
    /// drop to degraded-but-safe mode reading a static log.
    pub fn check_health(&mut self) -> usize {
        let mut newly_exited = 0;
        for session in &mut self.sessions {
            if session.exited.is_some() {
                continue;
            }
            match session.handle.try_status() {
                Ok(Some(status)) => {
                    warn!(
                        interface = %session.interface,
                        %status,
                        "Capture process exited unexpectedly; its detectors now read a static log"
                    );
                    session.exited = Some(status);
                    newly_exited += 1;
                }
                Ok(None) => {}
                Err(e) => warn!(interface = %session.interface, error = %e, "Health check failed"),
            }
        }
        newly_exited
    }

    /// Best-effort teardown of every still-running session.
    pub async fn shutdown(&mut self) {
        for session in &mut self.sessions {
            if session.exited.is_none() {
                session.handle.terminate().await;
            }
        }
    }
}

fn distinct_interfaces(units: &[MonitoringUnit]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for unit in units {
        if !seen.contains(&unit.interface.as_str()) {
            seen.push(unit.interface.as_str());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use larmvakt_config::LogCategory;
    use std::path::Path;

    fn unit(interface: &str, id: &str, category: LogCategory) -> MonitoringUnit {
        MonitoringUnit {
            interface: interface.into(),
            detector_id: id.into(),
            log_category: category,
            executable: "detectors/net.py".into(),
        }
    }

    /// Write a fake capture engine script that ignores its
    /// (interface, artifact) arguments.
    fn fake_engine(dir: &Path, body: &str) -> CaptureConfig {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-capture-engine");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        CaptureConfig {
            engine: path,
            artifact: "capture.cfg".into(),
        }
    }

    fn ctx(root: &Path) -> RunContext {
        RunContext::create_with_id(&root.join("logs"), &root.join("output"), "run-t".into())
            .unwrap()
    }

    #[tokio::test]
    async fn one_session_per_distinct_interface() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        let units = vec![
            unit("eth0", "plc1", LogCategory::Conn),
            unit("eth0", "plc1_arp", LogCategory::Arp),
            unit("eth1", "plc2", LogCategory::Conn),
        ];

        let mut supervisor = CaptureSupervisor::new(fake_engine(dir.path(), "sleep 5"));
        supervisor.launch_all(&units, &ctx);

        assert_eq!(supervisor.session_count(), 2);
        assert!(supervisor.session_dir("eth0").unwrap().ends_with("eth0"));
        assert!(supervisor.session_dir("eth1").unwrap().ends_with("eth1"));
        assert!(supervisor.session_dir("eth2").is_none());

        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn launch_failure_does_not_abort_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        let units = vec![
            unit("eth0", "plc1", LogCategory::Conn),
            unit("eth1", "plc2", LogCategory::Conn),
        ];

        let mut supervisor = CaptureSupervisor::new(CaptureConfig {
            engine: "/no/such/capture-engine".into(),
            artifact: "capture.cfg".into(),
        });
        supervisor.launch_all(&units, &ctx);
        assert_eq!(supervisor.session_count(), 0);

        // Directories still exist so detectors can at least observe the gap.
        assert!(ctx.interface_dir("eth0").exists());
        assert!(ctx.interface_dir("eth1").exists());
    }

    #[tokio::test]
    async fn health_check_observes_exit_without_restart() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        let units = vec![unit("eth0", "plc1", LogCategory::Conn)];

        let mut supervisor = CaptureSupervisor::new(fake_engine(dir.path(), "exit 0"));
        supervisor.launch_all(&units, &ctx);
        assert_eq!(supervisor.session_count(), 1);

        // Wait for the short-lived fake engine to exit, then observe it.
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        let exited = supervisor.check_health();
        assert_eq!(exited, 1);
        assert!(supervisor.sessions()[0].exit_status().is_some());

        // Second check reports nothing new.
        assert_eq!(supervisor.check_health(), 0);
        supervisor.shutdown().await;
    }

    #[test]
    fn empty_unit_list_launches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = ctx(dir.path());
            let mut supervisor = CaptureSupervisor::new(fake_engine(dir.path(), "sleep 5"));
            supervisor.launch_all(&[], &ctx);
            assert_eq!(supervisor.session_count(), 0);
        });
    }
}
