//! Detector unit supervision.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use tokio::process::Command;
use tracing::{error, info, warn};

use larmvakt_config::{LogCategory, MonitoringUnit};
use larmvakt_core::proc::ChildHandle;
use larmvakt_core::RunContext;

/// One supervised detector process and its postmortem context.
#[derive(Debug)]
pub struct DetectorUnit {
    pub unit: MonitoringUnit,
    /// Deterministic slot within the unit's execution group: the first
    /// unit of a group is primary (slot 0), later units co-locate. A
    /// presentation concern, kept stable for operators' muscle memory.
    pub slot: usize,
    pub log_path: PathBuf,
    handle: Option<ChildHandle>,
    exited: Option<ExitStatus>,
}

impl DetectorUnit {
    pub fn is_running(&self) -> bool {
        self.handle.is_some() && self.exited.is_none()
    }

    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exited
    }

    pub fn launch_failed(&self) -> bool {
        self.handle.is_none()
    }
}

/// Supervises the detector process population for one run, grouped by log
/// category.
pub struct DetectorSupervisor {
    groups: BTreeMap<LogCategory, Vec<DetectorUnit>>,
}

impl Default for DetectorSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorSupervisor {
    pub fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }

    /// Launch every unit exactly once, grouped by log category.
    ///
    /// Each detector is invoked with the fixed positional contract:
    /// (global config path, interface, detector id, interface log
    /// directory), stdout/stderr duplicated to its per-unit log file.
    /// A unit that fails to launch is logged and skipped; siblings
    /// launch regardless.
    pub fn launch_all(
        &mut self,
        units: &[MonitoringUnit],
        ctx: &RunContext,
        global_config: &Path,
    ) {
        for unit in units {
            let group = self.groups.entry(unit.log_category).or_default();
            let slot = group.len();
            let log_path = ctx.log_dir.join(unit.log_file_name());

            let mut command = Command::new(&unit.executable);
            command
                .arg(global_config)
                .arg(&unit.interface)
                .arg(&unit.detector_id)
                .arg(ctx.interface_dir(&unit.interface));

            let name = format!("{}_{}", unit.detector_id, unit.log_category);
            let handle = match ChildHandle::spawn_logged(&name, command, &log_path) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    error!(
                        detector = %unit.detector_id,
                        interface = %unit.interface,
                        error = %e,
                        "Detector launch failed; siblings continue"
                    );
                    None
                }
            };

            group.push(DetectorUnit {
                unit: unit.clone(),
                slot,
                log_path,
                handle,
                exited: None,
            });
        }
        info!(
            groups = self.groups.len(),
            launched = self.launched_count(),
            "Detector units launched"
        );
    }

    /// Units launched successfully (process actually spawned).
    pub fn launched_count(&self) -> usize {
        self.groups
            .values()
            .flatten()
            .filter(|u| u.handle.is_some())
            .count()
    }

    /// All tracked units, launched or not.
    pub fn unit_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn group(&self, category: LogCategory) -> Option<&[DetectorUnit]> {
        self.groups.get(&category).map(Vec::as_slice)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&LogCategory, &Vec<DetectorUnit>)> {
        self.groups.iter()
    }

    /// Observe unit exits without blocking. A finished unit keeps its
    /// handle record and log artifact so the operator can inspect the
    /// failure context; nothing is retried and no sibling is stopped.
    pub fn check_health(&mut self) -> usize {
        let mut newly_exited = 0;
        for unit in self.groups.values_mut().flatten() {
            if unit.exited.is_some() {
                continue;
            }
            let Some(handle) = unit.handle.as_mut() else {
                continue;
            };
            match handle.try_status() {
                Ok(Some(status)) => {
                    warn!(
                        detector = %unit.unit.detector_id,
                        interface = %unit.unit.interface,
                        category = %unit.unit.log_category,
                        %status,
                        log = %unit.log_path.display(),
                        "Detector exited; log retained for postmortem"
                    );
                    unit.exited = Some(status);
                    newly_exited += 1;
                }
                Ok(None) => {}
                Err(e) => warn!(
                    detector = %unit.unit.detector_id,
                    error = %e,
                    "Health check failed"
                ),
            }
        }
        newly_exited
    }

    /// Best-effort teardown of every still-running unit.
    pub async fn shutdown(&mut self) {
        for unit in self.groups.values_mut().flatten() {
            if unit.exited.is_none() {
                if let Some(handle) = unit.handle.as_mut() {
                    handle.terminate().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unit(interface: &str, id: &str, category: LogCategory, executable: &Path) -> MonitoringUnit {
        MonitoringUnit {
            interface: interface.into(),
            detector_id: id.into(),
            log_category: category,
            executable: executable.to_path_buf(),
        }
    }

    fn fake_detector(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn ctx(root: &Path) -> RunContext {
        let ctx =
            RunContext::create_with_id(&root.join("logs"), &root.join("output"), "run-t".into())
                .unwrap();
        for iface in ["eth0", "eth1"] {
            std::fs::create_dir_all(ctx.interface_dir(iface)).unwrap();
        }
        ctx
    }

    #[tokio::test]
    async fn partitions_by_category_with_deterministic_slots() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        let script = fake_detector(dir.path(), "net.py", "sleep 5");
        let units = vec![
            unit("eth0", "plc1", LogCategory::Conn, &script),
            unit("eth0", "plc1_arp", LogCategory::Arp, &script),
            unit("eth1", "plc2", LogCategory::Conn, &script),
        ];

        let mut supervisor = DetectorSupervisor::new();
        supervisor.launch_all(&units, &ctx, Path::new("config.yaml"));

        assert_eq!(supervisor.unit_count(), 3);
        assert_eq!(supervisor.launched_count(), 3);

        let conn = supervisor.group(LogCategory::Conn).unwrap();
        assert_eq!(conn.len(), 2);
        assert_eq!(conn[0].slot, 0);
        assert_eq!(conn[1].slot, 1);
        assert_eq!(supervisor.group(LogCategory::Arp).unwrap().len(), 1);
        assert!(supervisor.group(LogCategory::Dns).is_none());

        // Deterministic per-unit log names: <script>_<interface>_<category>.log
        assert!(conn[0].log_path.ends_with("net_eth0_conn.log"));
        assert!(conn[1].log_path.ends_with("net_eth1_conn.log"));

        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn positional_invocation_contract() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        // The fake detector records its argv into the capture directory.
        let script = fake_detector(
            dir.path(),
            "argdump.sh",
            r#"printf '%s\n' "$1" "$2" "$3" "$4" > "$4/args_$3.txt""#,
        );
        let units = vec![unit("eth0", "plc1", LogCategory::Conn, &script)];

        let mut supervisor = DetectorSupervisor::new();
        supervisor.launch_all(&units, &ctx, Path::new("global.yaml"));
        tokio::time::sleep(Duration::from_millis(300)).await;

        let dumped =
            std::fs::read_to_string(ctx.interface_dir("eth0").join("args_plc1.txt")).unwrap();
        let args: Vec<&str> = dumped.lines().collect();
        assert_eq!(args[0], "global.yaml");
        assert_eq!(args[1], "eth0");
        assert_eq!(args[2], "plc1");
        assert!(args[3].ends_with("eth0"));
        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn crash_does_not_stop_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        let crasher = fake_detector(dir.path(), "crasher.sh", "echo boom >&2; exit 3");
        let sleeper = fake_detector(dir.path(), "sleeper.sh", "sleep 5");
        let units = vec![
            unit("eth0", "doomed", LogCategory::Conn, &crasher),
            unit("eth0", "steady", LogCategory::Conn, &sleeper),
        ];

        let mut supervisor = DetectorSupervisor::new();
        supervisor.launch_all(&units, &ctx, Path::new("config.yaml"));
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(supervisor.check_health(), 1);
        let conn = supervisor.group(LogCategory::Conn).unwrap();
        assert_eq!(conn[0].exit_status().unwrap().code(), Some(3));
        assert!(conn[1].is_running());

        // The crashed unit's log artifact holds the failure context.
        let log = std::fs::read_to_string(&conn[0].log_path).unwrap();
        assert!(log.contains("boom"));

        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn missing_executable_skips_unit_only() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        let sleeper = fake_detector(dir.path(), "sleeper.sh", "sleep 5");
        let units = vec![
            unit("eth0", "ghost", LogCategory::Conn, Path::new("/no/such/detector")),
            unit("eth0", "steady", LogCategory::Conn, &sleeper),
        ];

        let mut supervisor = DetectorSupervisor::new();
        supervisor.launch_all(&units, &ctx, Path::new("config.yaml"));

        assert_eq!(supervisor.unit_count(), 2);
        assert_eq!(supervisor.launched_count(), 1);
        let conn = supervisor.group(LogCategory::Conn).unwrap();
        assert!(conn[0].launch_failed());
        assert!(conn[1].is_running());

        supervisor.shutdown().await;
    }
}
