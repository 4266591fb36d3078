//! Per-run artifact namespace.
//!
//! All file artifacts of one orchestration run live under a
//! timestamp-derived run id, threaded explicitly through every component
//! instead of relying on implicit current-directory state. Directories are
//! recreated before each run so a rerun never reads or corrupts a previous
//! run's artifacts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

/// Suffixes of transient artifacts swept during cleanup (tail position
/// markers, half-written temp files).
const TRANSIENT_SUFFIXES: [&str; 2] = [".tmp", ".pos"];

/// Run identity plus the directories namespaced under it.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub log_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl RunContext {
    /// Create a fresh run namespace under the given roots, purging any
    /// previous artifacts at the same path.
    ///
    /// Run ids have one-second granularity, so a second invocation within
    /// the same second gets a numeric suffix instead of purging the live
    /// artifacts of the first.
    pub fn create(logs_root: &Path, output_root: &Path) -> io::Result<Self> {
        let base = format!("run-{}", Utc::now().format("%Y-%m-%d-%H-%M-%S"));
        let run_id = unique_run_id(logs_root, output_root, &base);
        Self::create_with_id(logs_root, output_root, run_id)
    }

    /// As [`RunContext::create`] but with an explicit id; used by tests that
    /// need deterministic paths.
    pub fn create_with_id(
        logs_root: &Path,
        output_root: &Path,
        run_id: String,
    ) -> io::Result<Self> {
        let log_dir = logs_root.join(&run_id);
        let output_dir = output_root.join(&run_id);

        recreate_dir(&log_dir)?;
        recreate_dir(&output_dir)?;
        debug!(run_id = %run_id, "Run namespace created");

        Ok(Self {
            run_id,
            log_dir,
            output_dir,
        })
    }

    /// Log file for one named component (`capture_eth0`, `simulation`, ...).
    pub fn component_log(&self, name: &str) -> PathBuf {
        self.log_dir.join(format!("{name}.log"))
    }

    /// Capture artifact directory for one interface:
    /// `output/<run-id>/<interface>/`.
    pub fn interface_dir(&self, interface: &str) -> PathBuf {
        self.output_dir.join(interface)
    }

    /// Remove transient artifacts left behind by children. Best effort:
    /// a vanished file is not an error.
    pub fn sweep_transient(&self) -> io::Result<usize> {
        let mut removed = 0;
        for root in [&self.log_dir, &self.output_dir] {
            removed += sweep_dir(root)?;
        }
        Ok(removed)
    }
}

fn unique_run_id(logs_root: &Path, output_root: &Path, base: &str) -> String {
    let mut run_id = base.to_string();
    let mut n = 1;
    while logs_root.join(&run_id).exists() || output_root.join(&run_id).exists() {
        n += 1;
        run_id = format!("{base}-{n}");
    }
    run_id
}

fn recreate_dir(dir: &Path) -> io::Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)
}

fn sweep_dir(root: &Path) -> io::Result<usize> {
    let mut removed = 0;
    if !root.exists() {
        return Ok(0);
    }
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            removed += sweep_dir(&path)?;
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if TRANSIENT_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to sweep artifact"),
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recreates_namespace_and_purges_previous() {
        let root = tempfile::tempdir().unwrap();
        let logs = root.path().join("logs");
        let output = root.path().join("output");

        let ctx =
            RunContext::create_with_id(&logs, &output, "run-a".into()).unwrap();
        fs::write(ctx.log_dir.join("stale.log"), b"old").unwrap();

        // Same id again: previous artifacts must be gone.
        let ctx = RunContext::create_with_id(&logs, &output, "run-a".into()).unwrap();
        assert!(!ctx.log_dir.join("stale.log").exists());
        assert!(ctx.log_dir.exists());
        assert!(ctx.output_dir.exists());
    }

    #[test]
    fn distinct_run_ids_do_not_touch_each_other() {
        let root = tempfile::tempdir().unwrap();
        let logs = root.path().join("logs");
        let output = root.path().join("output");

        let first = RunContext::create_with_id(&logs, &output, "run-a".into()).unwrap();
        fs::write(first.log_dir.join("keep.log"), b"data").unwrap();

        let _second = RunContext::create_with_id(&logs, &output, "run-b".into()).unwrap();
        assert!(first.log_dir.join("keep.log").exists());
    }

    #[test]
    fn colliding_run_id_gets_suffix_instead_of_purging() {
        let root = tempfile::tempdir().unwrap();
        let logs = root.path().join("logs");
        let output = root.path().join("output");

        let first = RunContext::create_with_id(&logs, &output, "run-a".into()).unwrap();
        fs::write(first.log_dir.join("live.log"), b"data").unwrap();

        assert_eq!(unique_run_id(&logs, &output, "run-a"), "run-a-2");
        let second = RunContext::create_with_id(
            &logs,
            &output,
            unique_run_id(&logs, &output, "run-a"),
        )
        .unwrap();
        assert_eq!(second.run_id, "run-a-2");
        assert!(first.log_dir.join("live.log").exists());

        // A third collision keeps counting up.
        assert_eq!(unique_run_id(&logs, &output, "run-a"), "run-a-3");
    }

    #[test]
    fn sweeps_transient_suffixes_only() {
        let root = tempfile::tempdir().unwrap();
        let ctx = RunContext::create_with_id(
            &root.path().join("logs"),
            &root.path().join("output"),
            "run-a".into(),
        )
        .unwrap();

        let iface = ctx.interface_dir("eth0");
        fs::create_dir_all(&iface).unwrap();
        fs::write(iface.join("conn.log"), b"keep").unwrap();
        fs::write(iface.join("conn.log.pos"), b"tail position").unwrap();
        fs::write(ctx.log_dir.join("export.tmp"), b"partial").unwrap();

        let removed = ctx.sweep_transient().unwrap();
        assert_eq!(removed, 2);
        assert!(iface.join("conn.log").exists());
        assert!(!iface.join("conn.log.pos").exists());
    }
}
