//! Structured child process handles.
//!
//! The supervision tree's leaf type: every launched engine, capture
//! session, and detector unit gets a `ChildHandle` carrying its pid, its
//! durable log artifact, and its exit status once observed. Termination is
//! best-effort and signal-based; an already-gone process is not an error.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Launch failure for one child. Logged per unit; never aborts siblings.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("Failed to launch '{name}' ({path}): {source}")]
    Launch {
        name: String,
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        source: io::Error,
    },
}

/// A supervised child process.
#[derive(Debug)]
pub struct ChildHandle {
    pub name: String,
    pub pid: Option<u32>,
    pub log_path: PathBuf,
    child: Child,
}

impl ChildHandle {
    /// Spawn `command` with stdout and stderr redirected to `log_path`.
    ///
    /// The log file is the child's durable failure artifact; operators
    /// inspect it postmortem instead of an interactive pane.
    pub fn spawn_logged(
        name: &str,
        mut command: Command,
        log_path: &Path,
    ) -> Result<Self, SpawnError> {
        let log = File::create(log_path).map_err(|source| SpawnError::LogFile {
            path: log_path.to_path_buf(),
            source,
        })?;
        let log_err = log.try_clone().map_err(|source| SpawnError::LogFile {
            path: log_path.to_path_buf(),
            source,
        })?;

        // A dropped handle must never leave an orphan behind, even on an
        // error path that skips explicit teardown.
        let child = command
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpawnError::Launch {
                name: name.to_string(),
                path: PathBuf::from(command.as_std().get_program()),
                source,
            })?;

        let pid = child.id();
        info!(name, pid, log = %log_path.display(), "Child process launched");

        Ok(Self {
            name: name.to_string(),
            pid,
            log_path: log_path.to_path_buf(),
            child,
        })
    }

    /// Spawn `command` with stdout/stderr piped and teed line-by-line into
    /// `log_path` and the orchestrator's own log stream. stdin stays
    /// attached to the orchestrator's terminal (the simulation engine owns
    /// it while running).
    pub fn spawn_teed(
        name: &str,
        mut command: Command,
        log_path: &Path,
    ) -> Result<(Self, Vec<JoinHandle<()>>), SpawnError> {
        let log = std::fs::File::create(log_path).map_err(|source| SpawnError::LogFile {
            path: log_path.to_path_buf(),
            source,
        })?;
        let log = Arc::new(Mutex::new(tokio::fs::File::from_std(log)));

        let mut child = command
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpawnError::Launch {
                name: name.to_string(),
                path: PathBuf::from(command.as_std().get_program()),
                source,
            })?;

        let mut tees = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            tees.push(tee_lines(name.to_string(), stdout, Arc::clone(&log)));
        }
        if let Some(stderr) = child.stderr.take() {
            tees.push(tee_lines(name.to_string(), stderr, log));
        }

        let pid = child.id();
        info!(name, pid, log = %log_path.display(), "Child process launched (teed)");

        Ok((
            Self {
                name: name.to_string(),
                pid,
                log_path: log_path.to_path_buf(),
                child,
            },
            tees,
        ))
    }

    /// Non-blocking exit check.
    pub fn try_status(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Block until the child exits.
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Best-effort termination. An already-exited or missing process is
    /// not an error.
    pub async fn terminate(&mut self) {
        if let Err(e) = self.child.start_kill() {
            if e.kind() != io::ErrorKind::InvalidInput {
                warn!(name = %self.name, error = %e, "Termination signal failed");
            }
        }
        match self.child.wait().await {
            Ok(status) => info!(name = %self.name, %status, "Child terminated"),
            Err(e) => warn!(name = %self.name, error = %e, "Wait after termination failed"),
        }
    }
}

fn tee_lines<R>(
    name: String,
    reader: R,
    log: Arc<Mutex<tokio::fs::File>>,
) -> JoinHandle<()>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            info!(target: "child", child = %name, "{line}");
            let mut file = log.lock().await;
            let _ = file.write_all(line.as_bytes()).await;
            let _ = file.write_all(b"\n").await;
        }
        let mut file = log.lock().await;
        let _ = file.flush().await;
    })
}
