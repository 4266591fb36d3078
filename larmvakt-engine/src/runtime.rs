//! End-to-end orchestration of one monitored simulation run.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use larmvakt_capture::CaptureSupervisor;
use larmvakt_config::LarmvaktConfig;
use larmvakt_core::bus::AlertBus;
use larmvakt_core::proc::ChildHandle;
use larmvakt_core::run_context::RunContext;
use larmvakt_detect::DetectorSupervisor;
use larmvakt_merge::{Aggregator, MergeService};
use larmvakt_store::{AlertStore, DocumentStore};
use larmvakt_telemetry::logging::EventLogger;
use larmvakt_telemetry::metrics::MetricsRecorder;
use opentelemetry::KeyValue;
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::error::OrchestrationError;
use crate::export::{export_snapshot, ExportPaths};
use crate::lifecycle::{Lifecycle, LifecycleState, StateObserver};

/// Interval between supervisor health sweeps while the simulation runs.
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Final report of a completed run.
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: String,
    pub simulation_status: ExitStatus,
    pub capture_sessions: usize,
    pub detectors_launched: usize,
    pub detector_units: usize,
    pub alerts_exported: usize,
    /// `None` when extraction or export failed; the failure is logged.
    pub export: Option<ExportPaths>,
    pub transient_swept: usize,
}

/// Drives a full run: launch, supervise, extract, export, clean up.
///
/// Launch order is fixed: store first (fatal if unavailable), then
/// capture sessions, then detectors, then the streaming pipeline, and
/// only then the simulation engine, so no simulated traffic flows
/// before the monitors watching it exist.
pub struct OrchestratorRuntime {
    config: LarmvaktConfig,
    config_path: PathBuf,
    metrics: Arc<MetricsRecorder>,
    lifecycle: Lifecycle,
}

impl OrchestratorRuntime {
    /// `config_path` is handed verbatim to every detector as its first
    /// positional argument.
    pub fn new(config: LarmvaktConfig, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
            metrics: Arc::new(MetricsRecorder::new()),
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        Arc::clone(&self.metrics)
    }

    pub fn set_state_observer(&mut self, observer: StateObserver) {
        self.lifecycle.set_observer(observer);
    }

    /// Runs under a fresh timestamp-derived run id.
    pub async fn run(self) -> Result<RunSummary, OrchestrationError> {
        let ctx = RunContext::create(
            &self.config.paths.logs_root,
            &self.config.paths.output_root,
        )?;
        self.run_in(ctx).await
    }

    /// Runs inside an existing run namespace.
    pub async fn run_in(mut self, ctx: RunContext) -> Result<RunSummary, OrchestrationError> {
        info!(run_id = %ctx.run_id, units = self.config.units.len(), "Run starting");
        EventLogger::log_event(
            "run_started",
            vec![KeyValue::new("run_id", ctx.run_id.clone())],
        )
        .await;

        // Store first: without it every alert would be lost, so an
        // unavailable store aborts before anything is launched.
        let store = Arc::new(DocumentStore::open(&self.config.store.path)?);

        let mut capture = CaptureSupervisor::new(self.config.capture.clone());
        capture.launch_all(&self.config.units, &ctx);
        for _ in 0..capture.session_count() {
            self.metrics.inc_processes_launched();
        }

        let mut detectors = DetectorSupervisor::new();
        detectors.launch_all(&self.config.units, &ctx, &self.config_path);
        for _ in 0..detectors.launched_count() {
            self.metrics.inc_processes_launched();
        }

        // Streaming pipeline: aggregator is the single producer on the
        // bus, the merge service the single consumer.
        let bus = AlertBus::with_capacity(self.config.merge.stream_capacity)?;
        let consumer = bus.share();
        let poll_interval = Duration::from_millis(self.config.merge.poll_interval_ms);
        let shutdown = Arc::new(AtomicBool::new(false));

        let aggregator_task = tokio::spawn(
            Aggregator::new(store.clone() as Arc<dyn AlertStore>, bus, poll_interval)
                .run(Arc::clone(&shutdown)),
        );
        let merge_task = tokio::spawn(
            MergeService::new(consumer).run(Arc::clone(&shutdown), poll_interval),
        );

        self.lifecycle.advance(LifecycleState::Running)?;

        let mut command = Command::new(&self.config.simulation.engine);
        command
            .arg(&self.config.simulation.config)
            .arg(&ctx.output_dir);
        let (mut simulation, tees) =
            match ChildHandle::spawn_teed("simulation", command, &ctx.component_log("simulation"))
            {
                Ok(pair) => pair,
                Err(e) => {
                    // Whole-run fatal, but the monitors launched above
                    // must not outlive the failed run.
                    error!(error = %e, "Simulation engine launch failed; tearing down monitors");
                    shutdown.store(true, Ordering::Release);
                    let _ = aggregator_task.await;
                    let _ = merge_task.await;
                    detectors.shutdown().await;
                    capture.shutdown().await;
                    return Err(e.into());
                }
            };
        self.metrics.inc_processes_launched();

        let simulation_status = {
            let mut health = tokio::time::interval(HEALTH_CHECK_INTERVAL);
            loop {
                tokio::select! {
                    status = simulation.wait() => break status?,
                    _ = health.tick() => {
                        capture.check_health();
                        detectors.check_health();
                    }
                }
            }
        };
        for tee in tees {
            let _ = tee.await;
        }
        if simulation_status.success() {
            info!(run_id = %ctx.run_id, "Simulation engine finished");
        } else {
            // Abnormal exit is reported, never swallowed; the data
            // captured so far is still extracted and exported.
            error!(
                run_id = %ctx.run_id,
                status = %simulation_status,
                "Simulation engine exited abnormally; extracting anyway"
            );
        }

        self.lifecycle.advance(LifecycleState::Extracting)?;
        let snapshot = match store.extract_all() {
            Ok(snapshot) => {
                info!(records = snapshot.len(), "Alert store extracted");
                self.metrics.alerts_extracted.inc_by(snapshot.len() as f64);
                Some(snapshot)
            }
            Err(e) => {
                error!(error = %e, "Extraction failed; continuing to cleanup");
                None
            }
        };

        self.lifecycle.advance(LifecycleState::Exporting)?;
        let export = match &snapshot {
            Some(snapshot) => {
                let timer = self.metrics.export_duration.start_timer();
                let result = export_snapshot(snapshot, &ctx);
                timer.observe_duration();
                match result {
                    Ok(paths) => Some(paths),
                    Err(e) => {
                        error!(error = %e, "Export failed; continuing to cleanup");
                        None
                    }
                }
            }
            None => None,
        };

        self.lifecycle.advance(LifecycleState::Cleanup)?;
        shutdown.store(true, Ordering::Release);
        let aggregator = aggregator_task.await?;
        self.metrics
            .alerts_emitted
            .inc_by(aggregator.total_emitted() as f64);
        let mut merge = merge_task.await?;
        merge.drain();
        if let Some(snapshot) = &snapshot {
            merge.ingest_snapshot(snapshot);
        }
        if let Err(e) = merge.write_view(&ctx.output_dir.join("merged_view.json")) {
            error!(error = %e, "Merged view write failed");
        }

        detectors.shutdown().await;
        capture.shutdown().await;

        let transient_swept = match ctx.sweep_transient() {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Transient artifact sweep failed");
                0
            }
        };

        self.lifecycle.advance(LifecycleState::Terminated)?;
        EventLogger::log_event(
            "run_terminated",
            vec![
                KeyValue::new("run_id", ctx.run_id.clone()),
                KeyValue::new("simulation_success", simulation_status.success()),
            ],
        )
        .await;

        let summary = RunSummary {
            run_id: ctx.run_id,
            simulation_status,
            capture_sessions: capture.session_count(),
            detectors_launched: detectors.launched_count(),
            detector_units: detectors.unit_count(),
            alerts_exported: snapshot.as_ref().map_or(0, |s| s.len()),
            export,
            transient_swept,
        };
        info!(
            run_id = %summary.run_id,
            alerts = summary.alerts_exported,
            swept = summary.transient_swept,
            "Run terminated"
        );
        Ok(summary)
    }
}
