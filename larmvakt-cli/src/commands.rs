use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use larmvakt_config::{LarmvaktConfig, LogCategory, MonitoringUnit};
use larmvakt_engine::OrchestratorRuntime;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "larmvakt", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Orchestrate a full monitored simulation run
    Run(RunArgs),
    /// Check a configuration file and print the resulting unit layout
    Validate(ValidateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to the larmvakt configuration file
    #[arg(short, long)]
    pub config: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Path to the larmvakt configuration file
    #[arg(short, long)]
    pub config: PathBuf,
}

pub async fn run_orchestration(
    args: RunArgs,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = LarmvaktConfig::load_from_path(&args.config)?;
    let runtime = OrchestratorRuntime::new(config, args.config);
    let summary = runtime.run().await?;

    // An abnormal simulation exit is part of a completed run: the data
    // was still extracted and exported, so the process exits cleanly.
    if summary.simulation_status.success() {
        info!(
            run_id = %summary.run_id,
            alerts = summary.alerts_exported,
            "Run completed"
        );
    } else {
        error!(
            run_id = %summary.run_id,
            status = %summary.simulation_status,
            alerts = summary.alerts_exported,
            "Run completed with abnormal simulation exit"
        );
    }
    Ok(())
}

pub fn validate_config(
    args: ValidateArgs,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = LarmvaktConfig::load_from_path(&args.config)?;
    println!("{}", describe(&config));
    Ok(())
}

/// Human-readable layout summary: units grouped by log category, plus
/// the distinct interfaces a run would capture on.
fn describe(config: &LarmvaktConfig) -> String {
    let mut groups: BTreeMap<LogCategory, Vec<&MonitoringUnit>> = BTreeMap::new();
    for unit in &config.units {
        groups.entry(unit.log_category).or_default().push(unit);
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} unit(s), {} capture interface(s)",
        config.units.len(),
        config.distinct_interfaces().len()
    );
    for (category, units) in &groups {
        let _ = writeln!(out, "[{category}]");
        for unit in units {
            let _ = writeln!(
                out,
                "  {} on {} -> {}",
                unit.detector_id,
                unit.interface,
                unit.log_file_name()
            );
        }
    }
    for interface in config.distinct_interfaces() {
        let _ = writeln!(out, "capture: {interface}");
    }
    out
}
