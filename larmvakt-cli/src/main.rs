//! ## larmvakt-cli
//! **Unified operational interface**
//! Larmvakt main entrypoint: orchestrates a full monitored simulation
//! run, or validates a configuration file without launching anything.

use clap::Parser;
use larmvakt_telemetry::logging::EventLogger;

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    EventLogger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(run_args) => commands::run_orchestration(run_args).await,
        Commands::Validate(validate_args) => commands::validate_config(validate_args),
    }
}
