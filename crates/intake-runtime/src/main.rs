//! # MCode Intake Runtime
//!
//! Entry point for the guided video intake service.
//!
//! Logs go to stderr (filter with `RUST_LOG`, default `info`); the console
//! transport owns stdin and stdout.

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use intake_runtime::{load_config, IntakeRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    // Load configuration
    let config = load_config();

    // Create and start the runtime
    let runtime = IntakeRuntime::new(config)?;
    runtime.start();

    info!("Intake is running. Type '<conversant> /start' to begin, Ctrl+C to stop.");
    tokio::select! {
        served = runtime.serve_console(BufReader::new(tokio::io::stdin()), tokio::io::stdout()) => {
            served?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
        }
    }

    // Graceful shutdown
    runtime.shutdown();
    info!("Shutdown complete");

    Ok(())
}
