//! # Intake Runtime Library
//!
//! Wires the intake library to concrete storage and a transport. The main
//! entry point is the `main.rs` binary; the library is exposed for tests.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (from env)
//! 2. Validate it
//! 3. Load the roster (JSON file or built-in)
//! 4. Open the ledger file
//! 5. Start the idle-session sweeper
//! 6. Serve the console until EOF or Ctrl+C

pub mod config;
pub mod console;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use mcode_intake::{FileLedger, InMemoryDirectory, IntakeApi, SessionOrchestrator};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

pub use config::{load_config, RuntimeConfig};

/// Orchestrator as wired by the runtime.
pub type Orchestrator = SessionOrchestrator<InMemoryDirectory, FileLedger>;

/// The running intake service.
pub struct IntakeRuntime {
    config: RuntimeConfig,
    orchestrator: Arc<Orchestrator>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
}

impl IntakeRuntime {
    /// Build the runtime: validate config, load the roster, open the ledger.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        config
            .validate()
            .context("Invalid intake configuration")?;

        let directory = match &config.roster_path {
            Some(path) => InMemoryDirectory::from_json_file(path)
                .with_context(|| format!("Failed to load roster {}", path.display()))?,
            None => {
                info!("Using built-in roster");
                InMemoryDirectory::builtin()
            }
        };

        let ledger = FileLedger::open(&config.ledger_path).with_context(|| {
            format!("Failed to open ledger {}", config.ledger_path.display())
        })?;

        let orchestrator = Arc::new(SessionOrchestrator::new(
            config.intake.clone(),
            Arc::new(directory),
            Arc::new(ledger),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            orchestrator,
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn orchestrator(&self) -> Arc<Orchestrator> {
        Arc::clone(&self.orchestrator)
    }

    /// Start background tasks.
    pub fn start(&self) {
        info!("===========================================");
        info!("  MCode Intake Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");
        info!("Ledger: {}", self.config.ledger_path.display());
        info!(
            "Session idle timeout: {:?}, sweep every {:?}",
            self.config.intake.session_idle_timeout, self.config.intake.sweep_interval
        );

        self.spawn_sweeper();
    }

    fn spawn_sweeper(&self) {
        let orchestrator = Arc::clone(&self.orchestrator);
        let mut shutdown = self.shutdown_rx.clone();
        let mut ticker = interval(self.config.intake.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let disposed = orchestrator.dispose_idle(Instant::now());
                        if disposed > 0 {
                            debug!("[sweeper] Disposed {} idle session(s)", disposed);
                        }
                    }
                    _ = shutdown.changed() => {
                        info!("[sweeper] Shutdown signal received");
                        break;
                    }
                }
            }
        });
    }

    /// Serve console lines from `input`, writing replies to `output`, until
    /// EOF or shutdown.
    pub async fn serve_console<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut shutdown = self.shutdown_rx.clone();

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line.context("Failed to read console input")?,
                _ = shutdown.changed() => {
                    info!("[console] Shutdown signal received");
                    break;
                }
            };
            let Some(line) = line else {
                info!("[console] Input closed");
                break;
            };

            let received_at = Utc::now().with_timezone(&self.config.intake.record_offset);
            let envelope = match console::parse_line(&line, received_at) {
                Ok(Some(envelope)) => envelope,
                Ok(None) => continue,
                Err(e) => {
                    warn!("[console] {}", e);
                    output.write_all(format!("! {}\n", e).as_bytes()).await?;
                    continue;
                }
            };

            let conversant_id = envelope.conversant_id.clone();
            for effect in self.orchestrator.route(envelope).await {
                let rendered = console::render(&conversant_id, &effect);
                output.write_all(rendered.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
            output.flush().await?;
        }

        Ok(())
    }

    /// Signal every task to stop.
    pub fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
    }
}
