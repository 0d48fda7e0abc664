//! Daemon entry point: CLI parsing, logging setup, and the run loop.

use anyhow::{Context, Result};
use clap::Parser;
use frankengamepad::{config, sink, watch};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Merge physical input devices into synthesized virtual gamepads.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML config file
    /// (defaults to ~/.config/frankengamepad/default.yaml)
    config_file: Option<PathBuf>,

    /// Also write debug-level logs to this file
    #[arg(long)]
    logfile: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.logfile.as_deref())?;

    let config_path = match args.config_file {
        Some(path) => path,
        None => config::default_config_file()?,
    };
    info!("loading config from {}", config_path.display());
    let config = config::load(&config_path)?;

    let sinks = sink::build_sinks(&config.sinks)?;

    let shutdown = CancellationToken::new();
    let supervisor = watch::Supervisor::spawn(&config, sinks, shutdown.clone());
    if supervisor.is_empty() {
        info!("no sources configured; nothing to translate");
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");
    shutdown.cancel();
    supervisor.join().await;

    Ok(())
}

fn init_logging(logfile: Option<&Path>) -> Result<()> {
    let stderr_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match logfile {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to open logfile {}", path.display()))?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_filter(stderr_filter),
                )
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Arc::new(file))
                        .with_filter(EnvFilter::new("debug")),
                )
                .init();
            info!("writing log to {}", path.display());
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(stderr_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
