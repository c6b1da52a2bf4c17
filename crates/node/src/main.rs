// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock node daemon (lockd)
//!
//! Holds an in-memory lock table and answers lock calls over TCP. Nothing is
//! persisted: a restarted node comes back empty.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::PathBuf;

use clap::Parser;
use dsync_node::lifecycle::{self, LifecycleError, NodeConfig, DEFAULT_LISTEN};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "lockd", version, about = "dsync lock node")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = DEFAULT_LISTEN, conflicts_with = "port")]
    listen: String,

    /// Listen on all interfaces at this port
    #[arg(short, long)]
    port: Option<u16>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> NodeConfig {
        let listen = match self.port {
            Some(port) => format!("0.0.0.0:{}", port),
            None => self.listen,
        };
        NodeConfig {
            listen,
            log_path: self.log_file,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Args::parse().into_config();

    let _log_guard = setup_logging(&config)?;

    info!("Starting lockd on {}", config.listen);

    let state = match lifecycle::startup(&config).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to start node: {}", e);
            return Err(e.into());
        }
    };
    let local_addr = state.local_addr()?;

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("Node ready, listening on {}", local_addr);

    // Signal ready for parent process (tests, supervisors)
    println!("READY {}", local_addr);

    state
        .run(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
            }
        })
        .await;

    info!("lockd stopped");
    Ok(())
}

/// Log to stderr, or through a non-blocking file writer when `--log-file` is set
fn setup_logging(
    config: &NodeConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_path) = &config.log_path else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    let dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = log_path
        .file_name()
        .ok_or_else(|| LifecycleError::InvalidLogPath(log_path.clone()))?;
    std::fs::create_dir_all(&dir)?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(Some(guard))
}
