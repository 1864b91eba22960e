//! Vigil Server - Standalone headless host for the Vigil playback supervisor.
//!
//! Runs one supervised execution context against the in-memory host. Host
//! actions and simulation directives are read from stdin, one per line, and
//! relay events for the application layer are written to stdout as JSON.

mod config;
mod console;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast;
use vigil_core::{
    BroadcastEvent, BroadcastEventBridge, ContextManager, HostServices, IndicatorId,
    LoggingEventEmitter, MemoryHost,
};

use crate::config::ServerConfig;
use crate::console::Console;

/// Vigil Server - Headless playback service supervisor.
#[derive(Parser, Debug)]
#[command(name = "vigil-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "VIGIL_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Tick interval in milliseconds (overrides config file).
    #[arg(short = 'i', long)]
    tick_interval_ms: Option<u64>,

    /// Start the first context with playback active instead of silently.
    #[arg(long)]
    playing: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Vigil Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(interval) = args.tick_interval_ms {
        config.tick_interval_ms = interval;
    }
    if args.playing {
        config.start_playing = true;
    }

    log::info!(
        "Configuration: service={}, tick_interval_ms={}, start_playing={}",
        config.service_name,
        config.tick_interval_ms,
        config.start_playing
    );

    let core_config = config.to_core_config();
    let host = Arc::new(MemoryHost::new());
    let bridge = BroadcastEventBridge::new(core_config.event_capacity);
    bridge.set_external_emitter(Arc::new(LoggingEventEmitter));
    let relay_rx = bridge.subscribe();

    let manager = ContextManager::new(
        HostServices::from_host(host.clone()),
        host.clone(),
        Arc::new(bridge),
        core_config,
    )
    .context("Failed to build context manager")?;
    let launch_requests = host
        .take_launch_requests()
        .context("Launch requests already taken")?;
    manager.clone().start_launcher(launch_requests);

    let relay_handle = tokio::spawn(write_relay_events(relay_rx, tokio::io::stdout()));

    let first = if config.start_playing {
        manager.launch(true)
    } else {
        manager.boot()
    }
    .context("Failed to start execution context")?;
    log::info!("Started {}", first);

    let console = Console::new(manager.clone(), host, IndicatorId(config.indicator_id));
    let stdin = BufReader::new(tokio::io::stdin());

    tokio::select! {
        result = console.run(stdin) => result.context("Failed to read stdin")?,
        _ = shutdown_signal() => log::info!("Shutdown signal received, cleaning up..."),
    }

    // Graceful shutdown
    manager.shutdown().await;
    relay_handle.abort();

    log::info!("Shutdown complete");
    Ok(())
}

/// Writes relay events to `out` as JSON lines until the channel closes or
/// the output fails.
async fn write_relay_events<W: AsyncWrite + Unpin>(
    mut rx: broadcast::Receiver<BroadcastEvent>,
    mut out: W,
) {
    loop {
        let event = match rx.recv().await {
            Ok(event @ BroadcastEvent::Relay(_)) => event,
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                log::warn!("Relay writer lagged, {} events dropped", missed);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                log::error!("Failed to serialize relay event: {}", e);
                continue;
            }
        };
        if let Err(e) = write_line(&mut out, &line).await {
            log::error!("Failed to write relay event: {}", e);
            break;
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, line: &str) -> std::io::Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
