//! # Tillpoint Terminal
//!
//! Keyboard-wedge point-of-sale terminal for one store.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Terminal Process                               │
//! │                                                                         │
//! │  stdin ──► parse_input ──► Scan ──► WedgeInput ──► ScanEventFilter     │
//! │                │                                        │               │
//! │                ▼                                        ▼               │
//! │            Command ──► Terminal          ResolvingListener ──► stdout   │
//! │                            │                        │                   │
//! │                            ▼                        ▼                   │
//! │                      InventoryCache ◄── refresher ── REST API           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Logging goes to stderr (`RUST_LOG` filters it); answers go to stdout.

mod cli;
mod config;
mod error;
mod session;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tillpoint_inventory::{HttpInventoryApi, InventoryCache};
use tillpoint_scanner::{
    CameraDevice, RenderSurface, ScanEventFilter, ScanFeedback, SilentFeedback, TerminalBell,
    WedgeInput,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::TerminalConfig;
use crate::session::{parse_input, render_outcome, render_resolution, Command, Input, ResolvingListener, Terminal};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Terminal stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let mut config = TerminalConfig::load(cli.config.clone())?;
    if let Some(store) = cli.store {
        config.store.id = store;
    }
    if cli.no_beep {
        config.scanner.beep = false;
    }
    config.validate()?;

    if cli.write_config {
        config.save(cli.config)?;
        return Ok(());
    }

    let store_id = config.store_id().to_string();
    info!(
        store_id = %store_id,
        api = %config.api.base_url,
        ttl_secs = config.cache.ttl_secs,
        "Configuration loaded"
    );

    // Inventory cache
    let api = HttpInventoryApi::new(config.api.clone())?;
    let cache = Arc::new(InventoryCache::new(Arc::new(api), config.cache.clone()));
    println!("{}", render_outcome(&cache.refresh(&store_id, false).await));
    let refresher = cache.spawn_refresher(store_id.clone());

    // Scanner
    let (tx, mut resolutions) = mpsc::unbounded_channel();
    let input = WedgeInput::new();
    let feedback: Arc<dyn ScanFeedback> = if config.scanner.beep {
        Arc::new(TerminalBell)
    } else {
        Arc::new(SilentFeedback)
    };
    let scanner = Arc::new(ScanEventFilter::with_parts(
        Arc::new(input.decoder()),
        config.scanner.clone(),
        Arc::new(ResolvingListener::new(cache.clone(), tx)),
        feedback,
        CameraDevice::new(),
    ));
    scanner.mount_surface(RenderSurface::new("stdin"));
    scanner.start_scanning().await?;
    if let Some(err) = scanner.error() {
        warn!(error = %err, "Scanner did not start");
    }

    let terminal = Terminal::new(cache.clone(), scanner.clone(), store_id);
    println!("Ready. Scan a barcode or type :help");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed");
                    break;
                };
                match parse_input(&line) {
                    Input::Empty => {}
                    Input::Scan(code) => {
                        if !input.push(code) {
                            println!("Scanner is not running (:status for details)");
                        }
                    }
                    Input::Command(Command::Quit) => break,
                    Input::Command(command) => println!("{}", terminal.run(command).await),
                    Input::Invalid(message) => println!("{}", message),
                }
            }
            Some(resolution) = resolutions.recv() => {
                println!("{}", render_resolution(&resolution));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    // Shutdown
    scanner.stop_scanning();
    refresher.abort();
    cache.clear();
    info!("Terminal shut down");
    Ok(())
}
