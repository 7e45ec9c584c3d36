//! prpl-server
//!
//! Serves a multi-build web application following the PRPL pattern.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ http::dispatch
//!                                         │ capabilities (User-Agent → CapabilitySet)
//!                                         │ builds       (first satisfied build)
//!                                         │ routing      (app route → entrypoint)
//!                                         │ storage      (open under site root)
//!                                         │ push         (Link: rel=preload)
//!                                         ▼
//!     Client Response ◀───────────── http::content
//!
//!     Cross-cutting: config (+ watcher), lifecycle, observability
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use prpl_server::config::{load_config, BuildConfig, ServerConfig};
use prpl_server::config::watcher::ConfigWatcher;
use prpl_server::http::HttpServer;
use prpl_server::lifecycle::{build_dispatcher, wait_for_shutdown_signal, Shutdown};
use prpl_server::observability::{logging, metrics};

#[derive(Parser, Debug, Clone)]
#[command(name = "prpl-server", version, about = "Serve the right build of a web app to each browser")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to serve (overrides site.root)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Address to listen on (overrides listener.bind_address)
    #[arg(short, long)]
    bind: Option<String>,

    /// Reload the config file when it changes
    #[arg(long)]
    watch: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut ServerConfig) {
        if let Some(root) = &self.root {
            config.site.root = root.clone();
        }
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if self.watch {
            config.site.watch = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig {
            builds: vec![BuildConfig::fallback("/index.html")],
            ..ServerConfig::default()
        },
    };
    cli.apply_overrides(&mut config);

    logging::init_logging(&config.observability);
    tracing::info!("prpl-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        root = ?config.site.root,
        builds = config.builds.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let dispatcher = build_dispatcher(&config)?;

    // Relay reloads through the CLI overrides so flags keep winning.
    let (updates_tx, config_updates) = mpsc::unbounded_channel();
    let _watcher = match (&cli.config, config.site.watch) {
        (Some(path), true) => {
            let (watcher, mut raw_updates) = ConfigWatcher::new(path);
            let watcher = watcher.run()?;
            let overrides = cli.clone();
            tokio::spawn(async move {
                while let Some(mut next) = raw_updates.recv().await {
                    overrides.apply_overrides(&mut next);
                    if updates_tx.send(next).is_err() {
                        break;
                    }
                }
            });
            Some(watcher)
        }
        (None, true) => {
            tracing::warn!("Watch requested without a config file; reload disabled");
            None
        }
        _ => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        match wait_for_shutdown_signal().await {
            Ok(signal) => {
                tracing::info!(signal, "Termination signal received");
                shutdown.trigger();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for signals");
                // Keep the sender alive; a closed channel would stop the server.
                std::future::pending::<()>().await;
            }
        }
    });

    let server = HttpServer::new(config, dispatcher);
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
