//! Virtual stream server.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────┐
//!                    │                VIRTUAL STREAM                  │
//!   Range request    │  ┌────────┐   ┌───────────┐   ┌─────────────┐ │
//!   ─────────────────┼─▶│  http  │──▶│  stream   │──▶│ correlation │ │
//!                    │  │ server │   │ responder │   │    table    │ │
//!                    │  └────────┘   └─────┬─────┘   └──────▲──────┘ │
//!                    │                     │ REQUEST_DATA   │ fulfill│
//!                    │                     ▼                │        │
//!   206 / 500        │               ┌───────────┐          │        │
//!   ◀────────────────┼───────────────│   peer    │──────────┘        │
//!                    │               │  socket   │◀──────────────────┼──── Controlling
//!                    │               └───────────┘   WebSocket       │     client
//!                    └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use virtual_stream::config::{load_config, StreamConfig};
use virtual_stream::lifecycle::{spawn_signal_listener, Shutdown};
use virtual_stream::observability::{logging, metrics};
use virtual_stream::HttpServer;

#[derive(Parser)]
#[command(name = "virtual-stream")]
#[command(about = "Serve HTTP range requests from a connected peer", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => StreamConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(config.observability.log_format)?;

    tracing::info!("virtual-stream v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_chunk_bytes = config.stream.max_chunk_bytes,
        exchange_timeout_ms = config.stream.exchange_timeout_ms,
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config, shutdown);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
