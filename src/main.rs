//! ReferGrow edge gateway.
//!
//! ```text
//!     Client Request           ┌──────────────────────────────────────────────┐
//!     ─────────────────────────┼─▶ request id → trace → timeout               │
//!                              │        │                                     │
//!                              │        ▼                                     │
//!                              │   /api/* ? ──no──▶ 404 (not ours)            │
//!                              │        │ yes                                 │
//!                              │        ▼                                     │
//!                              │   admission (auth 20/60s, api 120/60s)       │
//!                              │        │ admit          reject ──▶ 429       │
//!                              │        ▼                                     │
//!                              │   rewrite + forward ──────────────────────┼──▶ Upstream API
//!     Client Response          │        │                                     │
//!     ◀────────────────────────┼── strip hop-by-hop, split set-cookie ◀──────┼───
//!                              └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use refergrow_gateway::lifecycle::{resolve_config, signals, Overrides, Shutdown};
use refergrow_gateway::observability::{logging, metrics};
use refergrow_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "refergrow-gateway")]
#[command(about = "Rate limiting reverse proxy in front of the ReferGrow API", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener address, overrides config and environment.
    #[arg(short, long)]
    bind: Option<String>,

    /// Upstream origin, overrides config and environment.
    #[arg(short, long)]
    upstream: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = Overrides {
        config_path: cli.config,
        bind_address: cli.bind,
        upstream_base_url: cli.upstream,
    };
    let config = resolve_config(&overrides, |key| std::env::var(key).ok())?;

    logging::init(&config.observability);

    tracing::info!("refergrow-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.normalized_base(),
        rate_limit_enabled = config.rate_limit.enabled,
        auth_max = config.rate_limit.auth_max,
        api_max = config.rate_limit.api_max,
        window_ms = config.rate_limit.window_ms,
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
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
