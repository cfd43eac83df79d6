//! Round-robin HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌───────────────────────────────────────────────┐
//!                          │               ROUNDROBIN-PROXY                │
//!                          │                                               │
//!     Client Request       │  ┌──────────┐    ┌────────────┐               │
//!     ─────────────────────┼─▶│  http    │───▶│ dispatcher │               │
//!                          │  │  server  │    │ (cursor)   │               │
//!                          │  └──────────┘    └─────┬──────┘               │
//!                          │                        │ select_next          │
//!                          │                        ▼                      │
//!     Client Response      │                  ┌────────────┐               │
//!     ◀────────────────────┼──────────────────│  backend   │◀──────────────┼──── Upstream
//!                          │                  │  forward   │               │
//!                          │                  └─────▲──────┘               │
//!                          │                        │ liveness             │
//!                          │                  ┌─────┴──────┐               │
//!                          │                  │   health   │ (optional)    │
//!                          │                  └────────────┘               │
//!                          └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use roundrobin_proxy::lifecycle::{signals, startup, Overrides, Shutdown};
use roundrobin_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "roundrobin-proxy", version)]
#[command(about = "Round-robin HTTP load balancer", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening port (overrides the configuration file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Backend URL; repeat to build the pool in order (replaces configured backends)
    #[arg(short, long = "backend", value_name = "URL")]
    backends: Vec<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl From<Cli> for Overrides {
    fn from(cli: Cli) -> Self {
        Self {
            config_path: cli.config,
            port: cli.port,
            backends: cli.backends,
            json_logs: cli.json_logs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let overrides = Overrides::from(Cli::parse());
    let config = startup::resolve_config(&overrides)?;

    logging::init(&config.observability)?;
    tracing::info!("roundrobin-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    if let Err(e) = startup::run(config, &shutdown).await {
        tracing::error!(error = %e, "Proxy failed");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
