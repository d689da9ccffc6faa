//! Payments load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──TCP──▶ net::listener ──▶ http::server ──▶ http::framing
//!                                                            │
//!                                                            ▼
//!                                                     routing::router
//!                                                            │
//!                                  ┌─────────────────────────┴──────────┐
//!                                  ▼                                    ▼
//!                        load_balancer::pool                   400 / 404 reply
//!                        (round-robin cursor)
//!                                  │
//!                 ┌────────────────┴──────────────────┐
//!                 ▼                                   ▼
//!     fire-and-forget forward               forward + wait for response
//!     (immediate 200 to client)             (relay bytes, or 502)
//!                 │                                   │
//!                 └────────── forward::forwarder ─────┘
//!                                  │
//!                       Unix socket / TCP backend
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use payments_balancer::config::{resolve_config, ConfigOverrides};
use payments_balancer::lifecycle::signals::spawn_signal_handler;
use payments_balancer::net::Listener;
use payments_balancer::observability::{logging, metrics};
use payments_balancer::{ProxyServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "payments-balancer")]
#[command(about = "Round-robin HTTP load balancer for payment backends", long_about = None)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080
    #[arg(short, long, env = "LISTEN_ADDR")]
    bind: Option<String>,

    /// Comma-separated backend addresses (socket paths or tcp://host:port)
    #[arg(long, env = "EXTERNAL_HOSTS", value_delimiter = ',')]
    backends: Option<Vec<String>>,

    /// Log level when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind_address: self.bind.clone(),
            backends: self.backends.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match resolve_config(cli.config.as_deref(), &cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(cli.log_level.as_deref().unwrap_or("info"));
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "payments-balancer starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backends = ?config.backends,
        max_connections = config.listener.max_connections,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let server = ProxyServer::new(&config)?;
    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_handler(Arc::clone(&shutdown));

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
