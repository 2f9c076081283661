//! Inter-Service Gateway
//!
//! The gateway in front of the travel-booking backend fleet, built with
//! Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                   GATEWAY                     │
//!                        │                                               │
//!   POST /proxy          │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!   ─────────────────────┼─▶│  http   │───▶│  proxy   │───▶│ backend │──┼──▶ Backend
//!                        │  │ server  │    │forwarder │    │  call   │  │    Service
//!                        │  └─────────┘    └────┬─────┘    └────┬────┘  │
//!                        │                      │               │       │
//!                        │               resolve│        outcome│       │
//!                        │                      ▼               ▼       │
//!                        │               ┌──────────┐    ┌───────────┐  │
//!   GET /registry        │               │ registry │    │ error_log │  │
//!   GET /errors          │               └────▲─────┘    └─────▲─────┘  │
//!                        │                    │enumerate       │probe   │
//!                        │                    │                │failures│
//!                        │               ┌────┴────────────────┴─────┐  │
//!   GET /health          │               │       health monitor      │──┼──▶ GET /health
//!                        │               │   (periodic, concurrent)  │  │    probes
//!                        │               └───────────────────────────┘  │
//!                        │                                               │
//!                        │  Cross-cutting: config, observability,        │
//!                        │  lifecycle (startup/shutdown)                 │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::Path;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use service_gateway::config::loader::load_config;
use service_gateway::config::GatewayConfig;
use service_gateway::http::HttpServer;
use service_gateway::lifecycle::{signals, Shutdown};
use service_gateway::observability::metrics;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "service_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("service-gateway v0.1.0 starting");

    // Load configuration; default fleet when no file is given
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => {
            let mut config = GatewayConfig::default();
            config.services = GatewayConfig::default_services();
            config
        }
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        health_interval_secs = config.health_check.interval_secs,
        proxy_timeout_secs = config.proxy.timeout_secs,
        "Configuration loaded"
    );

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    // Initialize metrics exporter
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Translate OS signals into the shared shutdown trigger
    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    // Create and run HTTP server
    let server = HttpServer::new(config);
    server.run(listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
