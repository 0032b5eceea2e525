//! Chat Gateway
//!
//! Sits in front of the chat service and decides, per request, whether it
//! may proceed.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────┐
//!                         │                 CHAT GATEWAY                  │
//!   Client Request        │  ┌──────────┐   ┌──────────┐   ┌───────────┐ │
//!   ──────────────────────┼─▶│ request  │──▶│ identity │──▶│ pipeline  │ │
//!                         │  │ id/trace │   │ headers  │   │           │ │
//!                         │  └──────────┘   └──────────┘   └─────┬─────┘ │
//!                         │        logger → time gate → rate gate → role │
//!                         │                                      │       │
//!   403 (rejected)        │                                      ▼       │
//!   ◀─────────────────────┼──────────────────────────────  ┌───────────┐ │     Chat
//!   Upstream response     │                                │  forward  │─┼───▶ Service
//!   ◀─────────────────────┼────────────────────────────────│  handler  │ │
//!                         │                                └───────────┘ │
//!                         └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use chat_gateway::admin::setup_admin_router;
use chat_gateway::config::{load_config, GatewayConfig};
use chat_gateway::observability::{logging, metrics};
use chat_gateway::{GatewayServer, Shutdown};

#[derive(Parser)]
#[command(name = "chat-gateway")]
#[command(about = "Policy-enforcing gateway for the chat service", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!("chat-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        max_events = config.rate_limit.max_events,
        time_window_secs = config.rate_limit.time_window_secs,
        access_hours = %format!("{}-{}", config.access_hours.start_hour, config.access_hours.end_hour),
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

    let shutdown = Shutdown::new();
    shutdown.on_ctrl_c();

    let server = GatewayServer::new(config.clone())?;

    if config.admin.enabled {
        let admin = setup_admin_router(server.state(), &config.admin.api_key);
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let mut admin_shutdown = shutdown.subscribe();
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");
        tokio::spawn(async move {
            let served = axum::serve(listener, admin)
                .with_graceful_shutdown(async move {
                    let _ = admin_shutdown.recv().await;
                })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
