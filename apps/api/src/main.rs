mod backends;
mod config;
mod db;
mod errors;
mod facades;
mod gateway;
mod llm_client;
mod models;
mod review;
mod routes;
mod state;
mod store;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::facades::Platform;
use crate::gateway::GatewaySlot;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{Context, Store};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Review API v{}", env!("CARGO_PKG_VERSION"));

    // The gateway slot starts empty; backends are connected in the background
    // and the readiness poller notices when the handle lands.
    let slot = GatewaySlot::empty();
    let ctx = Context::new(Store::new(), Arc::new(slot.clone()));
    let platform = Platform::new(ctx, config.readiness);

    tokio::spawn(backends::connect_into(config.clone(), slot));

    if let Some(readiness) = platform.init() {
        tokio::spawn(async move {
            match readiness.await {
                Ok(Ok(())) => info!("Platform ready"),
                Ok(Err(e)) => warn!("{e}"),
                Err(e) => warn!("Readiness poller stopped: {e}"),
            }
        });
    }

    // Build router
    let app = build_router(AppState::new(platform))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
