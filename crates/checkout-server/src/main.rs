//! stripe-checkout HTTP Server
//!
//! Axum-based server that turns a checkout submission (card token, email,
//! plan) into a Stripe customer subscribed to that plan.

mod config;
mod error;
mod handlers;
mod routes;
mod state;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Cli, ServerConfig};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before parsing, so .env can supply flags
    dotenvy::dotenv().ok();

    // Exits here on --version / --help
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.dev { "debug,tower_http=debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_cli(cli)?;
    let addr = config.addr;
    let static_dir = config.static_dir.clone();

    if config.keys.is_multi_tenant() {
        tracing::info!("✓ Multi-tenant mode: {} Stripe accounts", config.keys.len());
    } else {
        tracing::info!("✓ Single-key mode");
    }
    if config.dev {
        tracing::warn!("⚠ Development mode - CORS is open to any origin");
    }
    tracing::info!("  Stripe API: {}", config.stripe.base_url);

    let state = AppState::from_config(config)?;
    let app = routes::router(state, &static_dir);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 checkout server listening on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /  - Checkout page ({})", static_dir.display());
    tracing::info!("  POST /  - Submit checkout");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
