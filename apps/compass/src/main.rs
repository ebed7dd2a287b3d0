mod analysis_client;
mod config;
mod errors;
mod insights;
mod models;
mod report;
mod routes;
mod state;
mod workflow;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis_client::HttpAnalysisClient;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::workflow::session::{SessionStore, SWEEP_INTERVAL};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Career Compass v{}", env!("CARGO_PKG_VERSION"));

    let analysis = HttpAnalysisClient::new(
        config.analysis_service_url.clone(),
        config.analysis_timeout_secs,
    )
    .context("Failed to build analysis HTTP client")?;
    info!(
        "Analysis client initialized ({}, timeout {}s)",
        analysis.base_url(),
        config.analysis_timeout_secs
    );

    let cors = build_cors(&config.allowed_origins)?;

    let sessions = SessionStore::new();
    let _sweeper =
        sessions.spawn_sweeper(Duration::from_secs(config.session_ttl_secs), SWEEP_INTERVAL);
    info!("Idle sessions expire after {}s", config.session_ttl_secs);

    let state = AppState {
        config: config.clone(),
        sessions,
        analysis: Arc::new(analysis),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// CORS restricted to the configured front-end origins.
fn build_cors(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("Invalid origin in ALLOWED_ORIGINS: {o}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any))
}
