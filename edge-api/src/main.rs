//! Prop Edge API Server
//!
//! HTTP API exposing forecasts, bet verdicts and availability audit data.

mod routes;

use anyhow::Context;
use axum::{
    http::{header, Method},
    Router,
};
use edge_feeds::{DataFeed, HttpFeed, StaticFeed};
use edge_services::{EngineConfig, ForecastEngine};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ForecastEngine>,
}

/// Build the feed from configuration: a local snapshot wins over the live API
fn build_feed(config: &EngineConfig) -> anyhow::Result<Arc<dyn DataFeed>> {
    if let Some(path) = &config.snapshot_path {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path))?;
        let feed = StaticFeed::from_snapshot_json("snapshot", &json)?;
        info!("Serving data from snapshot {}", path);
        return Ok(Arc::new(feed));
    }

    let url = config
        .feed_url
        .as_deref()
        .context("Set EDGE_FEED_URL or EDGE_SNAPSHOT_PATH")?;
    let feed = HttpFeed::new(url, config.feed_api_key.clone())?;
    info!("Using stats feed at {}", url);
    Ok(Arc::new(feed))
}

/// Assemble the router for a given state
pub fn app(state: AppState) -> Router {
    // Configure CORS for frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,edge_api=debug,edge_services=debug")),
        )
        .init();

    info!("Starting Prop Edge API");

    let config = EngineConfig::from_env();
    info!(
        "Call timeout {:?}, lockout {:?}, fetch batch {}, uncertain as unavailable: {}",
        config.call_timeout,
        config.lockout,
        config.fetch_batch,
        config.policy.uncertain_as_unavailable
    );

    let feed = build_feed(&config)?;
    let engine = Arc::new(ForecastEngine::new(feed, &config));
    let app = app(AppState { engine });

    let addr: SocketAddr = std::env::var("EDGE_API_ADDR")
        .ok()
        .and_then(|a| a.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3001)));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
