//! Health check endpoints

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;

use edge_services::{CacheStats, RateLimiterStats};

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    /// Seconds left in a feed quota lockout
    #[serde(skip_serializing_if = "Option::is_none")]
    lockout_remaining_secs: Option<u64>,
    caches: Vec<CacheStats>,
    rate_limiter: RateLimiterStats,
}

/// Health check handler
///
/// Reports degraded while the feed is in quota lockout; forecasts are then
/// served from stale cache.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let lockout = state.engine.lockout_remaining();

    let (status, code) = match lockout {
        None => ("healthy", StatusCode::OK),
        Some(_) => ("degraded", StatusCode::SERVICE_UNAVAILABLE),
    };

    let response = HealthResponse {
        status: status.to_string(),
        lockout_remaining_secs: lockout.map(|d| d.as_secs()),
        caches: state.engine.cache_stats(),
        rate_limiter: state.engine.limiter_stats(),
    };

    (code, Json(response))
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use edge_feeds::StaticFeed;
    use edge_services::{EngineConfig, ForecastEngine};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_caches_and_limiter() {
        let config = EngineConfig {
            min_request_interval: std::time::Duration::ZERO,
            ..EngineConfig::default()
        };
        let engine = Arc::new(ForecastEngine::new(
            Arc::new(StaticFeed::new("static")),
            &config,
        ));
        engine.scope_status("EDM").await;

        let app = crate::app(AppState { engine });
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["rate_limiter"]["name"], "static");
        assert!(json["rate_limiter"]["total_requests"].as_u64().unwrap() > 0);
        assert!(json["caches"].as_array().unwrap().len() >= 6);
    }
}
