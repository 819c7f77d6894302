//! API route definitions

mod forecasts;
mod health;
mod scopes;

use axum::{http::StatusCode, response::IntoResponse, Json, Router};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(forecasts::routes())
        .merge(scopes::routes())
        .merge(health::routes())
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn bad_request(error: impl Into<String>) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// `?home=EDM&away=VAN`
#[derive(Debug, Deserialize)]
pub struct MatchupQuery {
    pub home: String,
    pub away: String,
}

impl MatchupQuery {
    pub fn matchup(&self) -> Result<edge_core::Matchup, String> {
        let matchup = edge_core::Matchup::new(
            self.home.trim().to_uppercase(),
            self.away.trim().to_uppercase(),
        );
        if matchup.is_valid() {
            Ok(matchup)
        } else {
            Err(format!(
                "invalid matchup: home '{}' and away '{}' must be two different teams",
                matchup.home, matchup.away
            ))
        }
    }
}
