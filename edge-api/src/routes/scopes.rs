//! Availability audit and matchup outlook endpoints

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::info;

use super::{bad_request, MatchupQuery};
use crate::AppState;

/// Create scope routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/scopes/{team}/status", get(scope_status))
        .route("/outlook", get(team_outlook))
}

/// Reconciliation verdicts and impact for one team
async fn scope_status(
    State(state): State<AppState>,
    Path(team): Path<String>,
) -> impl IntoResponse {
    let team = team.to_uppercase();
    info!("Getting availability status for {}", team);
    Json(state.engine.scope_status(&team).await).into_response()
}

/// Win probabilities for a matchup
async fn team_outlook(
    State(state): State<AppState>,
    Query(params): Query<MatchupQuery>,
) -> impl IntoResponse {
    let matchup = match params.matchup() {
        Ok(matchup) => matchup,
        Err(e) => return bad_request(e),
    };
    info!("Getting outlook for {} @ {}", matchup.away, matchup.home);
    Json(state.engine.team_outlook(&matchup).await).into_response()
}
