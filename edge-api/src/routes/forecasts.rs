//! Forecast and verdict endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use edge_core::{BetVerdict, Forecast, MarketQuote, OutcomeType};
use edge_services::same_line;

use super::{bad_request, MatchupQuery};
use crate::AppState;

/// Response for listing forecasts
#[derive(Debug, Serialize)]
pub struct ForecastsResponse {
    pub outcome: OutcomeType,
    pub forecasts: Vec<Forecast>,
    pub count: usize,
}

/// Response for a slate of verdicts
#[derive(Debug, Serialize)]
pub struct SlateResponse {
    pub outcome: OutcomeType,
    pub verdicts: Vec<BetVerdict>,
    pub count: usize,
}

/// Body for evaluating a single forecast
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub forecast: Forecast,
    #[serde(default)]
    pub quote: Option<MarketQuote>,
}

/// Create forecast routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/forecasts/{outcome}", get(list_forecasts))
        .route("/slate/{outcome}", get(evaluate_slate))
        .route("/verdicts", post(evaluate))
}

/// Forecasts for one outcome type in a matchup
async fn list_forecasts(
    State(state): State<AppState>,
    Path(outcome): Path<String>,
    Query(params): Query<MatchupQuery>,
) -> impl IntoResponse {
    let outcome: OutcomeType = match outcome.parse() {
        Ok(outcome) => outcome,
        Err(e) => return bad_request(e),
    };
    let matchup = match params.matchup() {
        Ok(matchup) => matchup,
        Err(e) => return bad_request(e),
    };
    info!("Forecasting {} for {} @ {}", outcome, matchup.away, matchup.home);

    let forecasts = state.engine.forecasts(outcome, &matchup).await;
    let count = forecasts.len();
    (
        StatusCode::OK,
        Json(ForecastsResponse {
            outcome,
            forecasts,
            count,
        }),
    )
        .into_response()
}

/// Forecasts joined with quoted lines and classified
async fn evaluate_slate(
    State(state): State<AppState>,
    Path(outcome): Path<String>,
    Query(params): Query<MatchupQuery>,
) -> impl IntoResponse {
    let outcome: OutcomeType = match outcome.parse() {
        Ok(outcome) => outcome,
        Err(e) => return bad_request(e),
    };
    let matchup = match params.matchup() {
        Ok(matchup) => matchup,
        Err(e) => return bad_request(e),
    };

    let verdicts = state.engine.evaluate_slate(outcome, &matchup).await;
    let count = verdicts.len();
    info!("Returning {} {} verdicts", count, outcome);
    (
        StatusCode::OK,
        Json(SlateResponse {
            outcome,
            verdicts,
            count,
        }),
    )
        .into_response()
}

/// Classify a caller-supplied forecast against an optional quote
async fn evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> impl IntoResponse {
    if let Some(quote) = &request.quote {
        if quote.player_id != request.forecast.player_id
            || quote.outcome != request.forecast.outcome
        {
            return bad_request("quote does not match forecast player and outcome");
        }
        if !same_line(&request.forecast, quote) {
            return bad_request(format!(
                "quote line {} does not match forecast line {}",
                quote.line, request.forecast.line
            ));
        }
    }

    let verdict = state
        .engine
        .evaluate(&request.forecast, request.quote.as_ref());
    (StatusCode::OK, Json(verdict)).into_response()
}
