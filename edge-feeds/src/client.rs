//! HTTP stats/odds API client
//!
//! Provides a [`DataFeed`] over the stats provider's REST API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use edge_core::{
    EdgeError, EdgeResult, GoalieStart, LeagueAverages, MarketQuote, OutcomeType,
    ProductionRecord, ScopeAggregate, StatusReport,
};

use crate::feed::DataFeed;
use crate::types::{
    RawGoalieStart, RawPlayerStats, RawQuote, RawRosterEntry, RawStatusEntry, RawTeamStats,
};

/// Transport-level timeout; the gateway applies its own shorter per-call timeout
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Stats/odds REST API client
#[derive(Clone)]
pub struct HttpFeed {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpFeed {
    /// Create a new client against `base_url`
    pub fn new(base_url: &str, api_key: Option<String>) -> EdgeResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| EdgeError::config(format!("Invalid feed URL {}: {}", base_url, e)))?;
        // Url::join drops the last path segment unless the base ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| EdgeError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, path: &str) -> EdgeResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| EdgeError::config(format!("Invalid endpoint {}: {}", path, e)))
    }

    /// GET a JSON document, mapping HTTP failures onto [`EdgeError`]
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> EdgeResult<T> {
        let url = self.endpoint(path)?;
        debug!("Fetching {}", url);

        let mut request = self.client.get(url.clone());
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EdgeError::timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                } else {
                    EdgeError::network(format!("Failed to fetch {}: {}", path, e))
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(EdgeError::quota(self.name()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Some providers report a spent quota as 403 with an explanatory body
            if status == StatusCode::FORBIDDEN && body.to_lowercase().contains("quota") {
                return Err(EdgeError::quota(self.name()));
            }
            return Err(EdgeError::api(format!("Feed API error ({}): {}", status, body)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| EdgeError::parse(format!("Failed to parse {} response: {}", path, e)))
    }
}

#[async_trait]
impl DataFeed for HttpFeed {
    fn name(&self) -> &str {
        "stats-api"
    }

    #[instrument(skip(self))]
    async fn status_reports(&self) -> EdgeResult<Vec<StatusReport>> {
        let raw: Vec<RawStatusEntry> = self.get_json("v1/injuries").await?;
        let total = raw.len();
        let reports: Vec<StatusReport> = raw.iter().filter_map(|r| r.to_status_report()).collect();
        if reports.len() < total {
            warn!("Dropped {} status entries without a player id", total - reports.len());
        }
        Ok(reports)
    }

    #[instrument(skip(self))]
    async fn quotes(&self, outcome: OutcomeType) -> EdgeResult<Vec<MarketQuote>> {
        let raw: Vec<RawQuote> = self.get_json(&format!("v1/props/{}", outcome)).await?;
        Ok(raw
            .iter()
            .filter_map(|q| q.to_market_quote(outcome))
            .collect())
    }

    #[instrument(skip(self))]
    async fn roster(&self, team: &str) -> EdgeResult<Vec<String>> {
        let raw: Vec<RawRosterEntry> = self
            .get_json(&format!("v1/teams/{}/roster", team.to_lowercase()))
            .await?;
        Ok(raw.iter().filter_map(|r| r.id()).collect())
    }

    #[instrument(skip(self))]
    async fn player_production(&self, player_id: &str) -> EdgeResult<ProductionRecord> {
        let raw: RawPlayerStats = self
            .get_json(&format!("v1/players/{}/stats", player_id))
            .await?;
        raw.to_production_record()
            .ok_or_else(|| EdgeError::parse(format!("Stats for {} carry no player id", player_id)))
    }

    #[instrument(skip(self))]
    async fn team_aggregates(&self) -> EdgeResult<Vec<ScopeAggregate>> {
        let raw: Vec<RawTeamStats> = self.get_json("v1/teams/stats").await?;
        Ok(raw.iter().filter_map(|t| t.to_scope_aggregate()).collect())
    }

    #[instrument(skip(self))]
    async fn starting_goalies(&self) -> EdgeResult<Vec<GoalieStart>> {
        let raw: Vec<RawGoalieStart> = self.get_json("v1/goalies/starting").await?;
        let league = LeagueAverages::default();
        Ok(raw
            .iter()
            .filter_map(|g| g.to_goalie_start(league.save_pct))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let feed = HttpFeed::new("https://stats.example.com/api", None).unwrap();
        assert_eq!(feed.base_url(), "https://stats.example.com/api/");
        assert_eq!(
            feed.endpoint("v1/injuries").unwrap().as_str(),
            "https://stats.example.com/api/v1/injuries"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpFeed::new("not a url", None),
            Err(EdgeError::Config(_))
        ));
    }
}
