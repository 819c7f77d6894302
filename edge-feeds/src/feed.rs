//! The collaborator seam
//!
//! Everything the engine reads from the outside world goes through
//! [`DataFeed`]. The HTTP implementation lives in [`crate::client`];
//! [`StaticFeed`] serves a fixed snapshot (offline runs and tests).

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

use edge_core::{
    EdgeError, EdgeResult, GoalieStart, LeagueAverages, MarketQuote, OutcomeType,
    ProductionRecord, ScopeAggregate, StatusReport,
};

use crate::types::{
    RawGoalieStart, RawPlayerStats, RawQuote, RawStatusEntry, RawTeamStats,
};

/// Read-only source of statuses, odds and production data
#[async_trait]
pub trait DataFeed: Send + Sync {
    /// Short name used for logging and lockout bookkeeping
    fn name(&self) -> &str;

    /// Current injury/status list
    async fn status_reports(&self) -> EdgeResult<Vec<StatusReport>>;

    /// Every quoted line for an outcome type
    async fn quotes(&self, outcome: OutcomeType) -> EdgeResult<Vec<MarketQuote>>;

    /// Player ids on a team's active roster
    async fn roster(&self, team: &str) -> EdgeResult<Vec<String>>;

    /// Production record for one player
    async fn player_production(&self, player_id: &str) -> EdgeResult<ProductionRecord>;

    /// Aggregates for every team in the league
    async fn team_aggregates(&self) -> EdgeResult<Vec<ScopeAggregate>>;

    /// Projected starting goaltenders for today's games
    async fn starting_goalies(&self) -> EdgeResult<Vec<GoalieStart>>;
}

/// Raw snapshot layout accepted by [`StaticFeed::from_snapshot_json`]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    #[serde(default)]
    injuries: Vec<RawStatusEntry>,
    #[serde(default)]
    props: HashMap<OutcomeType, Vec<RawQuote>>,
    #[serde(default)]
    players: Vec<RawPlayerStats>,
    /// Ids of players with stats who are off the active roster
    #[serde(default)]
    reserve: Vec<serde_json::Value>,
    #[serde(default)]
    teams: Vec<RawTeamStats>,
    #[serde(default)]
    goalies: Vec<RawGoalieStart>,
}

/// In-memory feed over a fixed set of normalized records
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    name: String,
    statuses: Vec<StatusReport>,
    quotes: HashMap<OutcomeType, Vec<MarketQuote>>,
    players: HashMap<String, ProductionRecord>,
    /// Players with a record who are not on the active roster
    reserve: BTreeSet<String>,
    aggregates: Vec<ScopeAggregate>,
    goalies: Vec<GoalieStart>,
}

impl StaticFeed {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Build a feed from a JSON snapshot of raw feed payloads
    ///
    /// Records that fail normalization are skipped with a warning.
    pub fn from_snapshot_json(name: impl Into<String>, json: &str) -> EdgeResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)
            .map_err(|e| EdgeError::parse(format!("Failed to parse snapshot: {}", e)))?;

        let mut feed = Self::new(name);

        for entry in &snapshot.injuries {
            match entry.to_status_report() {
                Some(report) => feed.statuses.push(report),
                None => warn!("Skipping status entry without player id: {:?}", entry.player_name),
            }
        }
        for (outcome, raw_quotes) in &snapshot.props {
            let quotes = raw_quotes
                .iter()
                .filter_map(|q| q.to_market_quote(*outcome))
                .collect();
            feed.quotes.insert(*outcome, quotes);
        }
        for raw in &snapshot.players {
            match raw.to_production_record() {
                Some(record) => {
                    feed.players.insert(record.player_id.clone(), record);
                }
                None => warn!("Skipping player stats without id: {:?}", raw.full_name),
            }
        }
        feed.reserve = snapshot
            .reserve
            .iter()
            .filter_map(|id| match id {
                serde_json::Value::String(s) => Some(s.trim().to_string()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect();
        feed.aggregates = snapshot
            .teams
            .iter()
            .filter_map(|t| t.to_scope_aggregate())
            .collect();

        let league = LeagueAverages::from_aggregates(&feed.aggregates);
        feed.goalies = snapshot
            .goalies
            .iter()
            .filter_map(|g| g.to_goalie_start(league.save_pct))
            .collect();

        Ok(feed)
    }

    pub fn with_status(mut self, report: StatusReport) -> Self {
        self.statuses.push(report);
        self
    }

    pub fn with_quote(mut self, quote: MarketQuote) -> Self {
        self.quotes.entry(quote.outcome).or_default().push(quote);
        self
    }

    pub fn with_player(mut self, record: ProductionRecord) -> Self {
        self.players.insert(record.player_id.clone(), record);
        self
    }

    /// Add a player who has production but is off the active roster
    pub fn with_reserve_player(mut self, record: ProductionRecord) -> Self {
        self.reserve.insert(record.player_id.clone());
        self.with_player(record)
    }

    pub fn with_aggregate(mut self, aggregate: ScopeAggregate) -> Self {
        self.aggregates.push(aggregate);
        self
    }

    pub fn with_goalie(mut self, goalie: GoalieStart) -> Self {
        self.goalies.push(goalie);
        self
    }
}

#[async_trait]
impl DataFeed for StaticFeed {
    fn name(&self) -> &str {
        &self.name
    }

    async fn status_reports(&self) -> EdgeResult<Vec<StatusReport>> {
        Ok(self.statuses.clone())
    }

    async fn quotes(&self, outcome: OutcomeType) -> EdgeResult<Vec<MarketQuote>> {
        Ok(self.quotes.get(&outcome).cloned().unwrap_or_default())
    }

    async fn roster(&self, team: &str) -> EdgeResult<Vec<String>> {
        let mut ids: Vec<String> = self
            .players
            .values()
            .filter(|p| p.team == team && !self.reserve.contains(&p.player_id))
            .map(|p| p.player_id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn player_production(&self, player_id: &str) -> EdgeResult<ProductionRecord> {
        self.players
            .get(player_id)
            .cloned()
            .ok_or_else(|| EdgeError::not_found(format!("player {}", player_id)))
    }

    async fn team_aggregates(&self) -> EdgeResult<Vec<ScopeAggregate>> {
        Ok(self.aggregates.clone())
    }

    async fn starting_goalies(&self) -> EdgeResult<Vec<GoalieStart>> {
        Ok(self.goalies.clone())
    }
}
