//! Forecast engine
//!
//! The surface the API layer calls: per-outcome forecasts for a matchup,
//! bet verdicts, reconciliation/impact status for a team and the matchup
//! outlook. Every call is pure given the gateway's cached inputs.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use edge_core::{
    BetVerdict, ConsensusVerdict, Forecast, GoalieStart, LeagueAverages, Matchup, MarketQuote,
    OutcomeType, Position, ProductionRecord, ScopeAggregate, ScopeImpact, TeamOutlook,
};
use edge_feeds::DataFeed;

use crate::cache::CacheStats;
use crate::config::EngineConfig;
use crate::decision::DecisionClassifier;
use crate::gateway::FeedGateway;
use crate::rate_limiter::RateLimiterStats;
use crate::impact::ImpactQuantifier;
use crate::model::{ContextModifiers, ProbabilityModel, Venue};
use crate::reconciliation::{reconcile_scope, ReconciliationPolicy};

/// Home-ice bump applied to the matchup outlook
const HOME_EDGE: f64 = 0.03;
const OUTLOOK_BOUNDS: (f64, f64) = (0.02, 0.98);

/// Reconciliation and impact status of one team
#[derive(Debug, Clone, Serialize)]
pub struct ScopeStatus {
    pub team: String,
    pub verdicts: Vec<ConsensusVerdict>,
    pub impact: ScopeImpact,
    /// Seconds left in a feed quota lockout, if one is active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lockout_remaining_secs: Option<u64>,
}

/// Everything known about one team for a cycle
struct TeamSnapshot {
    verdicts: Vec<ConsensusVerdict>,
    /// Production of every rostered or status-listed player
    records: Vec<ProductionRecord>,
    /// Active roster ids
    roster: BTreeSet<String>,
    unavailable: BTreeSet<String>,
    impact: ScopeImpact,
}

/// Line assumed when the market has not posted one
pub fn default_line(outcome: OutcomeType) -> f64 {
    match outcome {
        OutcomeType::Shots => 2.5,
        _ => 0.5,
    }
}

/// Forecast & validation engine
pub struct ForecastEngine {
    gateway: FeedGateway,
    policy: ReconciliationPolicy,
    model: ProbabilityModel,
    impact: ImpactQuantifier,
    classifier: DecisionClassifier,
}

impl ForecastEngine {
    pub fn new(feed: Arc<dyn DataFeed>, config: &EngineConfig) -> Self {
        Self {
            gateway: FeedGateway::new(feed, config),
            policy: config.policy,
            model: ProbabilityModel::default(),
            impact: ImpactQuantifier::default(),
            classifier: DecisionClassifier::default(),
        }
    }

    pub fn cache_stats(&self) -> Vec<CacheStats> {
        self.gateway.cache_stats()
    }

    /// Request spacing counters for the feed
    pub fn limiter_stats(&self) -> RateLimiterStats {
        self.gateway.limiter_stats()
    }

    /// Remaining feed quota lockout, if any
    pub fn lockout_remaining(&self) -> Option<Duration> {
        self.gateway.lockout_remaining()
    }

    /// Union of every readable quote board, `None` if none could be read
    async fn market_board(&self) -> Option<Vec<MarketQuote>> {
        let mut board: Option<Vec<MarketQuote>> = None;
        for outcome in OutcomeType::ALL {
            if let Some(quotes) = self.gateway.quotes(outcome).await {
                board.get_or_insert_with(Vec::new).extend(quotes);
            }
        }
        board
    }

    async fn team_snapshot(&self, team: &str) -> TeamSnapshot {
        let roster = self.gateway.roster(team).await;
        let reports = self.gateway.status_reports().await;
        let board = self.market_board().await;

        let verdicts = reconcile_scope(team, &roster, &reports, board.as_deref());
        let unavailable: BTreeSet<String> = verdicts
            .iter()
            .filter(|v| self.policy.treats_as_unavailable(v))
            .map(|v| v.player_id.clone())
            .collect();

        // Injured players are often off the active roster but still have a record
        let ids: Vec<String> = verdicts.iter().map(|v| v.player_id.clone()).collect();
        let records = self.gateway.production_batch(&ids).await;
        let missing: Vec<String> = unavailable.iter().cloned().collect();
        let impact = self.impact.assess(team, &missing, &records);

        TeamSnapshot {
            verdicts,
            records,
            roster: roster.into_iter().collect(),
            unavailable,
            impact,
        }
    }

    /// Reconciliation verdicts and impact for a team, for audit
    pub async fn scope_status(&self, team: &str) -> ScopeStatus {
        let snapshot = self.team_snapshot(team).await;
        ScopeStatus {
            team: team.to_string(),
            verdicts: snapshot.verdicts,
            impact: snapshot.impact,
            lockout_remaining_secs: self.lockout_remaining().map(|d| d.as_secs()),
        }
    }

    /// Forecasts for every available player in a matchup, most likely first
    pub async fn forecasts(&self, outcome: OutcomeType, matchup: &Matchup) -> Vec<Forecast> {
        let quotes = self.gateway.quotes(outcome).await.unwrap_or_default();
        self.forecasts_against(outcome, matchup, &quotes).await
    }

    /// Forecasts at the lines posted in `quotes`
    async fn forecasts_against(
        &self,
        outcome: OutcomeType,
        matchup: &Matchup,
        quotes: &[MarketQuote],
    ) -> Vec<Forecast> {
        if !matchup.is_valid() {
            warn!(
                "Ignoring matchup {} @ {}: needs two different teams",
                matchup.away, matchup.home
            );
            return Vec::new();
        }

        let aggregates = self.gateway.team_aggregates().await;
        let goalies = self.gateway.starting_goalies().await;
        let league = LeagueAverages::from_aggregates(&aggregates);

        let lines: HashMap<&str, f64> = quotes
            .iter()
            .map(|q| (q.player_id.as_str(), q.line_value()))
            .collect();

        let mut forecasts = Vec::new();
        for team in [&matchup.home, &matchup.away] {
            let Some(opponent) = matchup.opponent_of(team) else {
                continue;
            };
            let snapshot = self.team_snapshot(team).await;
            let ctx = context_for(
                team,
                opponent,
                matchup,
                &aggregates,
                &goalies,
                league,
                outcome,
            );

            for record in &snapshot.records {
                if !snapshot.roster.contains(&record.player_id) {
                    continue;
                }
                if snapshot.unavailable.contains(&record.player_id) {
                    debug!("Excluding unavailable player {}", record.name);
                    continue;
                }
                if record.position == Position::Goalie {
                    continue;
                }
                let line = lines
                    .get(record.player_id.as_str())
                    .copied()
                    .unwrap_or_else(|| default_line(outcome));
                if let Some(forecast) = self.model.forecast(record, outcome, line, opponent, &ctx)
                {
                    forecasts.push(forecast);
                }
            }
        }

        forecasts.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        info!(
            "{} {} @ {}: {} forecasts",
            outcome,
            matchup.away,
            matchup.home,
            forecasts.len()
        );
        forecasts
    }

    pub async fn goal_forecasts(&self, matchup: &Matchup) -> Vec<Forecast> {
        self.forecasts(OutcomeType::Goals, matchup).await
    }

    pub async fn assist_forecasts(&self, matchup: &Matchup) -> Vec<Forecast> {
        self.forecasts(OutcomeType::Assists, matchup).await
    }

    pub async fn point_forecasts(&self, matchup: &Matchup) -> Vec<Forecast> {
        self.forecasts(OutcomeType::Points, matchup).await
    }

    pub async fn shot_forecasts(&self, matchup: &Matchup) -> Vec<Forecast> {
        self.forecasts(OutcomeType::Shots, matchup).await
    }

    /// Compare a forecast to a quote
    pub fn evaluate(&self, forecast: &Forecast, quote: Option<&MarketQuote>) -> BetVerdict {
        self.classifier.classify(forecast, quote)
    }

    /// Verdicts for every forecast in a matchup, best tier first
    pub async fn evaluate_slate(
        &self,
        outcome: OutcomeType,
        matchup: &Matchup,
    ) -> Vec<BetVerdict> {
        // One board read so every forecast is paired with the line it was made at
        let board = self.gateway.quotes(outcome).await.unwrap_or_default();
        let forecasts = self.forecasts_against(outcome, matchup, &board).await;
        let quotes: HashMap<&str, &MarketQuote> =
            board.iter().map(|q| (q.player_id.as_str(), q)).collect();

        let mut verdicts: Vec<BetVerdict> = forecasts
            .iter()
            .map(|f| self.evaluate(f, quotes.get(f.player_id.as_str()).copied()))
            .collect();

        verdicts.sort_by(|a, b| {
            b.tier
                .cmp(&a.tier)
                .then_with(|| b.edge.unwrap_or(0.0).total_cmp(&a.edge.unwrap_or(0.0)))
        });
        verdicts
    }

    /// Win probabilities for a matchup with availability impact applied
    pub async fn team_outlook(&self, matchup: &Matchup) -> TeamOutlook {
        let aggregates = self.gateway.team_aggregates().await;
        let home_impact = self.team_snapshot(&matchup.home).await.impact;
        let away_impact = self.team_snapshot(&matchup.away).await.impact;

        let home_rate = pythagorean(find_aggregate(&aggregates, &matchup.home));
        let away_rate = pythagorean(find_aggregate(&aggregates, &matchup.away));

        let home_delta = home_impact.adjustments.win_probability;
        let away_delta = away_impact.adjustments.win_probability;
        let home = (log5(home_rate, away_rate) + HOME_EDGE + home_delta - away_delta)
            .clamp(OUTLOOK_BOUNDS.0, OUTLOOK_BOUNDS.1);

        TeamOutlook {
            home: matchup.home.clone(),
            away: matchup.away.clone(),
            home_win_probability: home,
            away_win_probability: 1.0 - home,
            home_impact: home_delta,
            away_impact: away_delta,
        }
    }
}

fn find_aggregate<'a>(
    aggregates: &'a [ScopeAggregate],
    team: &str,
) -> Option<&'a ScopeAggregate> {
    aggregates.iter().find(|a| a.team == team)
}

/// Expected win rate from goal differential, exponent 2
fn pythagorean(aggregate: Option<&ScopeAggregate>) -> f64 {
    match aggregate {
        Some(a) if a.goals_for > 0 || a.goals_against > 0 => {
            let gf = (a.goals_for as f64).powi(2);
            let ga = (a.goals_against as f64).powi(2);
            gf / (gf + ga)
        }
        _ => 0.5,
    }
}

/// Probability `a` beats `b` given each side's win rate
fn log5(a: f64, b: f64) -> f64 {
    let denominator = a + b - 2.0 * a * b;
    if denominator.abs() < f64::EPSILON {
        0.5
    } else {
        (a - a * b) / denominator
    }
}

fn context_for(
    team: &str,
    opponent: &str,
    matchup: &Matchup,
    aggregates: &[ScopeAggregate],
    goalies: &[GoalieStart],
    league: LeagueAverages,
    outcome: OutcomeType,
) -> ContextModifiers {
    ContextModifiers {
        venue: if matchup.is_home(team) {
            Venue::Home
        } else {
            Venue::Away
        },
        opposing_goalie_save_pct: goalies
            .iter()
            .find(|g| g.team == opponent)
            .map(|g| g.save_pct),
        opponent_allowed_rate: find_aggregate(aggregates, opponent)
            .filter(|a| a.games_played > 0)
            .map(|a| a.allowed_rate(outcome)),
        league,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_core::{AvailabilityStatus, OutcomeCounts, StatusReport, Tier, VerdictStatus};
    use edge_feeds::StaticFeed;
    use rust_decimal_macros::dec;

    fn skater(
        id: &str,
        team: &str,
        position: Position,
        goals: u32,
        assists: u32,
    ) -> ProductionRecord {
        ProductionRecord {
            player_id: id.to_string(),
            name: format!("Player {}", id),
            team: team.to_string(),
            position,
            season: OutcomeCounts {
                games: 50,
                goals,
                assists,
                shots: 150,
            },
            recent: OutcomeCounts {
                games: 10,
                goals: goals / 5,
                assists: assists / 5,
                shots: 30,
            },
            toi_per_game: 18.0,
            pp_toi_per_game: 1.5,
        }
    }

    fn aggregate(team: &str, goals_for: u32, goals_against: u32) -> ScopeAggregate {
        ScopeAggregate {
            team: team.to_string(),
            games_played: 50,
            goals_for,
            goals_against,
            shots_against: 1500,
            power_play_pct: 0.22,
            penalty_kill_pct: 0.80,
        }
    }

    fn feed() -> StaticFeed {
        StaticFeed::new("static")
            .with_player(skater("e1", "EDM", Position::Center, 30, 40))
            .with_player(skater("e2", "EDM", Position::Wing, 20, 20))
            .with_player(skater("e3", "EDM", Position::Defense, 2, 10))
            .with_player(skater("v1", "VAN", Position::Center, 25, 30))
            .with_player(skater("v2", "VAN", Position::Wing, 15, 10))
            .with_aggregate(aggregate("EDM", 180, 140))
            .with_aggregate(aggregate("VAN", 150, 160))
            .with_goalie(GoalieStart {
                team: "VAN".to_string(),
                goalie_id: "g1".to_string(),
                save_pct: 0.880,
            })
            .with_status(StatusReport {
                player_id: "e2".to_string(),
                name: "Player e2".to_string(),
                team: "EDM".to_string(),
                status: AvailabilityStatus::Out,
                detail: "upper body".to_string(),
                updated_at: None,
            })
            .with_quote(MarketQuote {
                player_id: "e1".to_string(),
                outcome: OutcomeType::Goals,
                line: dec!(0.5),
                over_price: 300,
                under_price: None,
            })
    }

    fn engine() -> ForecastEngine {
        let config = EngineConfig {
            min_request_interval: Duration::ZERO,
            ..EngineConfig::default()
        };
        ForecastEngine::new(Arc::new(feed()), &config)
    }

    #[tokio::test]
    async fn test_unavailable_players_are_excluded() {
        let engine = engine();
        let matchup = Matchup::new("EDM", "VAN");
        let forecasts = engine.goal_forecasts(&matchup).await;

        assert!(!forecasts.is_empty());
        assert!(forecasts.iter().all(|f| f.player_id != "e2"));
        // Defenseman below the goal minimum is filtered
        assert!(forecasts.iter().all(|f| f.player_id != "e3"));
        assert!(forecasts
            .windows(2)
            .all(|w| w[0].probability >= w[1].probability));
        assert!(forecasts
            .iter()
            .all(|f| f.probability > 0.0 && f.probability < 1.0 && f.expected_value >= 0.0));
    }

    #[tokio::test]
    async fn test_forecast_context() {
        let engine = engine();
        let matchup = Matchup::new("EDM", "VAN");
        let forecasts = engine.goal_forecasts(&matchup).await;

        let home = forecasts.iter().find(|f| f.player_id == "e1").unwrap();
        assert_eq!(home.opponent, "VAN");
        assert_eq!(home.factors.location, 1.04);
        assert!(home.factors.goaltender > 1.0);

        let away = forecasts.iter().find(|f| f.player_id == "v1").unwrap();
        assert_eq!(away.factors.location, 0.97);
        assert_eq!(away.factors.goaltender, 1.0);
    }

    #[tokio::test]
    async fn test_scope_status_reports_impact() {
        let engine = engine();
        let status = engine.scope_status("EDM").await;

        let hurt = status.verdicts.iter().find(|v| v.player_id == "e2").unwrap();
        // Goals board was readable and e2 has no line
        assert_eq!(hurt.status, VerdictStatus::Unavailable);
        assert_eq!(hurt.agreement, 2);

        assert_eq!(status.impact.players.len(), 1);
        assert!(status.impact.adjustments.win_probability < 0.0);
        assert!(status.lockout_remaining_secs.is_none());

        let healthy = engine.scope_status("VAN").await;
        assert!(healthy.impact.adjustments.is_zero());
    }

    #[tokio::test]
    async fn test_evaluate_slate_joins_quotes() {
        let engine = engine();
        let verdicts = engine
            .evaluate_slate(OutcomeType::Goals, &Matchup::new("EDM", "VAN"))
            .await;

        let quoted = verdicts.iter().find(|v| v.forecast.player_id == "e1").unwrap();
        assert_eq!(quoted.implied_probability, Some(0.25));
        assert!(quoted.edge.is_some());

        let unquoted = verdicts.iter().find(|v| v.forecast.player_id == "v2").unwrap();
        assert!(unquoted.quote.is_none());
        assert!(unquoted.tier <= Tier::Lean);

        assert!(verdicts.windows(2).all(|w| w[0].tier >= w[1].tier));
    }

    #[tokio::test]
    async fn test_team_outlook() {
        let engine = engine();
        let outlook = engine.team_outlook(&Matchup::new("EDM", "VAN")).await;

        assert!(outlook.home_win_probability > 0.5);
        assert!(outlook.home_impact < 0.0);
        assert_eq!(outlook.away_impact, 0.0);
        assert!((outlook.home_win_probability + outlook.away_win_probability - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_injured_player_off_roster_keeps_full_impact() {
        let mut star = skater("star", "EDM", Position::Center, 50, 60);
        star.toi_per_game = 23.0;
        let feed = feed()
            .with_reserve_player(star)
            .with_status(StatusReport {
                player_id: "star".to_string(),
                name: "Player star".to_string(),
                team: "EDM".to_string(),
                status: AvailabilityStatus::InjuredReserve,
                detail: "knee".to_string(),
                updated_at: None,
            });
        let config = EngineConfig {
            min_request_interval: Duration::ZERO,
            ..EngineConfig::default()
        };
        let engine = ForecastEngine::new(Arc::new(feed), &config);

        let status = engine.scope_status("EDM").await;
        let impact = status
            .impact
            .players
            .iter()
            .find(|p| p.player_id == "star")
            .unwrap();
        assert!(!impact.placeholder);
        assert_eq!(impact.tier, 1);
        assert!(impact.top_contributor);
        assert_eq!(impact.position, Position::Center);

        let forecasts = engine.goal_forecasts(&Matchup::new("EDM", "VAN")).await;
        assert!(forecasts.iter().all(|f| f.player_id != "star"));
    }

    #[tokio::test]
    async fn test_same_team_matchup_yields_nothing() {
        let engine = engine();
        let matchup = Matchup::new("EDM", "EDM");
        assert!(engine.goal_forecasts(&matchup).await.is_empty());
        assert!(engine
            .evaluate_slate(OutcomeType::Goals, &matchup)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_slate_pairs_forecasts_with_their_line() {
        let engine = engine();
        let verdicts = engine
            .evaluate_slate(OutcomeType::Goals, &Matchup::new("EDM", "VAN"))
            .await;
        for verdict in verdicts.iter().filter(|v| v.quote.is_some()) {
            let quote = verdict.quote.as_ref().unwrap();
            assert_eq!(verdict.forecast.line, quote.line_value());
        }
    }

    #[test]
    fn test_log5_and_pythagorean() {
        assert!((log5(0.5, 0.5) - 0.5).abs() < 1e-12);
        assert!(log5(0.6, 0.4) > 0.6);
        assert_eq!(pythagorean(None), 0.5);
        let even = aggregate("X", 100, 100);
        assert!((pythagorean(Some(&even)) - 0.5).abs() < 1e-12);
    }
}
