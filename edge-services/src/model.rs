//! Probability model
//!
//! Converts a player's production record and the game context into an
//! expected count, the probability of clearing a line, and a confidence score.

use statrs::distribution::{ContinuousCDF, DiscreteCDF, Normal, Poisson};
use tracing::debug;

use edge_core::{
    Distribution, FactorBreakdown, Forecast, LeagueAverages, OutcomeType, ProductionRecord,
};

/// Where the player's team is playing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    Home,
    Away,
    Neutral,
}

/// Situational inputs for one player's game
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextModifiers {
    pub venue: Venue,
    /// Save percentage of the opposing starter, when known
    pub opposing_goalie_save_pct: Option<f64>,
    /// Goals (or shots) the opponent allows per game, when known
    pub opponent_allowed_rate: Option<f64>,
    pub league: LeagueAverages,
}

impl ContextModifiers {
    /// Context that leaves the base rate untouched
    pub fn neutral() -> Self {
        Self {
            venue: Venue::Neutral,
            opposing_goalie_save_pct: None,
            opponent_allowed_rate: None,
            league: LeagueAverages::default(),
        }
    }
}

/// Tunable constants for the probability model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub recent_weight: f64,
    pub season_weight: f64,
    pub trend_sensitivity: f64,
    pub trend_bounds: (f64, f64),
    /// (minimum PP minutes per game, multiplier), highest threshold first
    pub power_play_bonuses: Vec<(f64, f64)>,
    pub goalie_sensitivity: f64,
    pub goalie_bounds: (f64, f64),
    pub home_factor: f64,
    pub away_factor: f64,
    pub opponent_bounds: (f64, f64),
    /// Variance-to-mean ratio for the normal approximation
    pub normal_variance_scale: f64,
    pub probability_bounds: (f64, f64),
    pub confidence_base: f64,
    pub confidence_step: f64,
    pub games_milestones: [u32; 3],
    /// Multiples of the type minimum that earn a confidence step
    pub rate_tiers: [f64; 3],
    pub confidence_cap: f64,
    pub min_games: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            recent_weight: 0.6,
            season_weight: 0.4,
            trend_sensitivity: 0.5,
            trend_bounds: (0.85, 1.15),
            power_play_bonuses: vec![(3.0, 1.15), (2.0, 1.10), (1.0, 1.05)],
            goalie_sensitivity: 10.0,
            goalie_bounds: (0.85, 1.15),
            home_factor: 1.04,
            away_factor: 0.97,
            opponent_bounds: (0.85, 1.15),
            normal_variance_scale: 1.3,
            probability_bounds: (0.001, 0.999),
            confidence_base: 0.50,
            confidence_step: 0.05,
            games_milestones: [10, 30, 60],
            rate_tiers: [1.0, 2.0, 3.0],
            confidence_cap: 0.90,
            min_games: 5,
        }
    }
}

impl ModelConfig {
    /// Minimum season rate per game for a player to be forecast
    pub fn min_rate(&self, outcome: OutcomeType) -> f64 {
        match outcome {
            OutcomeType::Goals => 0.15,
            OutcomeType::Assists => 0.20,
            OutcomeType::Points => 0.35,
            OutcomeType::Shots => 1.5,
        }
    }
}

fn bounded(value: f64, (lo, hi): (f64, f64)) -> f64 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        1.0
    }
}

/// Poisson/normal outcome model
#[derive(Debug, Clone, Default)]
pub struct ProbabilityModel {
    config: ModelConfig,
}

impl ProbabilityModel {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Whether the record carries enough signal to forecast this outcome
    pub fn passes_quality(&self, record: &ProductionRecord, outcome: OutcomeType) -> bool {
        record.games_played() >= self.config.min_games
            && record.season_rate(outcome) >= self.config.min_rate(outcome)
    }

    /// Base rate and the sequential adjustment factors
    pub fn factors(
        &self,
        record: &ProductionRecord,
        outcome: OutcomeType,
        ctx: &ContextModifiers,
    ) -> FactorBreakdown {
        let c = &self.config;
        let season_rate = record.season_rate(outcome);
        let recent_rate = record.recent_rate(outcome);
        let base_rate = c.recent_weight * recent_rate + c.season_weight * season_rate;

        let season_shots = record.season_rate(OutcomeType::Shots);
        let volume_trend = if season_shots > 0.0 {
            let ratio = record.recent_rate(OutcomeType::Shots) / season_shots;
            bounded(1.0 + c.trend_sensitivity * (ratio - 1.0), c.trend_bounds)
        } else {
            1.0
        };

        let power_play = c
            .power_play_bonuses
            .iter()
            .find(|(minutes, _)| record.pp_toi_per_game >= *minutes)
            .map(|(_, bonus)| *bonus)
            .unwrap_or(1.0);

        let goaltender = match ctx.opposing_goalie_save_pct {
            Some(save_pct) if outcome.faces_goaltender() => bounded(
                1.0 + c.goalie_sensitivity * (ctx.league.save_pct - save_pct),
                c.goalie_bounds,
            ),
            _ => 1.0,
        };

        let location = match ctx.venue {
            Venue::Home => c.home_factor,
            Venue::Away => c.away_factor,
            Venue::Neutral => 1.0,
        };

        let league_rate = ctx.league.allowed_rate(outcome);
        let opponent = match ctx.opponent_allowed_rate {
            Some(allowed) if league_rate > 0.0 && allowed > 0.0 => {
                bounded(allowed / league_rate, c.opponent_bounds)
            }
            _ => 1.0,
        };

        FactorBreakdown {
            season_rate,
            recent_rate,
            base_rate,
            volume_trend,
            power_play,
            goaltender,
            location,
            opponent,
        }
    }

    /// Probability that the count exceeds `line`
    pub fn probability_over(&self, lambda: f64, line: f64, outcome: OutcomeType) -> f64 {
        let (lo, hi) = self.config.probability_bounds;
        let threshold = (line.max(0.0).floor() as u64).saturating_add(1);

        let raw = match outcome.distribution() {
            Distribution::Poisson => poisson_at_least(lambda, threshold),
            Distribution::Normal => {
                let sd = (self.config.normal_variance_scale * lambda).sqrt();
                match Normal::new(lambda, sd) {
                    // Continuity correction: P(X >= k) ~ P(Y > k - 0.5)
                    Ok(normal) => 1.0 - normal.cdf(threshold as f64 - 0.5),
                    Err(_) => 0.0,
                }
            }
        };

        if raw.is_finite() {
            raw.clamp(lo, hi)
        } else {
            lo
        }
    }

    /// Confidence from sample size and production level
    pub fn confidence(&self, record: &ProductionRecord, outcome: OutcomeType) -> f64 {
        let c = &self.config;
        let games = record.games_played();
        let rate = record.season_rate(outcome);
        let min_rate = c.min_rate(outcome);

        let milestones = c.games_milestones.iter().filter(|m| games >= **m).count();
        let tiers = c
            .rate_tiers
            .iter()
            .filter(|t| rate >= min_rate * **t)
            .count();

        (c.confidence_base + c.confidence_step * (milestones + tiers) as f64).min(c.confidence_cap)
    }

    /// Forecast one player for one outcome, `None` if filtered for low signal
    pub fn forecast(
        &self,
        record: &ProductionRecord,
        outcome: OutcomeType,
        line: f64,
        opponent: &str,
        ctx: &ContextModifiers,
    ) -> Option<Forecast> {
        if !self.passes_quality(record, outcome) {
            debug!(
                "Skipping {} for {}: {} games, {:.3}/game",
                record.name,
                outcome,
                record.games_played(),
                record.season_rate(outcome)
            );
            return None;
        }

        let factors = self.factors(record, outcome, ctx);
        let expected_value = (factors.base_rate * factors.combined()).max(0.0);
        let probability = self.probability_over(expected_value, line, outcome);

        Some(Forecast {
            player_id: record.player_id.clone(),
            name: record.name.clone(),
            team: record.team.clone(),
            opponent: opponent.to_string(),
            outcome,
            line,
            expected_value,
            probability,
            confidence: self.confidence(record, outcome),
            games_played: record.games_played(),
            factors,
        })
    }
}

/// P(X >= k) for X ~ Poisson(lambda)
fn poisson_at_least(lambda: f64, k: u64) -> f64 {
    if lambda <= 0.0 || k == 0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    if k == 1 {
        return 1.0 - (-lambda).exp();
    }
    // Tail mass this far above the mean is below every probability floor
    if k as f64 > lambda + 40.0 * lambda.sqrt() + 40.0 {
        return 0.0;
    }
    match Poisson::new(lambda) {
        Ok(poisson) => 1.0 - poisson.cdf(k - 1),
        Err(_) => 0.0,
    }
}
