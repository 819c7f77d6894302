//! Model forecasts

use serde::{Deserialize, Serialize};

use crate::OutcomeType;

/// Multiplicative factors that produced an expected value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    pub season_rate: f64,
    pub recent_rate: f64,
    /// Blended base rate before adjustments
    pub base_rate: f64,
    pub volume_trend: f64,
    pub power_play: f64,
    pub goaltender: f64,
    pub location: f64,
    pub opponent: f64,
}

impl FactorBreakdown {
    /// Product of every adjustment factor
    pub fn combined(&self) -> f64 {
        self.volume_trend * self.power_play * self.goaltender * self.location * self.opponent
    }
}

/// Forecast for one player and outcome type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub player_id: String,
    pub name: String,
    pub team: String,
    pub opponent: String,
    pub outcome: OutcomeType,
    /// Line the probability refers to (P(count > line))
    pub line: f64,
    /// Expected count, always >= 0
    pub expected_value: f64,
    /// Probability of clearing the line, strictly within (0, 1)
    pub probability: f64,
    /// Model confidence, strictly within (0, 1)
    pub confidence: f64,
    pub games_played: u32,
    pub factors: FactorBreakdown,
}

/// Win probabilities for a matchup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamOutlook {
    pub home: String,
    pub away: String,
    pub home_win_probability: f64,
    pub away_win_probability: f64,
    /// Impact deltas that were applied (home, away)
    pub home_impact: f64,
    pub away_impact: f64,
}
