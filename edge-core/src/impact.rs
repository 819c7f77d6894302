//! Availability impact records

use serde::{Deserialize, Serialize};

use crate::Position;

/// Signed adjustments applied to team-level aggregates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Adjustments {
    /// Delta on the team's win probability
    pub win_probability: f64,
    /// Delta on power-play conversion
    pub power_play: f64,
    /// Delta on expected goals for
    pub expected_goals: f64,
}

impl Adjustments {
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            win_probability: self.win_probability * factor,
            power_play: self.power_play * factor,
            expected_goals: self.expected_goals * factor,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.win_probability == 0.0 && self.power_play == 0.0 && self.expected_goals == 0.0
    }
}

impl std::ops::Add for Adjustments {
    type Output = Adjustments;

    fn add(self, rhs: Adjustments) -> Adjustments {
        Adjustments {
            win_probability: self.win_probability + rhs.win_probability,
            power_play: self.power_play + rhs.power_play,
            expected_goals: self.expected_goals + rhs.expected_goals,
        }
    }
}

/// Impact of a single unavailable player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactRecord {
    pub player_id: String,
    pub team: String,
    pub position: Position,
    /// Bounded importance score, 0.0 - 1.0
    pub importance: f64,
    /// Ordinal tier, 1 = most important, 5 = least
    pub tier: u8,
    /// Share of the team's points
    pub production_share: f64,
    /// Share of the team's total time on ice
    pub time_share: f64,
    /// Whether the player is the team's top point producer
    pub top_contributor: bool,
    /// No production record matched; a conservative placeholder was used
    pub placeholder: bool,
    pub adjustments: Adjustments,
}

/// Aggregate impact of every unavailable player on one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeImpact {
    pub team: String,
    pub players: Vec<ImpactRecord>,
    /// Step multiplier for simultaneous absences
    pub compounding: f64,
    /// Top/second contributor point-share ratio
    pub concentration_ratio: f64,
    /// Multiplier applied when a top contributor is missing
    pub concentration_factor: f64,
    /// Cumulative lost time-on-ice share
    pub lost_time_share: f64,
    /// Final clamped adjustments
    pub adjustments: Adjustments,
}

impl ScopeImpact {
    /// Impact of a team with nobody missing
    pub fn empty(team: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            players: Vec::new(),
            compounding: 1.0,
            concentration_ratio: 1.0,
            concentration_factor: 1.0,
            lost_time_share: 0.0,
            adjustments: Adjustments::default(),
        }
    }
}
