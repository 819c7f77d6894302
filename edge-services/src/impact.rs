//! Impact quantification
//!
//! Turns a team's unavailable players into bounded adjustments on its win
//! probability, power-play efficiency and expected goals. Individual
//! adjustments are summed, scaled by a superlinear compounding step and a
//! concentration-risk factor, then clamped.

use std::collections::HashMap;
use tracing::debug;

use edge_core::{Adjustments, ImpactRecord, Position, ProductionRecord, ScopeImpact};

/// Maximum impact and multiplier for one position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionalProfile {
    /// Adjustment magnitudes for an importance score of 1.0
    pub max_impact: Adjustments,
    pub multiplier: f64,
    /// Weight of the role in the importance score
    pub role_weight: f64,
}

/// Tunable constants for impact quantification
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactConfig {
    pub share_weight: f64,
    pub rank_weight: f64,
    pub role_weight: f64,
    /// Point share at which the share component saturates
    pub share_ceiling: f64,
    /// Lower bounds of tiers 1-4; anything below the last is tier 5
    pub tier_thresholds: [f64; 4],
    /// Multiplier for 1, 2, 3, ... simultaneous absences; the last step repeats
    pub compounding_steps: Vec<f64>,
    pub lost_time_threshold: f64,
    pub lost_time_multiplier: f64,
    pub concentration_factor: f64,
    /// Used instead when no credible secondary contributor exists
    pub thin_concentration_factor: f64,
    pub secondary_share_floor: f64,
    pub thin_ratio: f64,
    /// Symmetric clamp per adjustment category
    pub bounds: Adjustments,
    /// Importance assumed for a player without a production record
    pub placeholder_score: f64,
    pub center: PositionalProfile,
    pub wing: PositionalProfile,
    pub defense: PositionalProfile,
    pub goalie: PositionalProfile,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            share_weight: 0.5,
            rank_weight: 0.3,
            role_weight: 0.2,
            share_ceiling: 0.25,
            tier_thresholds: [0.80, 0.60, 0.40, 0.20],
            compounding_steps: vec![1.00, 1.15, 1.35, 1.60, 1.90],
            lost_time_threshold: 0.35,
            lost_time_multiplier: 1.20,
            concentration_factor: 1.25,
            thin_concentration_factor: 1.45,
            secondary_share_floor: 0.10,
            thin_ratio: 2.0,
            bounds: Adjustments {
                win_probability: 0.15,
                power_play: 0.10,
                expected_goals: 1.0,
            },
            placeholder_score: 0.30,
            center: PositionalProfile {
                max_impact: Adjustments {
                    win_probability: 0.05,
                    power_play: 0.04,
                    expected_goals: 0.35,
                },
                multiplier: 1.0,
                role_weight: 0.8,
            },
            wing: PositionalProfile {
                max_impact: Adjustments {
                    win_probability: 0.04,
                    power_play: 0.035,
                    expected_goals: 0.30,
                },
                multiplier: 1.0,
                role_weight: 0.6,
            },
            defense: PositionalProfile {
                max_impact: Adjustments {
                    win_probability: 0.04,
                    power_play: 0.03,
                    expected_goals: 0.20,
                },
                multiplier: 0.9,
                role_weight: 0.7,
            },
            goalie: PositionalProfile {
                max_impact: Adjustments {
                    win_probability: 0.08,
                    power_play: 0.0,
                    expected_goals: 0.60,
                },
                multiplier: 1.2,
                role_weight: 1.0,
            },
        }
    }
}

impl ImpactConfig {
    pub fn profile(&self, position: Position) -> &PositionalProfile {
        match position {
            Position::Center => &self.center,
            Position::Wing => &self.wing,
            Position::Defense => &self.defense,
            Position::Goalie => &self.goalie,
        }
    }

    /// Ordinal tier for an importance score, 1 = most important
    pub fn tier_for(&self, score: f64) -> u8 {
        self.tier_thresholds
            .iter()
            .position(|threshold| score >= *threshold)
            .map(|i| i as u8 + 1)
            .unwrap_or(5)
    }

    /// Step multiplier for `count` simultaneous absences
    pub fn compounding(&self, count: usize, lost_time_share: f64) -> f64 {
        if count == 0 {
            return 1.0;
        }
        let step = self
            .compounding_steps
            .get(count - 1)
            .or(self.compounding_steps.last())
            .copied()
            .unwrap_or(1.0);

        if lost_time_share > self.lost_time_threshold {
            step * self.lost_time_multiplier
        } else {
            step
        }
    }

    fn clamp(&self, adjustments: Adjustments) -> Adjustments {
        let b = self.bounds;
        Adjustments {
            win_probability: clamp_symmetric(adjustments.win_probability, b.win_probability),
            power_play: clamp_symmetric(adjustments.power_play, b.power_play),
            expected_goals: clamp_symmetric(adjustments.expected_goals, b.expected_goals),
        }
    }
}

fn clamp_symmetric(value: f64, bound: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(-bound.abs(), bound.abs())
}

/// Team-wide production context shared by every player assessment
struct TeamContext<'a> {
    records: HashMap<&'a str, &'a ProductionRecord>,
    total_points: f64,
    total_toi: f64,
    /// Player ids ordered by time on ice, highest first
    toi_order: Vec<&'a str>,
    top_id: Option<&'a str>,
    top_share: f64,
    second_share: f64,
}

impl<'a> TeamContext<'a> {
    fn new(team: &str, records: &'a [ProductionRecord]) -> Self {
        let team_records: Vec<&ProductionRecord> =
            records.iter().filter(|r| r.team == team).collect();

        let total_points: f64 = team_records.iter().map(|r| r.season.points() as f64).sum();
        let total_toi: f64 = team_records.iter().map(|r| r.toi_per_game.max(0.0)).sum();

        let mut toi_order: Vec<&ProductionRecord> = team_records.clone();
        toi_order.sort_by(|a, b| b.toi_per_game.total_cmp(&a.toi_per_game));

        let mut by_points: Vec<&ProductionRecord> = team_records.clone();
        by_points.sort_by(|a, b| b.season.points().cmp(&a.season.points()));

        let share = |r: Option<&&ProductionRecord>| match r {
            Some(r) if total_points > 0.0 => r.season.points() as f64 / total_points,
            _ => 0.0,
        };
        let top_share = share(by_points.first());
        let second_share = share(by_points.get(1));
        let top_id = by_points
            .first()
            .copied()
            .filter(|_| top_share > 0.0)
            .map(|r| r.player_id.as_str());

        Self {
            records: team_records
                .iter()
                .copied()
                .map(|r| (r.player_id.as_str(), r))
                .collect(),
            total_points,
            total_toi,
            toi_order: toi_order.into_iter().map(|r| r.player_id.as_str()).collect(),
            top_id,
            top_share,
            second_share,
        }
    }

    fn roster_size(&self) -> usize {
        self.records.len()
    }

    fn concentration_ratio(&self) -> f64 {
        if self.second_share > 0.0 {
            self.top_share / self.second_share
        } else if self.top_share > 0.0 {
            f64::MAX
        } else {
            1.0
        }
    }

    fn average_time_share(&self) -> f64 {
        if self.roster_size() == 0 {
            0.0
        } else {
            1.0 / self.roster_size() as f64
        }
    }
}

/// Quantifies the effect of unavailable players on team aggregates
#[derive(Debug, Clone, Default)]
pub struct ImpactQuantifier {
    config: ImpactConfig,
}

impl ImpactQuantifier {
    pub fn new(config: ImpactConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImpactConfig {
        &self.config
    }

    /// Importance score in [0, 1] from point share, ice-time rank and role
    pub fn importance(
        &self,
        production_share: f64,
        toi_rank: usize,
        roster_size: usize,
        position: Position,
    ) -> f64 {
        let c = &self.config;
        let share_score = if c.share_ceiling > 0.0 {
            (production_share.max(0.0) / c.share_ceiling).min(1.0)
        } else {
            0.0
        };
        let span = roster_size.saturating_sub(1).max(1) as f64;
        let rank_score = (1.0 - (toi_rank.saturating_sub(1)) as f64 / span).clamp(0.0, 1.0);
        let role = c.profile(position).role_weight;

        (c.share_weight * share_score + c.rank_weight * rank_score + c.role_weight * role)
            .clamp(0.0, 1.0)
    }

    fn player_adjustment(&self, score: f64, position: Position) -> Adjustments {
        let profile = self.config.profile(position);
        profile.max_impact.scaled(-(score * profile.multiplier))
    }

    /// Aggregate impact of `unavailable` players on `team`
    ///
    /// `records` may contain other teams' records; they are ignored.
    pub fn assess(
        &self,
        team: &str,
        unavailable: &[String],
        records: &[ProductionRecord],
    ) -> ScopeImpact {
        if unavailable.is_empty() {
            return ScopeImpact::empty(team);
        }

        let ctx = TeamContext::new(team, records);
        let mut players = Vec::with_capacity(unavailable.len());
        let mut lost_time_share = 0.0;

        for player_id in unavailable {
            let record = match ctx.records.get(player_id.as_str()) {
                Some(record) => {
                    let share = if ctx.total_points > 0.0 {
                        record.season.points() as f64 / ctx.total_points
                    } else {
                        0.0
                    };
                    let time_share = if ctx.total_toi > 0.0 {
                        record.toi_per_game.max(0.0) / ctx.total_toi
                    } else {
                        0.0
                    };
                    let rank = ctx
                        .toi_order
                        .iter()
                        .position(|id| *id == player_id.as_str())
                        .map(|i| i + 1)
                        .unwrap_or(ctx.roster_size());
                    let score =
                        self.importance(share, rank, ctx.roster_size(), record.position);

                    ImpactRecord {
                        player_id: player_id.clone(),
                        team: team.to_string(),
                        position: record.position,
                        importance: score,
                        tier: self.config.tier_for(score),
                        production_share: share,
                        time_share,
                        top_contributor: ctx.top_id == Some(player_id.as_str()),
                        placeholder: false,
                        adjustments: self.player_adjustment(score, record.position),
                    }
                }
                None => {
                    debug!(
                        "No production record for unavailable player {}, using placeholder",
                        player_id
                    );
                    let score = self.config.placeholder_score;
                    ImpactRecord {
                        player_id: player_id.clone(),
                        team: team.to_string(),
                        position: Position::Wing,
                        importance: score,
                        tier: self.config.tier_for(score),
                        production_share: 0.0,
                        time_share: ctx.average_time_share(),
                        top_contributor: false,
                        placeholder: true,
                        adjustments: self.player_adjustment(score, Position::Wing),
                    }
                }
            };

            lost_time_share += record.time_share;
            players.push(record);
        }

        let compounding = self.config.compounding(players.len(), lost_time_share);
        let ratio = ctx.concentration_ratio();
        let concentration_factor = if players.iter().any(|p| p.top_contributor) {
            if ctx.second_share < self.config.secondary_share_floor
                || ratio >= self.config.thin_ratio
            {
                self.config.thin_concentration_factor
            } else {
                self.config.concentration_factor
            }
        } else {
            1.0
        };

        let raw = players
            .iter()
            .fold(Adjustments::default(), |acc, p| acc + p.adjustments);
        let adjustments = self.config.clamp(raw.scaled(compounding * concentration_factor));

        debug!(
            "{}: {} unavailable, compounding {:.2}, concentration {:.2}, win delta {:.3}",
            team,
            players.len(),
            compounding,
            concentration_factor,
            adjustments.win_probability
        );

        ScopeImpact {
            team: team.to_string(),
            players,
            compounding,
            concentration_ratio: ratio.min(99.0),
            concentration_factor,
            lost_time_share,
            adjustments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_core::OutcomeCounts;

    fn record(id: &str, position: Position, points: u32, toi: f64) -> ProductionRecord {
        ProductionRecord {
            player_id: id.to_string(),
            name: id.to_uppercase(),
            team: "EDM".to_string(),
            position,
            season: OutcomeCounts {
                games: 40,
                goals: points / 2,
                assists: points - points / 2,
                shots: 100,
            },
            recent: OutcomeCounts::default(),
            toi_per_game: toi,
            pp_toi_per_game: 2.0,
        }
    }

    fn roster() -> Vec<ProductionRecord> {
        vec![
            record("c1", Position::Center, 60, 22.0),
            record("c2", Position::Center, 50, 21.0),
            record("w1", Position::Wing, 30, 18.0),
            record("w2", Position::Wing, 20, 16.0),
            record("d1", Position::Defense, 25, 24.0),
            record("d2", Position::Defense, 10, 20.0),
            record("w3", Position::Wing, 5, 10.0),
        ]
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_nobody_missing_is_neutral() {
        let impact = ImpactQuantifier::default().assess("EDM", &[], &roster());
        assert!(impact.adjustments.is_zero());
        assert_eq!(impact.compounding, 1.0);
    }

    #[test]
    fn test_tiers_follow_thresholds() {
        let config = ImpactConfig::default();
        assert_eq!(config.tier_for(0.95), 1);
        assert_eq!(config.tier_for(0.80), 1);
        assert_eq!(config.tier_for(0.65), 2);
        assert_eq!(config.tier_for(0.45), 3);
        assert_eq!(config.tier_for(0.25), 4);
        assert_eq!(config.tier_for(0.05), 5);
    }

    #[test]
    fn test_compounding_non_decreasing() {
        let config = ImpactConfig::default();
        let mut last = 0.0;
        for count in 0..10 {
            let step = config.compounding(count, 0.0);
            assert!(step >= last, "count {} gave {} after {}", count, step, last);
            last = step;
        }
        assert!(config.compounding(2, 0.5) > config.compounding(2, 0.1));
    }

    #[test]
    fn test_top_contributor_is_tier_one() {
        let impact = ImpactQuantifier::default().assess("EDM", &ids(&["c1"]), &roster());
        let player = &impact.players[0];
        assert_eq!(player.tier, 1);
        assert!(player.top_contributor);
        assert!(!player.placeholder);
        assert!(impact.adjustments.win_probability < 0.0);
        // Second share is close, so the regular concentration factor applies
        assert_eq!(impact.concentration_factor, 1.25);
    }

    #[test]
    fn test_two_tier_one_absences_compound() {
        let quantifier = ImpactQuantifier::default();
        let one = quantifier.assess("EDM", &ids(&["c1"]), &roster());
        let other = quantifier.assess("EDM", &ids(&["c2"]), &roster());
        let both = quantifier.assess("EDM", &ids(&["c1", "c2"]), &roster());

        assert!(both.players.iter().all(|p| p.tier == 1));
        assert!(both.compounding > one.compounding);
        assert!(both.compounding > other.compounding);
        assert!(both.adjustments.expected_goals < one.adjustments.expected_goals);
    }

    #[test]
    fn test_thin_team_uses_higher_concentration() {
        let records = vec![
            record("star", Position::Center, 80, 21.0),
            record("a", Position::Wing, 20, 17.0),
            record("b", Position::Wing, 15, 15.0),
        ];
        let impact = ImpactQuantifier::default().assess("EDM", &ids(&["star"]), &records);
        assert_eq!(impact.concentration_factor, 1.45);
    }

    #[test]
    fn test_missing_record_gets_placeholder() {
        let impact = ImpactQuantifier::default().assess("EDM", &ids(&["ghost"]), &roster());
        let player = &impact.players[0];
        assert!(player.placeholder);
        assert!((player.importance - 0.30).abs() < 1e-12);
        assert!(impact.adjustments.win_probability < 0.0);
    }

    #[test]
    fn test_adjustments_stay_clamped_under_extremes() {
        let quantifier = ImpactQuantifier::default();
        let bounds = quantifier.config().bounds;

        for size in [1usize, 2, 5, 20, 60] {
            let records: Vec<ProductionRecord> = (0..size)
                .map(|i| {
                    let position = match i % 4 {
                        0 => Position::Goalie,
                        1 => Position::Center,
                        2 => Position::Defense,
                        _ => Position::Wing,
                    };
                    let points = (i as u32 * 37) % 200;
                    let toi = (i as f64 * 7.3) % 30.0;
                    record(&format!("p{}", i), position, points, toi)
                })
                .collect();
            let mut missing: Vec<String> = records.iter().map(|r| r.player_id.clone()).collect();
            missing.push("unknown-1".to_string());
            missing.push("unknown-2".to_string());

            let impact = quantifier.assess("EDM", &missing, &records);
            let a = impact.adjustments;
            assert!(a.win_probability.abs() <= bounds.win_probability + 1e-12);
            assert!(a.power_play.abs() <= bounds.power_play + 1e-12);
            assert!(a.expected_goals.abs() <= bounds.expected_goals + 1e-12);
            assert!(impact.players.iter().all(|p| (0.0..=1.0).contains(&p.importance)));
        }
    }
}
