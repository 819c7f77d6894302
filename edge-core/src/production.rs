//! Player production and team aggregate records
//!
//! These are the fully-populated internal records produced by the feed
//! normalizers. Downstream logic never handles partial data.

use serde::{Deserialize, Serialize};

use crate::OutcomeType;

/// Skater / goaltender position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Center,
    Wing,
    Defense,
    Goalie,
}

impl Position {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "C" | "CENTER" => Some(Position::Center),
            "L" | "R" | "LW" | "RW" | "W" | "WING" | "F" => Some(Position::Wing),
            "D" | "DEFENSE" | "DEFENCE" => Some(Position::Defense),
            "G" | "GOALIE" => Some(Position::Goalie),
            _ => None,
        }
    }
}

/// Per-outcome counters over some window of games
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub games: u32,
    pub goals: u32,
    pub assists: u32,
    pub shots: u32,
}

impl OutcomeCounts {
    /// Raw count of an outcome within the window
    pub fn count(&self, outcome: OutcomeType) -> u32 {
        match outcome {
            OutcomeType::Goals => self.goals,
            OutcomeType::Assists => self.assists,
            OutcomeType::Points => self.points(),
            OutcomeType::Shots => self.shots,
        }
    }

    /// Per-game rate of an outcome, zero for an empty window
    pub fn rate(&self, outcome: OutcomeType) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.count(outcome) as f64 / self.games as f64
    }

    pub fn points(&self) -> u32 {
        self.goals.saturating_add(self.assists)
    }
}

/// Entity production record for a single player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    /// Player identifier
    pub player_id: String,
    /// Display name
    pub name: String,
    /// Team abbreviation
    pub team: String,
    pub position: Position,
    /// Season-to-date counters
    pub season: OutcomeCounts,
    /// Recent window counters (typically the last 10 games)
    pub recent: OutcomeCounts,
    /// Average time on ice per game, minutes
    pub toi_per_game: f64,
    /// Average power-play time on ice per game, minutes
    pub pp_toi_per_game: f64,
}

impl ProductionRecord {
    pub fn games_played(&self) -> u32 {
        self.season.games
    }

    pub fn season_rate(&self, outcome: OutcomeType) -> f64 {
        self.season.rate(outcome)
    }

    /// Recent per-game rate, falling back to the season rate for an empty window
    pub fn recent_rate(&self, outcome: OutcomeType) -> f64 {
        if self.recent.games == 0 {
            self.season.rate(outcome)
        } else {
            self.recent.rate(outcome)
        }
    }
}

/// Team-level aggregate record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeAggregate {
    /// Team abbreviation
    pub team: String,
    pub games_played: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub shots_against: u32,
    /// Power-play conversion, 0.0 - 1.0
    pub power_play_pct: f64,
    /// Penalty-kill success, 0.0 - 1.0
    pub penalty_kill_pct: f64,
}

impl ScopeAggregate {
    pub fn goals_for_per_game(&self) -> f64 {
        per_game(self.goals_for, self.games_played)
    }

    pub fn goals_against_per_game(&self) -> f64 {
        per_game(self.goals_against, self.games_played)
    }

    pub fn shots_against_per_game(&self) -> f64 {
        per_game(self.shots_against, self.games_played)
    }

    /// Rate this team allows for an outcome type
    pub fn allowed_rate(&self, outcome: OutcomeType) -> f64 {
        match outcome {
            OutcomeType::Shots => self.shots_against_per_game(),
            _ => self.goals_against_per_game(),
        }
    }
}

fn per_game(count: u32, games: u32) -> f64 {
    if games == 0 {
        0.0
    } else {
        count as f64 / games as f64
    }
}

/// League-wide averages used as the neutral reference for modifiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeagueAverages {
    pub goals_against_per_game: f64,
    pub shots_against_per_game: f64,
    pub save_pct: f64,
}

impl Default for LeagueAverages {
    fn default() -> Self {
        Self {
            goals_against_per_game: 3.0,
            shots_against_per_game: 30.0,
            save_pct: 0.905,
        }
    }
}

impl LeagueAverages {
    /// Average every team's allowed rates; empty input yields the defaults
    pub fn from_aggregates(aggregates: &[ScopeAggregate]) -> Self {
        let played: Vec<&ScopeAggregate> =
            aggregates.iter().filter(|a| a.games_played > 0).collect();
        if played.is_empty() {
            return Self::default();
        }

        let n = played.len() as f64;
        let goals_against = played.iter().map(|a| a.goals_against_per_game()).sum::<f64>() / n;
        let shots_against = played.iter().map(|a| a.shots_against_per_game()).sum::<f64>() / n;

        let total_shots: f64 = played.iter().map(|a| a.shots_against as f64).sum();
        let total_goals: f64 = played.iter().map(|a| a.goals_against as f64).sum();
        let save_pct = if total_shots > 0.0 {
            (1.0 - total_goals / total_shots).clamp(0.0, 1.0)
        } else {
            Self::default().save_pct
        };

        Self {
            goals_against_per_game: goals_against,
            shots_against_per_game: shots_against,
            save_pct,
        }
    }

    pub fn allowed_rate(&self, outcome: OutcomeType) -> f64 {
        match outcome {
            OutcomeType::Shots => self.shots_against_per_game,
            _ => self.goals_against_per_game,
        }
    }
}

/// Projected starting goaltender for a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalieStart {
    pub team: String,
    pub goalie_id: String,
    pub save_pct: f64,
}

/// A scheduled game between two teams
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Matchup {
    pub home: String,
    pub away: String,
}

impl Matchup {
    pub fn new(home: impl Into<String>, away: impl Into<String>) -> Self {
        Self {
            home: home.into(),
            away: away.into(),
        }
    }

    /// Opponent of the given team in this game
    pub fn opponent_of(&self, team: &str) -> Option<&str> {
        if self.home == team {
            Some(&self.away)
        } else if self.away == team {
            Some(&self.home)
        } else {
            None
        }
    }

    pub fn is_home(&self, team: &str) -> bool {
        self.home == team
    }

    /// Two distinct, named teams
    pub fn is_valid(&self) -> bool {
        !self.home.is_empty() && !self.away.is_empty() && self.home != self.away
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(team: &str, games: u32, ga: u32, sa: u32) -> ScopeAggregate {
        ScopeAggregate {
            team: team.to_string(),
            games_played: games,
            goals_for: 0,
            goals_against: ga,
            shots_against: sa,
            power_play_pct: 0.2,
            penalty_kill_pct: 0.8,
        }
    }

    #[test]
    fn test_recent_rate_falls_back_to_season() {
        let record = ProductionRecord {
            player_id: "1".to_string(),
            name: "Skater".to_string(),
            team: "BOS".to_string(),
            position: Position::Wing,
            season: OutcomeCounts { games: 10, goals: 3, assists: 2, shots: 25 },
            recent: OutcomeCounts::default(),
            toi_per_game: 15.0,
            pp_toi_per_game: 0.0,
        };
        assert!((record.recent_rate(OutcomeType::Goals) - 0.3).abs() < 1e-12);
        assert!((record.season_rate(OutcomeType::Points) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_league_averages() {
        let teams = vec![aggregate("A", 10, 20, 300), aggregate("B", 10, 40, 300)];
        let league = LeagueAverages::from_aggregates(&teams);
        assert!((league.goals_against_per_game - 3.0).abs() < 1e-12);
        assert!((league.shots_against_per_game - 30.0).abs() < 1e-12);
        assert!((league.save_pct - 0.9).abs() < 1e-12);

        assert_eq!(LeagueAverages::from_aggregates(&[]), LeagueAverages::default());
    }

    #[test]
    fn test_matchup_opponent() {
        let game = Matchup::new("BOS", "TOR");
        assert_eq!(game.opponent_of("BOS"), Some("TOR"));
        assert_eq!(game.opponent_of("TOR"), Some("BOS"));
        assert_eq!(game.opponent_of("MTL"), None);
        assert!(game.is_home("BOS"));
    }

    #[test]
    fn test_counters_near_limit_do_not_overflow() {
        let counts = OutcomeCounts {
            games: 10,
            goals: u32::MAX,
            assists: 1,
            shots: 0,
        };
        assert_eq!(counts.points(), u32::MAX);
        assert_eq!(counts.count(OutcomeType::Points), u32::MAX);
        assert!(counts.rate(OutcomeType::Points).is_finite());

        let teams = vec![aggregate("A", 10, u32::MAX, u32::MAX), aggregate("B", 10, 5, 50)];
        let league = LeagueAverages::from_aggregates(&teams);
        assert!((0.0..=1.0).contains(&league.save_pct));
    }

    #[test]
    fn test_matchup_validity() {
        assert!(Matchup::new("BOS", "TOR").is_valid());
        assert!(!Matchup::new("BOS", "BOS").is_valid());
        assert!(!Matchup::new("", "TOR").is_valid());
    }

    #[test]
    fn test_position_codes() {
        assert_eq!(Position::from_code("rw"), Some(Position::Wing));
        assert_eq!(Position::from_code("G"), Some(Position::Goalie));
        assert_eq!(Position::from_code("?"), None);
    }
}
