//! Outcome types that can be forecast

use serde::{Deserialize, Serialize};
use std::fmt;

/// A count-valued player outcome with a quoted line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeType {
    /// Goals scored
    Goals,
    /// Assists recorded
    Assists,
    /// Goals + assists
    Points,
    /// Shots on goal
    Shots,
}

/// How an outcome type's count is distributed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    /// Rare counts, modeled with a Poisson mass function
    Poisson,
    /// High-frequency counts, modeled with a normal approximation
    Normal,
}

impl OutcomeType {
    pub const ALL: [OutcomeType; 4] = [
        OutcomeType::Goals,
        OutcomeType::Assists,
        OutcomeType::Points,
        OutcomeType::Shots,
    ];

    /// Distribution used when converting an expected count to a probability
    pub fn distribution(&self) -> Distribution {
        match self {
            OutcomeType::Shots => Distribution::Normal,
            _ => Distribution::Poisson,
        }
    }

    /// Whether the opposing goaltender's quality affects this outcome
    pub fn faces_goaltender(&self) -> bool {
        !matches!(self, OutcomeType::Shots)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeType::Goals => "goals",
            OutcomeType::Assists => "assists",
            OutcomeType::Points => "points",
            OutcomeType::Shots => "shots",
        }
    }
}

impl fmt::Display for OutcomeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OutcomeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "goals" | "goal" | "anytime" => Ok(OutcomeType::Goals),
            "assists" | "assist" => Ok(OutcomeType::Assists),
            "points" | "point" => Ok(OutcomeType::Points),
            "shots" | "sog" | "shots_on_goal" => Ok(OutcomeType::Shots),
            _ => Err(format!("Unknown outcome type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_parsing() {
        assert_eq!("goals".parse::<OutcomeType>(), Ok(OutcomeType::Goals));
        assert_eq!("SOG".parse::<OutcomeType>(), Ok(OutcomeType::Shots));
        assert_eq!("point".parse::<OutcomeType>(), Ok(OutcomeType::Points));
        assert!("saves".parse::<OutcomeType>().is_err());
    }

    #[test]
    fn test_distribution() {
        assert_eq!(OutcomeType::Goals.distribution(), Distribution::Poisson);
        assert_eq!(OutcomeType::Shots.distribution(), Distribution::Normal);
        assert!(!OutcomeType::Shots.faces_goaltender());
    }
}
