//! Market quotes and bet verdicts

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Forecast, OutcomeType};

/// Convert American odds to the probability they imply
///
/// Odds strictly between -100 and +100 are not valid American odds.
pub fn implied_from_american(odds: i32) -> Option<f64> {
    if odds >= 100 {
        Some(100.0 / (odds as f64 + 100.0))
    } else if odds <= -100 {
        let risk = -(odds as f64);
        Some(risk / (risk + 100.0))
    } else {
        None
    }
}

/// Net payout per unit staked at the given American odds
pub fn net_payout(odds: i32) -> Option<f64> {
    if odds >= 100 {
        Some(odds as f64 / 100.0)
    } else if odds <= -100 {
        Some(100.0 / -(odds as f64))
    } else {
        None
    }
}

/// A published line for one player and outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub player_id: String,
    pub outcome: OutcomeType,
    /// Line to clear, e.g. 0.5 for "anytime", 2.5 for shots
    pub line: Decimal,
    /// American odds on the over
    pub over_price: i32,
    /// American odds on the under, when the book quotes both sides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub under_price: Option<i32>,
}

impl MarketQuote {
    pub fn line_value(&self) -> f64 {
        self.line.to_f64().unwrap_or(0.5)
    }

    /// Probability implied by the over price
    ///
    /// When both sides are quoted the bookmaker margin is removed
    /// proportionally.
    pub fn implied_probability(&self) -> Option<f64> {
        let over = implied_from_american(self.over_price)?;
        match self.under_price.and_then(implied_from_american) {
            Some(under) if over + under > 0.0 => Some(over / (over + under)),
            _ => Some(over),
        }
    }
}

/// Recommendation tier, ordered worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    None,
    Lean,
    Standard,
    Strong,
    Best,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::None => "none",
            Tier::Lean => "lean",
            Tier::Standard => "standard",
            Tier::Strong => "strong",
            Tier::Best => "best",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classified comparison of a forecast against the market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetVerdict {
    pub forecast: Forecast,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<MarketQuote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implied_probability: Option<f64>,
    /// Model probability minus implied probability
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge: Option<f64>,
    pub tier: Tier,
    /// Fractional-Kelly multiplier for the tier (never full Kelly)
    pub stake_fraction: f64,
    /// Suggested share of bankroll: full Kelly times `stake_fraction`, capped
    pub bankroll_fraction: f64,
    /// Edge is implausibly large and needs a human look before acting
    pub requires_review: bool,
    pub rationale: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_american_odds_conversion() {
        assert_eq!(implied_from_american(100), Some(0.5));
        assert!((implied_from_american(-150).unwrap() - 0.6).abs() < 1e-12);
        assert!((implied_from_american(300).unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(implied_from_american(50), None);
    }

    #[test]
    fn test_net_payout() {
        assert_eq!(net_payout(150), Some(1.5));
        assert_eq!(net_payout(-200), Some(0.5));
        assert_eq!(net_payout(0), None);
    }

    #[test]
    fn test_quote_removes_vig() {
        let quote = MarketQuote {
            player_id: "8478402".to_string(),
            outcome: OutcomeType::Shots,
            line: dec!(2.5),
            over_price: -110,
            under_price: Some(-110),
        };
        assert!((quote.implied_probability().unwrap() - 0.5).abs() < 1e-12);
        assert!((quote.line_value() - 2.5).abs() < 1e-12);

        let one_sided = MarketQuote {
            under_price: None,
            ..quote
        };
        assert!(one_sided.implied_probability().unwrap() > 0.52);
    }

    #[test]
    fn test_tier_order() {
        assert!(Tier::Best > Tier::Strong);
        assert!(Tier::Strong > Tier::Standard);
        assert!(Tier::Standard > Tier::Lean);
        assert!(Tier::Lean > Tier::None);
    }
}
