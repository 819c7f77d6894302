//! Decision classification
//!
//! Compares a forecast to the market, assigns a recommendation tier from a
//! declarative per-outcome threshold table and sizes a fractional-Kelly stake.

use std::collections::HashMap;
use tracing::debug;

use edge_core::{net_payout, BetVerdict, Forecast, MarketQuote, OutcomeType, Tier};

/// Tolerance so an edge of exactly the threshold clears it
const EDGE_EPSILON: f64 = 1e-9;
/// Quote and forecast lines closer than this are the same line
const LINE_EPSILON: f64 = 1e-6;

/// Requirements for one tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRow {
    pub tier: Tier,
    pub min_edge: f64,
    pub min_confidence: f64,
    pub min_games: u32,
}

/// Ordered tier requirements for one outcome type, best tier first
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    pub rows: Vec<ThresholdRow>,
    /// Minimum model probability for a lean when no line is quoted
    pub unquoted_min_probability: f64,
}

impl ThresholdTable {
    /// Default table for an outcome type
    ///
    /// Higher-variance outcomes need larger edges; the confidence and sample
    /// gates are shared.
    pub fn standard(outcome: OutcomeType) -> Self {
        let (edges, unquoted_min_probability) = match outcome {
            OutcomeType::Goals | OutcomeType::Assists => ([0.10, 0.07, 0.05, 0.03], 0.40),
            OutcomeType::Points => ([0.08, 0.06, 0.04, 0.02], 0.55),
            OutcomeType::Shots => ([0.06, 0.045, 0.03, 0.015], 0.60),
        };
        let gates = [
            (Tier::Best, 0.70, 20),
            (Tier::Strong, 0.65, 15),
            (Tier::Standard, 0.60, 10),
            (Tier::Lean, 0.55, 5),
        ];

        let rows = gates
            .iter()
            .zip(edges)
            .map(|(&(tier, min_confidence, min_games), min_edge)| ThresholdRow {
                tier,
                min_edge,
                min_confidence,
                min_games,
            })
            .collect();

        Self {
            rows,
            unquoted_min_probability,
        }
    }

    /// Best tier whose row is satisfied
    pub fn classify(&self, edge: f64, confidence: f64, games: u32) -> Option<&ThresholdRow> {
        self.rows.iter().find(|row| {
            edge + EDGE_EPSILON >= row.min_edge
                && confidence >= row.min_confidence
                && games >= row.min_games
        })
    }
}

/// Fractional-Kelly multiplier per tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StakeSchedule {
    pub best: f64,
    pub strong: f64,
    pub standard: f64,
    pub lean: f64,
}

impl Default for StakeSchedule {
    fn default() -> Self {
        Self {
            best: 0.50,
            strong: 0.35,
            standard: 0.25,
            lean: 0.10,
        }
    }
}

impl StakeSchedule {
    pub fn fraction(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Best => self.best,
            Tier::Strong => self.strong,
            Tier::Standard => self.standard,
            Tier::Lean => self.lean,
            Tier::None => 0.0,
        }
    }
}

/// Tunable constants for classification
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionConfig {
    pub tables: HashMap<OutcomeType, ThresholdTable>,
    pub stakes: StakeSchedule,
    /// Edges above this are flagged for review and not staked
    pub suspicious_edge: f64,
    /// Cap on the suggested share of bankroll
    pub max_bankroll_fraction: f64,
    pub unquoted_min_confidence: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            tables: OutcomeType::ALL
                .iter()
                .map(|o| (*o, ThresholdTable::standard(*o)))
                .collect(),
            stakes: StakeSchedule::default(),
            suspicious_edge: 0.25,
            max_bankroll_fraction: 0.05,
            unquoted_min_confidence: 0.65,
        }
    }
}

/// Full Kelly fraction for a binary bet at American odds
///
/// `f* = (b*p - q) / b`, never negative.
pub fn full_kelly(probability: f64, american_odds: i32) -> f64 {
    match net_payout(american_odds) {
        Some(b) if b > 0.0 => ((b * probability - (1.0 - probability)) / b).max(0.0),
        _ => 0.0,
    }
}

/// Whether a quote prices the same line a forecast was made at
pub fn same_line(forecast: &Forecast, quote: &MarketQuote) -> bool {
    (quote.line_value() - forecast.line).abs() < LINE_EPSILON
}

fn mismatched_line(forecast: &Forecast, quote: &MarketQuote) -> BetVerdict {
    BetVerdict {
        forecast: forecast.clone(),
        quote: Some(quote.clone()),
        implied_probability: None,
        edge: None,
        tier: Tier::None,
        stake_fraction: 0.0,
        bankroll_fraction: 0.0,
        requires_review: false,
        rationale: format!(
            "quoted line {} does not match forecast line {}",
            quote.line, forecast.line
        ),
    }
}

/// Generic edge classifier driven by [`ThresholdTable`]s
#[derive(Debug, Clone, Default)]
pub struct DecisionClassifier {
    config: DecisionConfig,
}

impl DecisionClassifier {
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    fn table(&self, outcome: OutcomeType) -> ThresholdTable {
        self.config
            .tables
            .get(&outcome)
            .cloned()
            .unwrap_or_else(|| ThresholdTable::standard(outcome))
    }

    /// Classify a forecast against an optional market quote
    ///
    /// A quote posted at a different line than the forecast prices a
    /// different event and is rejected.
    pub fn classify(&self, forecast: &Forecast, quote: Option<&MarketQuote>) -> BetVerdict {
        let table = self.table(forecast.outcome);

        let verdict = match quote {
            Some(quote) if !same_line(forecast, quote) => mismatched_line(forecast, quote),
            Some(quote) => match quote.implied_probability() {
                Some(implied) => self.classify_priced(forecast, quote, implied, &table),
                None => self.classify_unpriced(forecast, Some(quote), &table),
            },
            None => self.classify_unpriced(forecast, None, &table),
        };

        debug!(
            "{} {} {}: tier {} ({})",
            forecast.name, forecast.outcome, forecast.line, verdict.tier, verdict.rationale
        );
        verdict
    }

    fn classify_priced(
        &self,
        forecast: &Forecast,
        quote: &MarketQuote,
        implied: f64,
        table: &ThresholdTable,
    ) -> BetVerdict {
        let edge = forecast.probability - implied;
        let row = table.classify(edge, forecast.confidence, forecast.games_played);
        let tier = row.map(|r| r.tier).unwrap_or(Tier::None);
        let requires_review = edge > self.config.suspicious_edge;

        let (stake_fraction, bankroll_fraction) = if requires_review {
            (0.0, 0.0)
        } else {
            let fraction = self.config.stakes.fraction(tier);
            let kelly = full_kelly(forecast.probability, quote.over_price);
            (
                fraction,
                (kelly * fraction).min(self.config.max_bankroll_fraction),
            )
        };

        let rationale = match row {
            _ if requires_review => format!(
                "edge {:.1}% exceeds review ceiling {:.1}%",
                edge * 100.0,
                self.config.suspicious_edge * 100.0
            ),
            Some(row) => format!(
                "edge {:.1}% vs implied {:.1}% clears {} minimum {:.1}%",
                edge * 100.0,
                implied * 100.0,
                row.tier,
                row.min_edge * 100.0
            ),
            None => format!(
                "edge {:.1}% vs implied {:.1}% below every tier",
                edge * 100.0,
                implied * 100.0
            ),
        };

        BetVerdict {
            forecast: forecast.clone(),
            quote: Some(quote.clone()),
            implied_probability: Some(implied),
            edge: Some(edge),
            tier,
            stake_fraction,
            bankroll_fraction,
            requires_review,
            rationale,
        }
    }

    fn classify_unpriced(
        &self,
        forecast: &Forecast,
        quote: Option<&MarketQuote>,
        table: &ThresholdTable,
    ) -> BetVerdict {
        let qualifies = forecast.probability >= table.unquoted_min_probability
            && forecast.confidence >= self.config.unquoted_min_confidence;
        let tier = if qualifies && quote.is_none() {
            Tier::Lean
        } else {
            Tier::None
        };

        let rationale = match (quote.is_some(), qualifies) {
            (true, _) => "quoted price is not valid American odds".to_string(),
            (false, true) => format!(
                "no line; probability {:.1}% and confidence {:.2} support a lean",
                forecast.probability * 100.0,
                forecast.confidence
            ),
            (false, false) => "no line and probability or confidence too low".to_string(),
        };

        BetVerdict {
            forecast: forecast.clone(),
            quote: quote.cloned(),
            implied_probability: None,
            edge: None,
            tier,
            stake_fraction: self.config.stakes.fraction(tier),
            bankroll_fraction: 0.0,
            requires_review: false,
            rationale,
        }
    }
}
