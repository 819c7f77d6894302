//! Feed API response types
//!
//! These types mirror the stats/odds API payloads, where almost every field is
//! optional or loosely typed, and are normalized into fully-populated
//! edge-core records. Each normalizer applies per-field fallback defaults and
//! only rejects a record when it has no usable identifier.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use edge_core::{
    GoalieStart, MarketQuote, OutcomeCounts, OutcomeType, Position, ProductionRecord,
    ScopeAggregate, StatusReport,
};

use crate::status::parse_status;

/// Render an id that may arrive as a JSON string or number
fn id_from_value(value: &Option<serde_json::Value>) -> Option<String> {
    match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a time-on-ice value given either as "MM:SS" or as decimal minutes
pub fn parse_toi(value: &Option<serde_json::Value>) -> f64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0).max(0.0),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            if let Some((mins, secs)) = s.split_once(':') {
                let mins = mins.trim().parse::<f64>().unwrap_or(0.0);
                let secs = secs.trim().parse::<f64>().unwrap_or(0.0);
                (mins + secs / 60.0).max(0.0)
            } else {
                s.parse::<f64>().unwrap_or(0.0).max(0.0)
            }
        }
        _ => 0.0,
    }
}

/// Parse a percentage given as 0.0-1.0 or 0-100
fn parse_pct(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 1.0 && v <= 100.0 => v / 100.0,
        Some(v) if v.is_finite() && (0.0..=1.0).contains(&v) => v,
        _ => default,
    }
}

/// Largest line any player prop is posted at
pub const MAX_LINE: i64 = 100;

fn non_negative(value: Option<i64>) -> u32 {
    value.unwrap_or(0).clamp(0, u32::MAX as i64) as u32
}

/// Injury report entry
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatusEntry {
    #[serde(default)]
    pub player_id: Option<serde_json::Value>,
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RawStatusEntry {
    pub fn to_status_report(&self) -> Option<StatusReport> {
        let player_id = id_from_value(&self.player_id)?;
        Some(StatusReport {
            name: self.player_name.clone().unwrap_or_else(|| player_id.clone()),
            team: self.team.clone().unwrap_or_default().to_uppercase(),
            status: parse_status(self.status.as_deref().unwrap_or("")),
            detail: self.detail.clone().unwrap_or_default(),
            updated_at: self.updated_at,
            player_id,
        })
    }
}

/// Player prop line
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuote {
    #[serde(default)]
    pub player_id: Option<serde_json::Value>,
    /// Line as a number or string ("0.5")
    #[serde(default)]
    pub line: Option<serde_json::Value>,
    #[serde(default)]
    pub over_price: Option<i32>,
    #[serde(default)]
    pub under_price: Option<i32>,
}

impl RawQuote {
    /// Normalize into a quote for `outcome`
    ///
    /// Quotes without an over price cannot be priced and are dropped, as are
    /// unreadable lines and lines outside `0..=MAX_LINE`. A missing line
    /// defaults to 0.5.
    pub fn to_market_quote(&self, outcome: OutcomeType) -> Option<MarketQuote> {
        let player_id = id_from_value(&self.player_id)?;
        let over_price = self.over_price?;

        let line = match &self.line {
            None | Some(serde_json::Value::Null) => Decimal::new(5, 1),
            Some(serde_json::Value::Number(n)) => {
                let text = n.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .ok()?
            }
            Some(serde_json::Value::String(s)) => Decimal::from_str(s.trim()).ok()?,
            Some(_) => return None,
        };
        if line.is_sign_negative() || line > Decimal::from(MAX_LINE) {
            return None;
        }

        Some(MarketQuote {
            player_id,
            outcome,
            line,
            over_price,
            under_price: self.under_price,
        })
    }
}

/// Roster entry
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRosterEntry {
    #[serde(default)]
    pub player_id: Option<serde_json::Value>,
}

impl RawRosterEntry {
    pub fn id(&self) -> Option<String> {
        id_from_value(&self.player_id)
    }
}

/// Counters for one window of games
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCounts {
    #[serde(default)]
    pub games_played: Option<i64>,
    #[serde(default)]
    pub goals: Option<i64>,
    #[serde(default)]
    pub assists: Option<i64>,
    #[serde(default)]
    pub shots: Option<i64>,
}

impl RawCounts {
    fn to_counts(&self) -> OutcomeCounts {
        OutcomeCounts {
            games: non_negative(self.games_played),
            goals: non_negative(self.goals),
            assists: non_negative(self.assists),
            shots: non_negative(self.shots),
        }
    }
}

/// Player season + recent stats
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlayerStats {
    #[serde(default)]
    pub player_id: Option<serde_json::Value>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub season: Option<RawCounts>,
    #[serde(default)]
    pub last_ten: Option<RawCounts>,
    #[serde(default)]
    pub toi_per_game: Option<serde_json::Value>,
    #[serde(default)]
    pub pp_toi_per_game: Option<serde_json::Value>,
}

impl RawPlayerStats {
    pub fn to_production_record(&self) -> Option<ProductionRecord> {
        let player_id = id_from_value(&self.player_id)?;

        let season = self.season.clone().unwrap_or_default().to_counts();
        let mut recent = self.last_ten.clone().unwrap_or_default().to_counts();
        // A recent window can never be larger than the season
        if recent.games > season.games {
            recent = OutcomeCounts::default();
        }

        Some(ProductionRecord {
            name: self.full_name.clone().unwrap_or_else(|| player_id.clone()),
            team: self.team.clone().unwrap_or_default().to_uppercase(),
            position: self
                .position
                .as_deref()
                .and_then(Position::from_code)
                .unwrap_or(Position::Wing),
            season,
            recent,
            toi_per_game: parse_toi(&self.toi_per_game),
            pp_toi_per_game: parse_toi(&self.pp_toi_per_game),
            player_id,
        })
    }
}

/// Team stats
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTeamStats {
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub games_played: Option<i64>,
    #[serde(default)]
    pub goals_for: Option<i64>,
    #[serde(default)]
    pub goals_against: Option<i64>,
    #[serde(default)]
    pub shots_against: Option<i64>,
    #[serde(default)]
    pub power_play_pct: Option<f64>,
    #[serde(default)]
    pub penalty_kill_pct: Option<f64>,
}

impl RawTeamStats {
    pub fn to_scope_aggregate(&self) -> Option<ScopeAggregate> {
        let team = self.team.as_ref().map(|t| t.trim().to_uppercase()).filter(|t| !t.is_empty())?;
        Some(ScopeAggregate {
            team,
            games_played: non_negative(self.games_played),
            goals_for: non_negative(self.goals_for),
            goals_against: non_negative(self.goals_against),
            shots_against: non_negative(self.shots_against),
            power_play_pct: parse_pct(self.power_play_pct, 0.2),
            penalty_kill_pct: parse_pct(self.penalty_kill_pct, 0.8),
        })
    }
}

/// Projected starting goaltender
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGoalieStart {
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub goalie_id: Option<serde_json::Value>,
    #[serde(default)]
    pub save_pct: Option<f64>,
}

impl RawGoalieStart {
    /// Normalize; a missing save percentage falls back to `league_save_pct`
    pub fn to_goalie_start(&self, league_save_pct: f64) -> Option<GoalieStart> {
        let team = self.team.as_ref().map(|t| t.trim().to_uppercase()).filter(|t| !t.is_empty())?;
        Some(GoalieStart {
            team,
            goalie_id: id_from_value(&self.goalie_id).unwrap_or_default(),
            save_pct: parse_pct(self.save_pct, league_save_pct),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_core::AvailabilityStatus;
    use rust_decimal_macros::dec;

    #[test]
    fn test_player_stats_defaults() {
        let raw: RawPlayerStats = serde_json::from_str(
            r#"{
                "playerId": 8478402,
                "team": "edm",
                "position": "C",
                "season": {"gamesPlayed": 40, "goals": 20, "assists": 30},
                "lastTen": {"gamesPlayed": 10, "goals": 6},
                "toiPerGame": "21:30",
                "ppToiPerGame": 3.25
            }"#,
        )
        .unwrap();

        let record = raw.to_production_record().unwrap();
        assert_eq!(record.player_id, "8478402");
        assert_eq!(record.name, "8478402");
        assert_eq!(record.team, "EDM");
        assert_eq!(record.position, Position::Center);
        assert_eq!(record.season.shots, 0);
        assert_eq!(record.recent.goals, 6);
        assert_eq!(record.recent.assists, 0);
        assert!((record.toi_per_game - 21.5).abs() < 1e-9);
        assert!((record.pp_toi_per_game - 3.25).abs() < 1e-9);
    }

    #[test]
    fn test_record_without_id_is_rejected() {
        let raw: RawPlayerStats = serde_json::from_str(r#"{"fullName": "Nobody"}"#).unwrap();
        assert!(raw.to_production_record().is_none());
    }

    #[test]
    fn test_inconsistent_recent_window_dropped() {
        let raw: RawPlayerStats = serde_json::from_str(
            r#"{"playerId": "9", "season": {"gamesPlayed": 3}, "lastTen": {"gamesPlayed": 10, "goals": 5}}"#,
        )
        .unwrap();
        let record = raw.to_production_record().unwrap();
        assert_eq!(record.recent, OutcomeCounts::default());
        assert_eq!(record.position, Position::Wing);
    }

    #[test]
    fn test_quote_normalization() {
        let raw: RawQuote =
            serde_json::from_str(r#"{"playerId": "77", "line": "2.5", "overPrice": -120}"#).unwrap();
        let quote = raw.to_market_quote(OutcomeType::Shots).unwrap();
        assert_eq!(quote.line, dec!(2.5));
        assert_eq!(quote.under_price, None);

        let missing_line: RawQuote =
            serde_json::from_str(r#"{"playerId": "77", "overPrice": 250}"#).unwrap();
        assert_eq!(missing_line.to_market_quote(OutcomeType::Goals).unwrap().line, dec!(0.5));

        let unpriced: RawQuote = serde_json::from_str(r#"{"playerId": "77"}"#).unwrap();
        assert!(unpriced.to_market_quote(OutcomeType::Goals).is_none());

        for line in ["1e20", "-0.5", "100.5", "\"2.5x\""] {
            let absurd: RawQuote = serde_json::from_str(&format!(
                r#"{{"playerId": "77", "line": {}, "overPrice": 150}}"#,
                line
            ))
            .unwrap();
            assert!(absurd.to_market_quote(OutcomeType::Shots).is_none(), "{}", line);
        }
    }

    #[test]
    fn test_status_entry() {
        let raw: RawStatusEntry = serde_json::from_str(
            r#"{"playerId": "12", "playerName": "A Skater", "team": "tor", "status": "Out",
                "updatedAt": "2026-01-10T17:30:00Z"}"#,
        )
        .unwrap();
        let report = raw.to_status_report().unwrap();
        assert_eq!(report.status, AvailabilityStatus::Out);
        assert_eq!(report.team, "TOR");
        assert_eq!(report.detail, "");
        assert_eq!(
            report.updated_at.map(|t| t.to_rfc3339()),
            Some("2026-01-10T17:30:00+00:00".to_string())
        );
    }

    #[test]
    fn test_team_stats_percentages() {
        let raw: RawTeamStats = serde_json::from_str(
            r#"{"team": "bos", "gamesPlayed": 10, "powerPlayPct": 24.5}"#,
        )
        .unwrap();
        let aggregate = raw.to_scope_aggregate().unwrap();
        assert!((aggregate.power_play_pct - 0.245).abs() < 1e-9);
        assert!((aggregate.penalty_kill_pct - 0.8).abs() < 1e-9);
        assert_eq!(aggregate.goals_against, 0);
    }

    #[test]
    fn test_parse_toi_formats() {
        assert!((parse_toi(&Some(serde_json::json!("18:45"))) - 18.75).abs() < 1e-9);
        assert!((parse_toi(&Some(serde_json::json!("17.5"))) - 17.5).abs() < 1e-9);
        assert_eq!(parse_toi(&Some(serde_json::json!(null))), 0.0);
        assert_eq!(parse_toi(&None), 0.0);
    }
}
