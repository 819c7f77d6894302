//! Player availability: parsed statuses, facts and consensus verdicts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of availability statuses produced by the feed parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Active,
    DayToDay,
    Questionable,
    Out,
    InjuredReserve,
    Suspended,
    Unknown,
}

/// Direction an authoritative status points in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSignal {
    Available,
    Doubtful,
    Unavailable,
}

impl AvailabilityStatus {
    pub fn signal(&self) -> StatusSignal {
        match self {
            AvailabilityStatus::Active => StatusSignal::Available,
            AvailabilityStatus::DayToDay
            | AvailabilityStatus::Questionable
            | AvailabilityStatus::Unknown => StatusSignal::Doubtful,
            AvailabilityStatus::Out
            | AvailabilityStatus::InjuredReserve
            | AvailabilityStatus::Suspended => StatusSignal::Unavailable,
        }
    }
}

/// Independent source of availability evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Authoritative league/team status feed
    StatusFeed,
    /// Whether books are quoting a line for the player
    MarketPresence,
    /// Any additional reporter feed
    Secondary,
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceId::StatusFeed => "status_feed",
            SourceId::MarketPresence => "market_presence",
            SourceId::Secondary => "secondary",
        };
        write!(f, "{}", name)
    }
}

/// A single observation about one player's availability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityFact {
    pub player_id: String,
    pub source: SourceId,
    pub status: StatusSignal,
    pub observed_at: DateTime<Utc>,
}

/// Market-presence signal for one player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketPresence {
    /// A line is quoted for the player
    Present,
    /// The market was checked and no line is quoted
    Absent,
    /// The market signal could not be obtained
    Unknown,
}

/// Normalized entry from the authoritative status feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub player_id: String,
    pub name: String,
    pub team: String,
    pub status: AvailabilityStatus,
    /// Free-text detail (injury description, expected return)
    #[serde(default)]
    pub detail: String,
    /// When the feed last changed this entry
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Reconciled availability outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Available,
    Unavailable,
    Uncertain,
}

/// Consensus availability verdict for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusVerdict {
    pub player_id: String,
    pub status: VerdictStatus,
    /// Number of sources supporting the verdict, never above `sources_consulted`
    pub agreement: u8,
    pub sources_consulted: u8,
    pub rationale: String,
}

impl ConsensusVerdict {
    pub fn is_uncertain(&self) -> bool {
        self.status == VerdictStatus::Uncertain
    }
}
