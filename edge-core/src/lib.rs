//! Core types for the Prop Edge engine
//!
//! This crate defines the shared data structures used across the engine,
//! including production records, availability verdicts, impact records,
//! forecasts, market quotes and bet verdicts.

pub mod availability;
pub mod error;
pub mod forecast;
pub mod impact;
pub mod market;
pub mod outcome;
pub mod production;

pub use availability::{
    AvailabilityFact, AvailabilityStatus, ConsensusVerdict, MarketPresence, SourceId,
    StatusReport, StatusSignal, VerdictStatus,
};
pub use error::{EdgeError, EdgeResult};
pub use forecast::{FactorBreakdown, Forecast, TeamOutlook};
pub use impact::{Adjustments, ImpactRecord, ScopeImpact};
pub use market::{implied_from_american, net_payout, BetVerdict, MarketQuote, Tier};
pub use outcome::{Distribution, OutcomeType};
pub use production::{
    GoalieStart, LeagueAverages, Matchup, OutcomeCounts, Position, ProductionRecord,
    ScopeAggregate,
};
