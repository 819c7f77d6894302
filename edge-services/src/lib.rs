//! Services for the Prop Edge engine
//!
//! This crate layers caching, quota lockout and rate limiting over the data
//! feeds, and implements source reconciliation, impact quantification, the
//! probability model and decision classification on top of them.

pub mod cache;
pub mod config;
pub mod decision;
pub mod engine;
pub mod gateway;
pub mod impact;
pub mod lockout;
pub mod model;
pub mod rate_limiter;
pub mod reconciliation;

pub use cache::{CacheStats, TtlCache};
pub use config::{CacheTtls, EngineConfig};
pub use decision::{
    full_kelly, same_line, DecisionClassifier, DecisionConfig, StakeSchedule, ThresholdRow,
    ThresholdTable,
};
pub use engine::{default_line, ForecastEngine, ScopeStatus};
pub use gateway::FeedGateway;
pub use impact::{ImpactConfig, ImpactQuantifier, PositionalProfile};
pub use lockout::QuotaLockout;
pub use model::{ContextModifiers, ModelConfig, ProbabilityModel, Venue};
pub use rate_limiter::{RateLimiter, RateLimiterStats};
pub use reconciliation::{reconcile, reconcile_facts, reconcile_scope, ReconciliationPolicy};
