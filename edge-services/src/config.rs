//! Engine configuration
//!
//! Every knob has a default; `from_env` overrides them from `EDGE_*`
//! environment variables. Invalid values are logged and ignored.

use std::time::Duration;
use tracing::warn;

use crate::lockout::DEFAULT_LOCKOUT_SECS;
use crate::rate_limiter::DEFAULT_MIN_REQUEST_INTERVAL_MS;
use crate::reconciliation::ReconciliationPolicy;

/// Cache lifetimes per record kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheTtls {
    /// Injury/status list (5 minutes)
    pub statuses: Duration,
    /// Quoted lines (2 minutes)
    pub quotes: Duration,
    /// Rosters and player production (30 minutes)
    pub production: Duration,
    /// Team aggregates and starting goalies (1 hour)
    pub aggregates: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            statuses: Duration::from_secs(5 * 60),
            quotes: Duration::from_secs(2 * 60),
            production: Duration::from_secs(30 * 60),
            aggregates: Duration::from_secs(60 * 60),
        }
    }
}

/// Configuration for the forecast engine and its feed gateway
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the stats/odds API
    pub feed_url: Option<String>,
    pub feed_api_key: Option<String>,
    /// JSON snapshot served instead of the live API
    pub snapshot_path: Option<String>,
    /// Per-call timeout for feed requests
    pub call_timeout: Duration,
    /// Cool-down after a quota-exhaustion signal
    pub lockout: Duration,
    /// Concurrent production fetches per batch
    pub fetch_batch: usize,
    pub min_request_interval: Duration,
    pub ttls: CacheTtls,
    pub policy: ReconciliationPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            feed_url: None,
            feed_api_key: None,
            snapshot_path: None,
            call_timeout: Duration::from_secs(8),
            lockout: Duration::from_secs(DEFAULT_LOCKOUT_SECS),
            fetch_batch: 8,
            min_request_interval: Duration::from_millis(DEFAULT_MIN_REQUEST_INTERVAL_MS),
            ttls: CacheTtls::default(),
            policy: ReconciliationPolicy::default(),
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.feed_url = env_string("EDGE_FEED_URL");
        config.feed_api_key = env_string("EDGE_FEED_API_KEY");
        config.snapshot_path = env_string("EDGE_SNAPSHOT_PATH");

        if let Some(secs) = env_u64("EDGE_CALL_TIMEOUT_SECS") {
            config.call_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = env_u64("EDGE_LOCKOUT_SECS") {
            config.lockout = Duration::from_secs(secs);
        }
        if let Some(batch) = env_u64("EDGE_FETCH_BATCH") {
            config.fetch_batch = (batch as usize).max(1);
        }
        if let Some(ms) = env_u64("EDGE_MIN_REQUEST_INTERVAL_MS") {
            config.min_request_interval = Duration::from_millis(ms);
        }
        if let Some(flag) = env_bool("EDGE_UNCERTAIN_AS_UNAVAILABLE") {
            config.policy.uncertain_as_unavailable = flag;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.fetch_batch, 8);
        assert_eq!(config.call_timeout, Duration::from_secs(8));
        assert_eq!(config.lockout, Duration::from_secs(900));
        assert!(config.policy.uncertain_as_unavailable);
        assert!(config.ttls.quotes < config.ttls.statuses);
    }
}
