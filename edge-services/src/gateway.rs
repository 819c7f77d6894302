//! Guarded feed access
//!
//! Every feed read goes through [`FeedGateway`], which composes the TTL
//! cache, the quota lockout, request spacing and a per-call timeout. A failed
//! or slow call degrades to the last cached value (or an empty/neutral one)
//! and is logged; it never surfaces as an error.

use futures::future::join_all;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use edge_core::{
    EdgeError, EdgeResult, GoalieStart, MarketQuote, OutcomeType, ProductionRecord, ScopeAggregate,
    StatusReport,
};
use edge_feeds::DataFeed;

use crate::cache::{CacheStats, TtlCache};
use crate::config::{CacheTtls, EngineConfig};
use crate::lockout::QuotaLockout;
use crate::rate_limiter::{RateLimiter, RateLimiterStats};

/// Cached, rate-limited, lockout-aware view over a [`DataFeed`]
pub struct FeedGateway {
    feed: Arc<dyn DataFeed>,
    lockout: QuotaLockout,
    limiter: RateLimiter,
    call_timeout: Duration,
    fetch_batch: usize,
    ttls: CacheTtls,
    statuses: TtlCache<(), Vec<StatusReport>>,
    /// `None` means the board could not be read (market signal unknown)
    quotes: TtlCache<OutcomeType, Option<Vec<MarketQuote>>>,
    rosters: TtlCache<String, Vec<String>>,
    production: TtlCache<String, Option<ProductionRecord>>,
    aggregates: TtlCache<(), Vec<ScopeAggregate>>,
    goalies: TtlCache<(), Vec<GoalieStart>>,
}

impl FeedGateway {
    pub fn new(feed: Arc<dyn DataFeed>, config: &EngineConfig) -> Self {
        let limiter = RateLimiter::new(config.min_request_interval, feed.name());
        Self {
            feed,
            lockout: QuotaLockout::new(config.lockout),
            limiter,
            call_timeout: config.call_timeout,
            fetch_batch: config.fetch_batch.max(1),
            ttls: config.ttls,
            statuses: TtlCache::new("statuses"),
            quotes: TtlCache::new("quotes"),
            rosters: TtlCache::new("rosters"),
            production: TtlCache::new("production"),
            aggregates: TtlCache::new("aggregates"),
            goalies: TtlCache::new("goalies"),
        }
    }

    /// Read through `cache`, calling the feed only when the entry expired
    async fn guarded<K, T, F, Fut>(
        &self,
        cache: &TtlCache<K, T>,
        key: K,
        ttl: Duration,
        what: &str,
        call: F,
    ) -> T
    where
        K: Eq + Hash + Clone + Debug,
        T: Clone + Default,
        F: FnOnce() -> Fut,
        Fut: Future<Output = EdgeResult<T>>,
    {
        let source = self.feed.name();

        if self.lockout.is_locked(source) {
            debug!("{} suppressed, {} is in quota lockout", what, source);
            return cache.get_stale(&key).await.unwrap_or_default();
        }

        cache
            .get_or_refresh(key, ttl, |previous| async move {
                self.limiter.acquire().await;
                match tokio::time::timeout(self.call_timeout, call()).await {
                    Ok(Ok(value)) => value,
                    Ok(Err(e)) if e.is_quota_exhausted() => {
                        self.lockout.trip(source);
                        previous.unwrap_or_default()
                    }
                    Ok(Err(e)) => {
                        warn!("{} failed, serving last known value: {}", what, e);
                        previous.unwrap_or_default()
                    }
                    Err(_) => {
                        let e = EdgeError::timeout(self.call_timeout);
                        warn!("{} failed, serving last known value: {}", what, e);
                        previous.unwrap_or_default()
                    }
                }
            })
            .await
    }

    pub async fn status_reports(&self) -> Vec<StatusReport> {
        self.guarded(&self.statuses, (), self.ttls.statuses, "status reports", || {
            self.feed.status_reports()
        })
        .await
    }

    /// Quoted lines for an outcome, `None` when the board is unavailable
    pub async fn quotes(&self, outcome: OutcomeType) -> Option<Vec<MarketQuote>> {
        self.guarded(&self.quotes, outcome, self.ttls.quotes, "quotes", || async move {
            self.feed.quotes(outcome).await.map(Some)
        })
        .await
    }

    pub async fn roster(&self, team: &str) -> Vec<String> {
        self.guarded(
            &self.rosters,
            team.to_string(),
            self.ttls.production,
            "roster",
            || self.feed.roster(team),
        )
        .await
    }

    pub async fn production(&self, player_id: &str) -> Option<ProductionRecord> {
        self.guarded(
            &self.production,
            player_id.to_string(),
            self.ttls.production,
            "player production",
            || async move { self.feed.player_production(player_id).await.map(Some) },
        )
        .await
    }

    /// Fetch many production records, `fetch_batch` at a time
    ///
    /// Players whose record cannot be obtained are left out.
    pub async fn production_batch(&self, player_ids: &[String]) -> Vec<ProductionRecord> {
        let mut records = Vec::with_capacity(player_ids.len());

        for chunk in player_ids.chunks(self.fetch_batch) {
            let fetched = join_all(chunk.iter().map(|id| self.production(id))).await;
            for (id, record) in chunk.iter().zip(fetched) {
                match record {
                    Some(record) => records.push(record),
                    None => debug!("No production record for player {}", id),
                }
            }
        }

        info!(
            "Loaded {}/{} production records",
            records.len(),
            player_ids.len()
        );
        records
    }

    pub async fn team_aggregates(&self) -> Vec<ScopeAggregate> {
        self.guarded(
            &self.aggregates,
            (),
            self.ttls.aggregates,
            "team aggregates",
            || self.feed.team_aggregates(),
        )
        .await
    }

    pub async fn starting_goalies(&self) -> Vec<GoalieStart> {
        self.guarded(
            &self.goalies,
            (),
            self.ttls.aggregates,
            "starting goalies",
            || self.feed.starting_goalies(),
        )
        .await
    }

    /// Remaining quota lockout for the feed, if any
    pub fn lockout_remaining(&self) -> Option<Duration> {
        self.lockout.remaining(self.feed.name())
    }

    pub fn limiter_stats(&self) -> RateLimiterStats {
        self.limiter.stats()
    }

    pub fn cache_stats(&self) -> Vec<CacheStats> {
        vec![
            self.statuses.stats(),
            self.quotes.stats(),
            self.rosters.stats(),
            self.production.stats(),
            self.aggregates.stats(),
            self.goalies.stats(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use edge_core::EdgeError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Feed whose every call fails with a fixed error after an optional delay
    struct FailingFeed {
        error: EdgeError,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FailingFeed {
        fn new(error: EdgeError, delay: Duration) -> Self {
            Self {
                error,
                delay,
                calls: AtomicUsize::new(0),
            }
        }

        async fn fail<T>(&self) -> EdgeResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Err(self.error.clone())
        }
    }

    #[async_trait]
    impl DataFeed for FailingFeed {
        fn name(&self) -> &str {
            "failing"
        }
        async fn status_reports(&self) -> EdgeResult<Vec<StatusReport>> {
            self.fail().await
        }
        async fn quotes(&self, _outcome: OutcomeType) -> EdgeResult<Vec<MarketQuote>> {
            self.fail().await
        }
        async fn roster(&self, _team: &str) -> EdgeResult<Vec<String>> {
            self.fail().await
        }
        async fn player_production(&self, _player_id: &str) -> EdgeResult<ProductionRecord> {
            self.fail().await
        }
        async fn team_aggregates(&self) -> EdgeResult<Vec<ScopeAggregate>> {
            self.fail().await
        }
        async fn starting_goalies(&self) -> EdgeResult<Vec<GoalieStart>> {
            self.fail().await
        }
    }

    fn fast_config() -> EngineConfig {
        EngineConfig {
            call_timeout: Duration::from_millis(50),
            min_request_interval: Duration::ZERO,
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_quota_exhaustion_enters_lockout() {
        let feed = Arc::new(FailingFeed::new(EdgeError::quota("failing"), Duration::ZERO));
        let gateway = FeedGateway::new(feed.clone(), &fast_config());

        assert!(gateway.status_reports().await.is_empty());
        assert!(gateway.lockout_remaining().is_some());

        // Different keys are suppressed too while locked out
        assert!(gateway.roster("BOS").await.is_empty());
        assert!(gateway.quotes(OutcomeType::Goals).await.is_none());
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_default() {
        let feed = Arc::new(FailingFeed::new(
            EdgeError::network("slow"),
            Duration::from_millis(500),
        ));
        let gateway = FeedGateway::new(feed.clone(), &fast_config());

        assert!(gateway.production("8478402").await.is_none());
        assert!(gateway.lockout_remaining().is_none());

        // Degraded result is cached; no second call inside the TTL
        assert!(gateway.production("8478402").await.is_none());
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_production_batch_skips_missing() {
        let feed = edge_feeds::StaticFeed::new("static").with_player(ProductionRecord {
            player_id: "1".to_string(),
            name: "One".to_string(),
            team: "BOS".to_string(),
            position: edge_core::Position::Center,
            season: edge_core::OutcomeCounts { games: 10, goals: 2, assists: 3, shots: 20 },
            recent: edge_core::OutcomeCounts::default(),
            toi_per_game: 18.0,
            pp_toi_per_game: 2.0,
        });
        let config = EngineConfig {
            fetch_batch: 2,
            ..fast_config()
        };
        let gateway = FeedGateway::new(Arc::new(feed), &config);

        let ids: Vec<String> = ["1", "2", "3"].iter().map(|s| s.to_string()).collect();
        let records = gateway.production_batch(&ids).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].player_id, "1");
    }
}
