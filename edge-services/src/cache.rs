//! Time-boxed memoization
//!
//! In-memory TTL cache used by every component that reads from a feed.
//! Each key owns its own async mutex, so a refresh for one key never blocks
//! another key, and concurrent callers that find the same key expired wait
//! for the first refresh instead of all calling the producer.

use dashmap::DashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Cached value with metadata
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self) -> bool {
        self.stored_at.elapsed() < self.ttl
    }
}

type Slot<V> = Arc<Mutex<Option<CacheEntry<V>>>>;

/// Keyed TTL cache with single-flight refresh
pub struct TtlCache<K, V> {
    name: String,
    slots: DashMap<K, Slot<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slots: DashMap::new(),
        }
    }

    fn slot(&self, key: &K) -> Slot<V> {
        // Clone the Arc out so the shard lock is released before awaiting
        self.slots
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .value()
            .clone()
    }

    /// Return the cached value if fresh, otherwise refresh it
    ///
    /// `producer` receives the previous (stale) value, if any, so it can
    /// degrade to it on failure. Whatever it returns is stored, including
    /// empty or degraded results.
    pub async fn get_or_refresh<F, Fut>(&self, key: K, ttl: Duration, producer: F) -> V
    where
        F: FnOnce(Option<V>) -> Fut,
        Fut: Future<Output = V>,
    {
        let slot = self.slot(&key);
        let mut guard = slot.lock().await;

        if let Some(entry) = guard.as_ref() {
            if entry.is_fresh() {
                return entry.value.clone();
            }
        }

        debug!("[CACHE:{}] refreshing {:?}", self.name, key);
        let previous = guard.as_ref().map(|e| e.value.clone());
        let value = producer(previous).await;

        *guard = Some(CacheEntry {
            value: value.clone(),
            stored_at: Instant::now(),
            ttl,
        });

        value
    }

    /// Last stored value regardless of freshness
    ///
    /// Waits if a refresh for the key is in flight.
    pub async fn get_stale(&self, key: &K) -> Option<V> {
        let slot = self.slots.get(key).map(|s| s.value().clone())?;
        let guard = slot.lock().await;
        guard.as_ref().map(|e| e.value.clone())
    }

    /// Drop a single key
    pub fn invalidate(&self, key: &K) {
        self.slots.remove(key);
    }

    /// Get cache statistics
    ///
    /// Slots with a refresh in flight are counted as stale.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            name: self.name.clone(),
            ..Default::default()
        };

        for slot in self.slots.iter() {
            match slot.value().try_lock() {
                Ok(guard) => match guard.as_ref() {
                    Some(entry) if entry.is_fresh() => stats.fresh += 1,
                    Some(_) => stats.stale += 1,
                    None => continue,
                },
                Err(_) => stats.stale += 1,
            }
            stats.total += 1;
        }

        stats
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CacheStats {
    pub name: String,
    pub total: usize,
    pub fresh: usize,
    pub stale: usize,
}
