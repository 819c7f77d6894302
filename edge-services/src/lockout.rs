//! Quota lockout for rate-limited sources
//!
//! Once a source reports its quota is spent, every further call to it is
//! suppressed for a fixed cool-down, independent of normal cache TTLs.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Default cool-down after a quota-exhaustion signal (15 minutes)
pub const DEFAULT_LOCKOUT_SECS: u64 = 15 * 60;

/// Per-source lockout table
#[derive(Debug)]
pub struct QuotaLockout {
    cooldown: Duration,
    /// Source name -> lockout expiry
    locked_until: Mutex<HashMap<String, Instant>>,
}

impl QuotaLockout {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            locked_until: Mutex::new(HashMap::new()),
        }
    }

    /// Put a source into lockout
    ///
    /// Only the transition into lockout is logged; repeated trips while
    /// already locked are silent and do not extend the window.
    pub fn trip(&self, source: &str) {
        let now = Instant::now();
        let mut table = self.locked_until.lock();

        match table.get(source) {
            Some(until) if *until > now => {}
            _ => {
                table.insert(source.to_string(), now + self.cooldown);
                warn!(
                    "[LOCKOUT:{}] quota exhausted, suppressing calls for {:?}",
                    source, self.cooldown
                );
            }
        }
    }

    /// Whether calls to `source` are currently suppressed
    pub fn is_locked(&self, source: &str) -> bool {
        let now = Instant::now();
        let mut table = self.locked_until.lock();

        match table.get(source) {
            Some(until) if *until > now => true,
            Some(_) => {
                table.remove(source);
                info!("[LOCKOUT:{}] cool-down elapsed, calls resumed", source);
                false
            }
            None => false,
        }
    }

    /// Time left in the lockout window, if any
    pub fn remaining(&self, source: &str) -> Option<Duration> {
        let now = Instant::now();
        self.locked_until
            .lock()
            .get(source)
            .filter(|until| **until > now)
            .map(|until| *until - now)
    }
}

impl Default for QuotaLockout {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_LOCKOUT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_source_is_open() {
        let lockout = QuotaLockout::default();
        assert!(!lockout.is_locked("odds"));
        assert!(lockout.remaining("odds").is_none());
    }

    #[tokio::test]
    async fn test_lockout_expires() {
        let lockout = QuotaLockout::new(Duration::from_millis(50));
        lockout.trip("odds");
        assert!(lockout.is_locked("odds"));
        assert!(!lockout.is_locked("stats"));

        tokio::time::sleep(Duration::from_millis(70)).await;
        assert!(!lockout.is_locked("odds"));
    }

    #[tokio::test]
    async fn test_repeat_trip_does_not_extend() {
        let lockout = QuotaLockout::new(Duration::from_millis(80));
        lockout.trip("odds");
        let first = lockout.remaining("odds").unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        lockout.trip("odds");
        let second = lockout.remaining("odds").unwrap();

        assert!(second < first);
    }
}
