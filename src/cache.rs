// MIT License - Copyright (c) 2026 Peter Wright
// Remote call throttle

use tokio::time::{Duration, Instant};

use crate::state::ObservedState;

/// Reads closer together than this share one remote fetch.
pub const THROTTLE_WINDOW: Duration = Duration::from_secs(1);

/// Single-entry, time-invalidated cache of the last observed panel state.
///
/// Bursts of reads (a current-state query immediately followed by a
/// target-state query) are collapsed into one remote call.
#[derive(Debug, Clone, Default)]
pub struct CallCache {
    last_fetch: Option<Instant>,
    last_value: Option<ObservedState>,
}

/// Result of a cache-gated read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub value: ObservedState,
    pub from_cache: bool,
}

impl CallCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached value, if the last fetch is no older than [`THROTTLE_WINDOW`].
    pub fn fresh(&self, now: Instant) -> Option<ObservedState> {
        let last = self.last_fetch?;
        if now.saturating_duration_since(last) > THROTTLE_WINDOW {
            return None;
        }
        self.last_value
    }

    /// Record a value confirmed by the remote side at `now`.
    pub fn store(&mut self, now: Instant, value: ObservedState) {
        self.last_fetch = Some(now);
        self.last_value = Some(value);
    }

    pub fn last_value(&self) -> Option<ObservedState> {
        self.last_value
    }

    pub fn last_fetch(&self) -> Option<Instant> {
        self.last_fetch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_cache_misses() {
        let cache = CallCache::new();
        assert_eq!(cache.fresh(Instant::now()), None);
    }

    #[test]
    fn test_hit_within_window() {
        let t0 = Instant::now();
        let mut cache = CallCache::new();
        cache.store(t0, ObservedState::AwayArmed);
        assert_eq!(cache.fresh(t0 + Duration::from_millis(500)), Some(ObservedState::AwayArmed));
        // The window is exclusive of staleness: exactly one second is still fresh.
        assert_eq!(cache.fresh(t0 + THROTTLE_WINDOW), Some(ObservedState::AwayArmed));
    }

    #[test]
    fn test_miss_after_window() {
        let t0 = Instant::now();
        let mut cache = CallCache::new();
        cache.store(t0, ObservedState::Disarmed);
        assert_eq!(cache.fresh(t0 + Duration::from_millis(1500)), None);
        assert_eq!(cache.last_value(), Some(ObservedState::Disarmed));
    }

    #[test]
    fn test_store_overwrites() {
        let t0 = Instant::now();
        let mut cache = CallCache::new();
        cache.store(t0, ObservedState::Disarmed);
        let t1 = t0 + Duration::from_secs(3);
        cache.store(t1, ObservedState::NightArmed);
        assert_eq!(cache.last_fetch(), Some(t1));
        assert_eq!(cache.fresh(t1), Some(ObservedState::NightArmed));
    }
}
