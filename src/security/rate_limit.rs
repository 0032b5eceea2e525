//! Sliding-window rate limiting per client key.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Admission decision for one event.
///
/// The message gate only depends on this trait, so the in-process limiter can
/// be replaced by another store.
pub trait Admission: Send + Sync {
    /// Record an event for `key` at `now` if the key still has budget.
    fn admit(&self, key: &str, now: Instant) -> bool;
}

/// Per-key sliding-window limiter.
///
/// Each key keeps the instants of its recently admitted events, sorted. An
/// event is admitted when fewer than `max_events` of them fall inside
/// `(now - time_window, now]`. Stale instants are dropped on access; there is
/// no background sweep and keys are never removed.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    windows: DashMap<String, VecDeque<Instant>>,
    /// Keys inserted so far; read without touching the shards.
    keys: AtomicUsize,
    max_events: usize,
    time_window: Duration,
}

impl SlidingWindowLimiter {
    pub fn new(max_events: usize, time_window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            keys: AtomicUsize::new(0),
            max_events,
            time_window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_events, Duration::from_secs(config.time_window_secs))
    }

    pub fn max_events(&self) -> usize {
        self.max_events
    }

    pub fn time_window(&self) -> Duration {
        self.time_window
    }

    /// Number of keys ever seen.
    pub fn tracked_keys(&self) -> usize {
        self.keys.load(Ordering::Relaxed)
    }

    /// Entries currently stored for `key`, without evicting anything.
    pub fn window_len(&self, key: &str) -> usize {
        self.windows.get(key).map(|w| w.len()).unwrap_or(0)
    }

    fn check(&self, key: &str, now: Instant) -> bool {
        // The entry guard holds the shard write lock, so evict, count and
        // append happen as one step for this key.
        let mut window = match self.windows.entry(key.to_owned()) {
            Entry::Occupied(entry) => entry.into_ref(),
            Entry::Vacant(entry) => {
                self.keys.fetch_add(1, Ordering::Relaxed);
                entry.insert(VecDeque::new())
            }
        };
        let events = window.value_mut();

        // `None` means the window reaches back before the clock's origin:
        // nothing can be stale yet.
        if let Some(window_start) = now.checked_sub(self.time_window) {
            while events.front().is_some_and(|t| *t <= window_start) {
                events.pop_front();
            }
        }

        if events.len() >= self.max_events {
            return false;
        }

        // Concurrent callers may read `now` before taking the lock in a
        // different order; keep the window sorted regardless.
        let at = events.partition_point(|t| *t <= now);
        events.insert(at, now);
        true
    }
}

impl Admission for SlidingWindowLimiter {
    fn admit(&self, key: &str, now: Instant) -> bool {
        let admitted = self.check(key, now);
        metrics::record_limiter_keys(self.tracked_keys());
        admitted
    }
}
