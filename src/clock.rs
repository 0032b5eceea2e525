//! Time sources.
//!
//! The limiter measures windows on the monotonic clock; the time gate and the
//! access log read the wall clock. Both come from one [`Clock`] so tests can
//! drive them together with [`MockClock`].

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Monotonic instant, used for rate windows.
    fn now(&self) -> Instant;

    /// Wall-clock time, used for opening hours and log timestamps.
    fn wall(&self) -> DateTime<Utc>;
}

/// Production clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Controllable clock for tests.
///
/// Clones share the same time; advancing one advances all of them, and the
/// monotonic and wall readings always move together.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<(Instant, DateTime<Utc>)>>,
}

impl MockClock {
    /// Start at the given wall-clock time.
    pub fn new(wall: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new((Instant::now(), wall))),
        }
    }

    /// Move both readings forward.
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().expect("mock clock mutex poisoned");
        current.0 += by;
        current.1 += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
    }

    /// Jump the wall clock without touching the monotonic reading.
    pub fn set_wall(&self, wall: DateTime<Utc>) {
        let mut current = self.current.lock().expect("mock clock mutex poisoned");
        current.1 = wall;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.current.lock().expect("mock clock mutex poisoned").0
    }

    fn wall(&self) -> DateTime<Utc> {
        self.current.lock().expect("mock clock mutex poisoned").1
    }
}
