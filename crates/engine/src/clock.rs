//! Clock sources. Time is injected explicitly; the engine never reads the
//! wall clock on its own.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Supplies the wall-clock reading for each state-changing call.
pub trait Clock {
    /// Current unix timestamp in seconds.
    fn now(&self) -> i64;
}

/// Production clock backed by the system time.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs() as i64,
            // A pre-epoch system clock reads as 0, which fails the
            // engine's timestamp floor rather than being silently fixed.
            Err(_) => 0,
        }
    }
}

/// Settable clock for tests and deterministic replay. Cloning shares the
/// underlying reading, so a test can keep a handle while the service owns
/// another.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        ManualClock {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    pub fn set(&self, timestamp: i64) {
        self.now.store(timestamp, Ordering::Relaxed);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::Relaxed)
    }
}
