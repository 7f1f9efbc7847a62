//! Time source used when stamping audit columns.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Supplies the current instant.
///
/// The save pipeline never reads the wall clock directly; it asks the clock
/// it was built with, so tests can pin time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    instant: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Mutex::new(instant),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut instant = self.instant.lock().unwrap_or_else(|e| e.into_inner());
        *instant += by;
    }

    /// Jumps the clock to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.instant.lock().unwrap_or_else(|e| e.into_inner()) = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock().unwrap_or_else(|e| e.into_inner())
    }
}
