//! Injected time source.
//!
//! Services never call `OffsetDateTime::now_utc` directly. They take an
//! `Arc<dyn Clock>` so the refresh window and cache expiry can be driven from tests.

use std::sync::Mutex;

use time::{Date, Duration, OffsetDateTime, UtcOffset};
use tracing::warn;

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    /// Calendar date in UTC.
    fn today(&self) -> Date {
        self.now().to_offset(UtcOffset::UTC).date()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.lock("advance");
        *guard += by;
    }

    fn lock(&self, op: &'static str) -> std::sync::MutexGuard<'_, OffsetDateTime> {
        match self.now.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(
                    op,
                    lock_kind = "mutex.lock",
                    result = "poisoned_recovered",
                    "Recovered from poisoned clock lock"
                );
                poisoned.into_inner()
            }
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.lock("now")
    }
}
