use chrono::{DateTime, Utc};

/// Time source for everything that compares "now" against booking deadlines
/// (payment expiry, cancellation tiers, payout periods). Injected so tests
/// can pin the clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for scenarios that step through deadlines.
#[cfg(any(test, feature = "test-utils"))]
pub struct ManualClock(std::sync::RwLock<DateTime<Utc>>);

#[cfg(any(test, feature = "test-utils"))]
impl ManualClock {
    pub fn starting_at(at: DateTime<Utc>) -> Self {
        Self(std::sync::RwLock::new(at))
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.0.write().expect("clock lock poisoned") = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.0.write().expect("clock lock poisoned");
        *guard += by;
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.read().expect("clock lock poisoned")
    }
}
