use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Time source for the stores and the session monitor. Injected so expiry
/// boundaries can be tested without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually-advanced clock for tests.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += delta;
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().expect("clock mutex poisoned") = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}
