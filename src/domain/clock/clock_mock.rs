use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, RwLock};

use crate::domain::clock::clock::Clock;

/// Settable clock shared between a test and the components under test.
#[derive(Debug, Clone)]
pub struct MockClock {
    time: Arc<RwLock<DateTime<Utc>>>,
}

impl MockClock {
    pub fn new(time: DateTime<Utc>) -> MockClock {
        MockClock { time: Arc::new(RwLock::new(time)) }
    }

    pub fn set_current_time(&self, time: DateTime<Utc>) {
        *self.time.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = time;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.time.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += by;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.time.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
