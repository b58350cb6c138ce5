use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// Wall clock that never goes backwards.
///
/// `query` orders by `createdAt`, so two timestamps issued one after the
/// other must compare `<=` even if the system clock steps back in between.
#[derive(Clone, Debug, Default)]
pub struct Clock {
    last: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = match *last {
            Some(prev) => prev.max(Utc::now()),
            None => Utc::now(),
        };
        *last = Some(now);
        now
    }

    /// Moves the floor forward so later reads are never earlier than `at`.
    pub(crate) fn observe(&self, at: DateTime<Utc>) {
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if last.map_or(true, |prev| at > prev) {
            *last = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_now_is_non_decreasing() {
        let clock = Clock::new();
        let mut prev = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next >= prev);
            prev = next;
        }
    }

    #[test]
    fn test_observe_future_timestamp() {
        let clock = Clock::new();
        let future = Utc::now() + Duration::days(1);
        clock.observe(future);
        assert!(clock.now() >= future);
    }

    #[test]
    fn test_clones_share_state() {
        let clock = Clock::new();
        let future = Utc::now() + Duration::hours(2);
        clock.clone().observe(future);
        assert!(clock.now() >= future);
    }
}
