// Time source for task timestamps

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use std::sync::{Arc, Mutex};

/// Source of "now" for the store
///
/// Timestamps are persisted with millisecond precision, so implementations
/// should return values already truncated to milliseconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock, truncated to milliseconds
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(3)
    }
}

/// Clock that only moves when told to
///
/// Clones share the same underlying time, so a test can keep a handle
/// while the store owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start.trunc_subsecs(3))),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to.trunc_subsecs(3);
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Next `updatedAt` for a record last touched at `previous`
///
/// Always strictly after `previous`, even when the clock has not moved.
pub fn next_after(clock: &dyn Clock, previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = clock.now();
    if now > previous {
        now
    } else {
        previous + TimeDelta::milliseconds(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_system_clock_truncates_to_millis() {
        let now = SystemClock.now();
        assert_eq!(now.nanosecond() % 1_000_000, 0);
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let handle = clock.clone();

        handle.advance(TimeDelta::seconds(5));
        assert_eq!(clock.now(), start + TimeDelta::seconds(5));

        handle.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_next_after_is_strictly_later() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::new(start);

        // Clock has not moved
        assert_eq!(next_after(&clock, start), start + TimeDelta::milliseconds(1));

        // Clock behind the previous stamp
        let future = start + TimeDelta::hours(1);
        assert_eq!(next_after(&clock, future), future + TimeDelta::milliseconds(1));

        // Clock ahead
        clock.advance(TimeDelta::seconds(1));
        assert_eq!(next_after(&clock, start), start + TimeDelta::seconds(1));
    }
}
