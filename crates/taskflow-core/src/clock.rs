//! Injectable time source.
//!
//! All temporal policy (streak day boundaries, punctuality checks,
//! `completed_at` stamps) reads the current instant through [`Clock`] so
//! tests can drive it deterministically.

use std::cell::Cell;

use chrono::{DateTime, TimeZone, Utc};

/// Source of the current instant.
pub trait Clock {
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

/// A settable clock for deterministic tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Cell<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Cell::new(now) }
    }

    /// Construct from a Unix timestamp in seconds.
    pub fn at_timestamp(secs: i64) -> Self {
        Self::new(Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    /// Move the clock forward by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        self.now
            .set(self.now.get() + chrono::Duration::seconds(secs));
    }

    /// Move the clock forward by whole days.
    pub fn advance_days(&self, days: i64) {
        self.advance_secs(days * 86_400);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::at_timestamp(1_000_000);
        assert_eq!(clock.now().timestamp(), 1_000_000);
        clock.advance_secs(60);
        assert_eq!(clock.now().timestamp(), 1_000_060);
        clock.advance_days(2);
        assert_eq!(clock.now().timestamp(), 1_000_060 + 2 * 86_400);
    }
}
