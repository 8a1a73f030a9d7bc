//! # Clock
//!
//! Source of "now" and "today" for the ledger.
//!
//! Billing days and today's income both depend on the calendar date.
//! Rules in this crate take the date as a plain parameter; the database
//! layer reads it from a [`Clock`] once per operation.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt::Debug;

/// Supplies the current instant and calendar date.
pub trait Clock: Send + Sync + Debug {
    /// Current instant (used for `created_at` / `updated_at`).
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date (used for billing and date validation).
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant. Used by tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        FixedClock { now }
    }

    /// Frozen at midday UTC of `date`.
    pub fn on(date: NaiveDate) -> Self {
        let now = date
            .and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now);
        FixedClock { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_today() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let clock = FixedClock::on(date);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.now().date_naive(), date);
    }

    #[test]
    fn test_system_clock_today_matches_now() {
        let clock = SystemClock;
        let today = clock.today();
        let now = clock.now().date_naive();
        // Midnight may pass between the two reads
        assert!(now == today || now == today.succ_opt().unwrap());
    }
}
