//! # Billing
//!
//! Billing-day count and rental charge calculation.
//!
//! ## The Charge Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total = Σ items ( quantity × daily_rate × billed_days )                │
//! │                                                                         │
//! │  billed_days counts BOTH endpoints:                                     │
//! │    start 01-01, end 01-01  →  1 day                                     │
//! │    start 01-01, end 01-05  →  5 days                                    │
//! │    active, started today   →  1 day                                     │
//! │    end before start        →  1 day (clamped, never 0 or negative)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every rental item shares the billing period of its rental, so the day
//! count is computed once per rental, not per item.

use chrono::NaiveDate;

use crate::money::Money;
use crate::types::{Rental, RentalItem};

/// Minimum number of billed days for any rental.
pub const MIN_BILLED_DAYS: i64 = 1;

/// Counts billed days between `start` and the end of the period.
///
/// The period ends at `end` when set, otherwise at `today` (rental still
/// running). Both endpoints count. Negative spans clamp to one day, and
/// this function never fails.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use toolrent_core::billing::elapsed_days;
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
/// assert_eq!(elapsed_days(d(1), Some(d(1)), d(20)), 1);
/// assert_eq!(elapsed_days(d(1), Some(d(5)), d(20)), 5);
/// assert_eq!(elapsed_days(d(20), None, d(20)), 1);
/// assert_eq!(elapsed_days(d(5), Some(d(1)), d(20)), 1);
/// ```
pub fn elapsed_days(start: NaiveDate, end: Option<NaiveDate>, today: NaiveDate) -> i64 {
    let until = end.unwrap_or(today);
    let days = until.signed_duration_since(start).num_days();

    if days < 0 {
        return MIN_BILLED_DAYS;
    }

    days.checked_add(1).unwrap_or(MIN_BILLED_DAYS)
}

/// Billed days for a stored rental as of `today`.
#[inline]
pub fn billed_days(rental: &Rental, today: NaiveDate) -> i64 {
    elapsed_days(rental.start_date, rental.end_date, today)
}

/// Charge for one line: `quantity × daily_rate × days`.
///
/// ## Example
/// ```rust
/// use toolrent_core::billing::line_charge;
/// use toolrent_core::Money;
///
/// assert_eq!(line_charge(3, Money::from_cents(1_000), 4).cents(), 12_000);
/// ```
#[inline]
pub fn line_charge(quantity: i64, daily_rate: Money, days: i64) -> Money {
    daily_rate.saturating_multiply(quantity).saturating_multiply(days)
}

/// Charge for a stored line item over `days`.
#[inline]
pub fn item_charge(item: &RentalItem, days: i64) -> Money {
    line_charge(item.quantity, item.daily_rate(), days)
}

/// Sums the line charges of `items` over a shared billing period.
///
/// ## Example
/// ```rust,ignore
/// let days = billed_days(&rental, today);
/// let total = rental_total(&items, days);
/// ```
pub fn rental_total<'a, I>(items: I, days: i64) -> Money
where
    I: IntoIterator<Item = &'a RentalItem>,
{
    items.into_iter().map(|item| item_charge(item, days)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn item(quantity: i64, rate: i64) -> RentalItem {
        RentalItem {
            id: format!("i-{}-{}", quantity, rate),
            rental_id: "r-1".into(),
            tool_id: "t-1".into(),
            quantity,
            daily_rate_cents: rate,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_same_day_is_one_day() {
        assert_eq!(elapsed_days(d(2024, 1, 1), Some(d(2024, 1, 1)), d(2030, 1, 1)), 1);
    }

    #[test]
    fn test_inclusive_span() {
        assert_eq!(elapsed_days(d(2024, 1, 1), Some(d(2024, 1, 5)), d(2030, 1, 1)), 5);
        // Leap day counted
        assert_eq!(elapsed_days(d(2024, 2, 28), Some(d(2024, 3, 1)), d(2030, 1, 1)), 3);
    }

    #[test]
    fn test_active_rental_uses_today() {
        let today = d(2024, 6, 10);
        assert_eq!(elapsed_days(today, None, today), 1);
        assert_eq!(elapsed_days(d(2024, 6, 1), None, today), 10);
    }

    #[test]
    fn test_negative_span_clamps() {
        assert_eq!(elapsed_days(d(2024, 1, 10), Some(d(2024, 1, 1)), d(2024, 1, 1)), 1);
        // Start in the future relative to today
        assert_eq!(elapsed_days(d(2024, 1, 10), None, d(2024, 1, 1)), 1);
    }

    #[test]
    fn test_extreme_dates_do_not_panic() {
        assert!(elapsed_days(NaiveDate::MIN, Some(NaiveDate::MAX), NaiveDate::MAX) >= 1);
        assert_eq!(elapsed_days(NaiveDate::MAX, Some(NaiveDate::MIN), NaiveDate::MIN), 1);
    }

    #[test]
    fn test_rental_total() {
        let items = vec![item(3, 1_000), item(1, 2_500)];
        // (3 × 10.00 + 1 × 25.00) × 4 days
        assert_eq!(rental_total(&items, 4).cents(), 22_000);
        assert!(rental_total(&Vec::<RentalItem>::new(), 4).is_zero());
    }

    #[test]
    fn test_line_charge_saturates() {
        let charge = line_charge(i64::MAX, Money::from_cents(2), 2);
        assert_eq!(charge.cents(), i64::MAX);
    }

    proptest! {
        #[test]
        fn prop_elapsed_days_at_least_one(
            a in -100_000i64..100_000,
            b in -100_000i64..100_000,
            t in -100_000i64..100_000,
        ) {
            let base = d(2000, 1, 1);
            let start = base + chrono::Duration::days(a);
            let end = base + chrono::Duration::days(b);
            let today = base + chrono::Duration::days(t);
            prop_assert!(elapsed_days(start, Some(end), today) >= 1);
            prop_assert!(elapsed_days(start, None, today) >= 1);
        }

        #[test]
        fn prop_elapsed_days_inclusive(span in 0i64..50_000) {
            let start = d(2000, 1, 1);
            let end = start + chrono::Duration::days(span);
            prop_assert_eq!(elapsed_days(start, Some(end), start), span + 1);
        }

        #[test]
        fn prop_total_is_linear_in_days(
            lines in proptest::collection::vec((1i64..50, 0i64..100_000), 0..8),
            days in 1i64..400,
        ) {
            let items: Vec<RentalItem> = lines.iter().map(|(q, r)| item(*q, *r)).collect();
            let one_day = rental_total(&items, 1);
            prop_assert_eq!(rental_total(&items, days), one_day.saturating_multiply(days));
        }
    }
}
