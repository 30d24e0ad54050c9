//! Date arithmetic for due dates, overdue detection and fine calculation

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

/// Loan period applied when a reservation is promoted to a loan and when a
/// loan is renewed. Fixed at 14 days; direct loan creation reads the
/// configurable `DEFAULT_LOAN_DAYS` instead.
pub const FIXED_LOAN_PERIOD_DAYS: i64 = 14;

const MS_PER_DAY: i64 = 86_400_000;

/// Returns `date` offset by `days` (may be negative).
pub fn add_days(date: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    date + Duration::days(days)
}

/// Whole days between two instants, rounding any partial day up.
/// Symmetric in its arguments; 0 for equal instants.
pub fn days_between(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    let ms = (b - a).num_milliseconds().abs();
    (ms + MS_PER_DAY - 1) / MS_PER_DAY
}

/// True iff the current time is strictly after `due_date`.
pub fn is_overdue(due_date: DateTime<Utc>) -> bool {
    Utc::now() > due_date
}

/// Fine owed for a loan due at `due_date` and returned at `return_date`
/// (or still out, in which case the current time is used).
///
/// Returning at or before the due date owes nothing. Passing the actual
/// return date makes recomputation idempotent.
pub fn calculate_fine(
    due_date: DateTime<Utc>,
    return_date: Option<DateTime<Utc>>,
    fine_per_day: Decimal,
) -> Decimal {
    let effective = return_date.unwrap_or_else(Utc::now);
    if effective <= due_date {
        return Decimal::ZERO;
    }
    Decimal::from(days_between(due_date, effective)) * fine_per_day
}

/// Due date for a reservation-promoted loan: `from` plus the fixed period.
pub fn calculate_due_date(from: DateTime<Utc>) -> DateTime<Utc> {
    add_days(from, FIXED_LOAN_PERIOD_DAYS)
}
