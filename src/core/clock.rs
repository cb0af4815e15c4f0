//! Day-boundary helpers.
//!
//! The service runs on a fixed timezone, UTC. Billing dates are stored as the
//! start of their UTC day and "now" is always an explicit argument so jobs are
//! deterministic under test.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Start of `date` in the service timezone.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Calendar date of `now` in the service timezone.
#[must_use]
pub fn service_date(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}
