//! Cadence walking - turns a subscription's start/end dates and repeat period
//! into the ordered list of billing dates.
//!
//! Every occurrence is computed from the start date (`start + n periods`)
//! rather than from the previous occurrence, so a subscription starting on the
//! 31st lands on the 31st again whenever the month allows it and on the
//! month's last day otherwise.

use crate::errors::{Error, Result};
use chrono::{Days, Months, NaiveDate};
use tracing::warn;

/// Repeat period of a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cadence {
    /// Every 7 days
    Weekly,
    /// Same day every month, clamped to the month's last day
    Monthly,
    /// Same day every year, Feb 29 clamps to Feb 28
    Yearly,
    /// A single billing date equal to the start date
    OneTime,
}

/// Outcome of advancing a cadence by one more period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// The next billing date
    Advance(NaiveDate),
    /// No further dates exist
    Stop,
}

impl Cadence {
    /// Stored representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
            Self::OneTime => "ONE_TIME",
        }
    }

    /// Strict parse: `None` for anything that is not a known cadence.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "WEEKLY" => Some(Self::Weekly),
            "MONTHLY" => Some(Self::Monthly),
            "YEARLY" => Some(Self::Yearly),
            "ONE_TIME" | "ONE-TIME" | "ONETIME" => Some(Self::OneTime),
            _ => None,
        }
    }

    /// Interprets a value read from storage.
    ///
    /// Unrecognized values fall back to [`Cadence::OneTime`]: the subscription
    /// bills once on its start date and the walk ends there.
    #[must_use]
    pub fn from_stored(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|| {
            warn!(
                "Unrecognized cadence {:?}, treating it as one-time",
                raw
            );
            Self::OneTime
        })
    }

    /// Computes the `n`th billing date after `anchor` (`n >= 1`).
    ///
    /// Returns [`Step::Stop`] for one-time cadences and when the date would
    /// overflow the calendar.
    #[must_use]
    pub fn step(self, anchor: NaiveDate, n: u32) -> Step {
        let next = match self {
            Self::OneTime => None,
            Self::Weekly => anchor.checked_add_days(Days::new(7 * u64::from(n))),
            Self::Monthly => anchor.checked_add_months(Months::new(n)),
            Self::Yearly => n
                .checked_mul(12)
                .and_then(|months| anchor.checked_add_months(Months::new(months))),
        };

        next.map_or(Step::Stop, Step::Advance)
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Produces every billing date from `start` to `end`, both inclusive.
///
/// The result is empty when `start > end`; callers are expected to reject
/// that case as a validation error before walking.
///
/// # Errors
/// Returns [`Error::IterationCapExceeded`] when more than `max_occurrences`
/// dates would be produced.
pub fn walk(
    start: NaiveDate,
    end: NaiveDate,
    cadence: Cadence,
    max_occurrences: usize,
) -> Result<Vec<NaiveDate>> {
    if start > end {
        return Ok(Vec::new());
    }

    let mut dates = vec![start];
    let mut n: u32 = 1;

    loop {
        match cadence.step(start, n) {
            Step::Advance(date) if date <= end => {
                if dates.len() >= max_occurrences {
                    return Err(Error::IterationCapExceeded {
                        cap: max_occurrences,
                    });
                }
                dates.push(date);
            }
            Step::Advance(_) | Step::Stop => break,
        }
        n = n.checked_add(1).ok_or(Error::IterationCapExceeded {
            cap: max_occurrences,
        })?;
    }

    Ok(dates)
}
