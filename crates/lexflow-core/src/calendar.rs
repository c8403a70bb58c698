//! # Business-Day Calendar
//!
//! Pure date arithmetic over a calendar that excludes Saturdays, Sundays and
//! a jurisdiction-specific [`HolidaySet`].
//!
//! Nothing here reads the clock or any global table: the holiday set is
//! always passed in, so identical inputs give identical outputs.
//!
//! ## Counting Convention
//!
//! [`count_business_days`] is inclusive on both ends when `end >= start`.
//! When `end < start` the result is negative: minus the number of business
//! days in `(end, start]`, i.e. how many business days have elapsed past
//! `end` by `start`.

use crate::primitives::MAX_DAY_COUNT;
use crate::{DayCountPolicy, LexflowError};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// HOLIDAY SET
// =============================================================================

/// Immutable set of non-business calendar dates.
///
/// Built once from configuration and shared read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolidaySet {
    dates: BTreeSet<NaiveDate>,
}

impl HolidaySet {
    /// Create an empty holiday set (weekends only).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a holiday set from any collection of dates.
    #[must_use]
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    /// Check if a date is a listed holiday.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Iterate holidays in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }

    /// Holidays falling in the given year.
    #[must_use]
    pub fn for_year(&self, year: i32) -> Self {
        Self::from_dates(self.iter().filter(|d| d.year() == year))
    }

    /// Holidays in `[start, end]` that fall on a weekday.
    fn weekday_holidays_between(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        self.dates
            .range(start..=end)
            .filter(|d| !is_weekend(**d))
            .count() as i64
    }

    /// Union of two holiday sets.
    #[must_use]
    pub fn union(&self, other: &HolidaySet) -> Self {
        Self::from_dates(self.iter().chain(other.iter()))
    }
}

impl FromIterator<NaiveDate> for HolidaySet {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self::from_dates(iter)
    }
}

// =============================================================================
// CALENDAR FUNCTIONS
// =============================================================================

/// A date is a business day unless it is a Saturday, a Sunday, or a holiday.
#[must_use]
pub fn is_business_day(date: NaiveDate, holidays: &HolidaySet) -> bool {
    !is_weekend(date) && !holidays.contains(date)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Advance `date` until `n` business days have been stepped over.
///
/// The start date itself is never counted; `n = 0` returns `date` unchanged.
/// `n` must lie in `0..=MAX_DAY_COUNT`.
pub fn add_business_days(
    date: NaiveDate,
    n: i64,
    holidays: &HolidaySet,
) -> Result<NaiveDate, LexflowError> {
    check_day_count(n)?;

    let mut current = date;
    let mut remaining = n;
    while remaining > 0 {
        current = current.succ_opt().ok_or_else(|| overflow(date, n))?;
        if is_business_day(current, holidays) {
            remaining -= 1;
        }
    }
    Ok(current)
}

/// Advance `date` by `n` calendar days, `n` in `0..=MAX_DAY_COUNT`.
pub fn add_calendar_days(date: NaiveDate, n: i64) -> Result<NaiveDate, LexflowError> {
    check_day_count(n)?;
    date.checked_add_days(chrono::Days::new(n as u64))
        .ok_or_else(|| overflow(date, n))
}

/// Advance `date` by `n` days under the given day-count policy.
pub fn advance(
    date: NaiveDate,
    n: i64,
    policy: DayCountPolicy,
    holidays: &HolidaySet,
) -> Result<NaiveDate, LexflowError> {
    match policy {
        DayCountPolicy::Business => add_business_days(date, n, holidays),
        DayCountPolicy::Calendar => add_calendar_days(date, n),
    }
}

/// Signed business-day count between two dates.
///
/// - `end >= start`: business days in `[start, end]`, both ends included.
/// - `end < start`: minus the business days in `(end, start]`.
#[must_use]
pub fn count_business_days(start: NaiveDate, end: NaiveDate, holidays: &HolidaySet) -> i64 {
    if end >= start {
        count_inclusive(start, end, holidays)
    } else {
        // `end` is strictly before `start`, so its successor exists.
        match end.succ_opt() {
            Some(after_end) => -count_inclusive(after_end, start, holidays),
            None => 0,
        }
    }
}

/// Weekdays in `[start, end]` minus weekday holidays, without walking the
/// span: whole weeks contribute five each, the remainder is checked by
/// weekday index.
fn count_inclusive(start: NaiveDate, end: NaiveDate, holidays: &HolidaySet) -> i64 {
    let span = end.signed_duration_since(start).num_days() + 1;
    let first = i64::from(start.weekday().num_days_from_monday());

    let weekdays_in_rest = (0..span % 7)
        .filter(|offset| (first + offset) % 7 < 5)
        .count() as i64;
    let weekdays = (span / 7) * 5 + weekdays_in_rest;

    weekdays - holidays.weekday_holidays_between(start, end)
}

fn check_day_count(n: i64) -> Result<(), LexflowError> {
    if !(0..=MAX_DAY_COUNT).contains(&n) {
        return Err(LexflowError::OutOfRangeInput(format!(
            "Day count must be between 0 and {}, got {}",
            MAX_DAY_COUNT, n
        )));
    }
    Ok(())
}

fn overflow(date: NaiveDate, n: i64) -> LexflowError {
    LexflowError::OutOfRangeInput(format!("{} + {} days overflows the calendar", date, n))
}

// =============================================================================
// TESTS
// =============================================================================
