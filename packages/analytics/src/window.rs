//! Inclusive calendar-date windows.

use chrono::NaiveDate;

use crate::AnalyticsError;

/// An inclusive `[start, end]` range of calendar dates.
///
/// Runs are matched on the date part of `created_at` only, so a window
/// ending on `2024-01-31` includes a run created at `2024-01-31 23:59:59`.
/// A window whose start is after its end matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryWindow {
    /// First included date.
    pub start: NaiveDate,
    /// Last included date.
    pub end: NaiveDate,
}

impl SummaryWindow {
    /// Creates a window from two dates.
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parses a window from two `YYYY-MM-DD` strings.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidDate`] if either bound is malformed.
    pub fn parse(start: &str, end: &str) -> Result<Self, AnalyticsError> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    /// Window covering everything from the Unix epoch through `end`.
    #[must_use]
    pub fn through(end: NaiveDate) -> Self {
        // `NaiveDate::default()` is 1970-01-01
        Self::new(NaiveDate::default(), end)
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, AnalyticsError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|source| AnalyticsError::InvalidDate {
        value: s.to_owned(),
        source,
    })
}
