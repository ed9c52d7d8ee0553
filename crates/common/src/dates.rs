use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Layout accepted for every date entered on the site (`2022-01-02`).
pub const DATE_LAYOUT: &str = "%Y-%m-%d";

/// Errors produced while turning raw form input into a [`DateRange`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateRangeError {
    #[error("Can't parse start date: {0:?}")]
    InvalidStart(String),

    #[error("Can't parse end date: {0:?}")]
    InvalidEnd(String),

    /// The end date does not come after the start date.
    #[error("End date {end} must be after start date {start}")]
    Empty { start: NaiveDate, end: NaiveDate },
}

/// Parses a single date in [`DATE_LAYOUT`].
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_LAYOUT).ok()
}

/// Formats a date back into [`DATE_LAYOUT`].
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_LAYOUT).to_string()
}

/// A non-empty, half-open calendar range `[start, end)`.
///
/// The end date is the drop-off day: a vehicle rented for `[Jan 1, Jan 3)`
/// can be picked up again by someone else on Jan 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

/// Unchecked wire shape of a [`DateRange`].
#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = DateRangeError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl DateRange {
    /// Creates a range, rejecting `start >= end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start >= end {
            return Err(DateRangeError::Empty { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses both ends from raw form input.
    pub fn parse(start_raw: &str, end_raw: &str) -> Result<Self, DateRangeError> {
        let start =
            parse_date(start_raw).ok_or_else(|| DateRangeError::InvalidStart(start_raw.into()))?;
        let end = parse_date(end_raw).ok_or_else(|| DateRangeError::InvalidEnd(end_raw.into()))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Half-open intersection: `s1 < e2 && s2 < e1`.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Number of days covered by the range.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", format_date(self.start), format_date(self.end))
    }
}
