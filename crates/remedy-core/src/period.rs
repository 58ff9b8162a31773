//! # Report Periods
//!
//! Converts "today", "this month" and calendar months in the pharmacy's
//! local time into half-open UTC windows `[start, end)`.
//!
//! ```text
//! Local offset +05:00, today = 2026-03-10
//!
//!   local   2026-03-10 00:00 ─────────────── 2026-03-11 00:00
//!   UTC     2026-03-09 19:00 ─────────────── 2026-03-10 19:00
//!                     start (inclusive)          end (exclusive)
//! ```
//!
//! The clock never reads the system time itself; callers pass `now`.

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone,
    Timelike, Utc,
};

use crate::error::{CoreError, CoreResult, ValidationError};

/// A half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    #[inline]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// Local calendar for reports, anchored at a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportClock {
    offset: FixedOffset,
}

impl Default for ReportClock {
    fn default() -> Self {
        ReportClock::utc()
    }
}

impl ReportClock {
    pub fn new(offset: FixedOffset) -> Self {
        ReportClock { offset }
    }

    /// UTC calendar.
    pub fn utc() -> Self {
        ReportClock { offset: Utc.fix() }
    }

    /// Builds a clock from an offset east of UTC in minutes (300 = +05:00).
    pub fn from_offset_minutes(minutes: i32) -> CoreResult<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(ReportClock::new)
            .ok_or_else(|| {
                ValidationError::OutOfRange {
                    field: "utcOffsetMinutes".to_string(),
                    min: -(24 * 60 - 1),
                    max: 24 * 60 - 1,
                }
                .into()
            })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local calendar date of an instant.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// Local hour-of-day (0-23) of an instant.
    pub fn local_hour(&self, at: DateTime<Utc>) -> u32 {
        at.with_timezone(&self.offset).hour()
    }

    /// The UTC instant of local midnight at the start of `date`.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let local_midnight: NaiveDateTime = date.and_time(NaiveTime::MIN);
        let utc = local_midnight - TimeDelta::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc)
    }

    /// One local calendar day.
    pub fn day_window(&self, date: NaiveDate) -> TimeWindow {
        let next = date.succ_opt().unwrap_or(date);
        TimeWindow {
            start: self.start_of_day(date),
            end: self.start_of_day(next),
        }
    }

    /// The local day containing `now`.
    pub fn today(&self, now: DateTime<Utc>) -> TimeWindow {
        self.day_window(self.local_date(now))
    }

    /// One local calendar month.
    ///
    /// ## Errors
    /// * `ValidationError::OutOfRange` for a month outside 1-12
    /// * `CoreError::InvalidPeriod` for a year chrono cannot represent
    pub fn month_window(&self, year: i32, month: u32) -> CoreResult<TimeWindow> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::OutOfRange {
                field: "month".to_string(),
                min: 1,
                max: 12,
            }
            .into());
        }
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| CoreError::InvalidPeriod {
            reason: format!("year {year} is out of range"),
        })?;
        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        let next = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(|| {
            CoreError::InvalidPeriod {
                reason: format!("year {next_year} is out of range"),
            }
        })?;
        Ok(TimeWindow {
            start: self.start_of_day(first),
            end: self.start_of_day(next),
        })
    }

    /// The local month containing `now`.
    pub fn this_month(&self, now: DateTime<Utc>) -> CoreResult<TimeWindow> {
        let today = self.local_date(now);
        self.month_window(today.year(), today.month())
    }

    /// The local year containing `now`.
    pub fn this_year(&self, now: DateTime<Utc>) -> CoreResult<TimeWindow> {
        let year = self.local_date(now).year();
        let first = NaiveDate::from_ymd_opt(year, 1, 1);
        let next = NaiveDate::from_ymd_opt(year + 1, 1, 1);
        match (first, next) {
            (Some(first), Some(next)) => Ok(TimeWindow {
                start: self.start_of_day(first),
                end: self.start_of_day(next),
            }),
            _ => Err(CoreError::InvalidPeriod {
                reason: format!("year {year} is out of range"),
            }),
        }
    }
}

/// English month name for 1-12, `"Unknown"` otherwise.
pub fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    month
        .checked_sub(1)
        .and_then(|i| NAMES.get(i as usize))
        .copied()
        .unwrap_or(crate::UNKNOWN)
}

// =============================================================================
// Unit Tests
// =============================================================================
