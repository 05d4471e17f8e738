//! Calendar arithmetic and derived calendar fields.
//!
//! The search engine never touches date arithmetic directly; it goes through
//! the [`Calendar`] trait so it can be driven by a test double. [`Gregorian`]
//! is the production implementation on top of `chrono`'s proleptic Gregorian
//! calendar.
//!
//! # Conventions
//!
//! - Weekdays are ISO numbers: Monday = 1 through Sunday = 7.
//! - Week-of-month and week-of-year use Monday-start weeks where week 1 is the
//!   first week holding at least four days of the month/year. Days before it
//!   fall in week 0.
//! - Adding months or years clamps the day to the end of a shorter month
//!   (Jan 31 + 1 month = Feb 28). Setting the day to one that does not exist
//!   is an error, never a rollover.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::error::{RecurrenceError, Result};
use crate::pattern::Direction;

/// Fewest days of a month/year that the first numbered week must contain.
const MIN_DAYS_IN_FIRST_WEEK: i64 = 4;

/// Date-time arithmetic and derived fields used by the search engine.
pub trait Calendar {
    fn add_years(&self, dt: NaiveDateTime, years: i32) -> Result<NaiveDateTime>;
    fn add_months(&self, dt: NaiveDateTime, months: i32) -> Result<NaiveDateTime>;
    fn add_days(&self, dt: NaiveDateTime, days: i64) -> Result<NaiveDateTime>;
    fn add_hours(&self, dt: NaiveDateTime, hours: i64) -> Result<NaiveDateTime>;
    fn add_minutes(&self, dt: NaiveDateTime, minutes: i64) -> Result<NaiveDateTime>;

    /// Replace the year, clamping Feb 29 to Feb 28 in common years.
    fn with_year(&self, dt: NaiveDateTime, year: i32) -> Result<NaiveDateTime>;
    /// Replace the month, clamping the day to the month's length.
    fn with_month(&self, dt: NaiveDateTime, month: u32) -> Result<NaiveDateTime>;
    /// Replace the day of month. Fails if the month has no such day.
    fn with_day(&self, dt: NaiveDateTime, day: u32) -> Result<NaiveDateTime>;
    /// Replace the time of day; seconds become zero.
    fn with_time(&self, dt: NaiveDateTime, hour: u32, minute: u32) -> Result<NaiveDateTime>;

    /// Midnight on the first day of `quarter` (1–4) in `year`.
    fn start_of_quarter(&self, year: i32, quarter: u32) -> Result<NaiveDateTime>;
    /// The Monday of week `week` of `dt`'s year, keeping `dt`'s time of day.
    fn start_of_week_of_year(&self, dt: NaiveDateTime, week: u32) -> Result<NaiveDateTime>;
    /// The Monday of week `week` of `dt`'s month, keeping `dt`'s time of day.
    fn start_of_week_of_month(&self, dt: NaiveDateTime, week: u32) -> Result<NaiveDateTime>;
    /// The `ordinal`-th `weekday` counted from the first of `dt`'s month,
    /// keeping `dt`'s time of day. A fifth occurrence that does not exist runs
    /// into the following month.
    fn nth_weekday_of_month(
        &self,
        dt: NaiveDateTime,
        ordinal: u32,
        weekday: u32,
    ) -> Result<NaiveDateTime>;
    /// The closest `weekday` from `dt` in `direction`. With `inclusive`, `dt`
    /// itself qualifies when it already falls on `weekday`.
    fn adjacent_weekday(
        &self,
        dt: NaiveDateTime,
        weekday: u32,
        direction: Direction,
        inclusive: bool,
    ) -> Result<NaiveDateTime>;

    /// ISO day of week, Monday = 1.
    fn iso_weekday(&self, dt: NaiveDateTime) -> u32;
    /// How many times `dt`'s weekday has occurred in its month, up to and including `dt`.
    fn weekday_ordinal(&self, dt: NaiveDateTime) -> u32;
    fn quarter(&self, dt: NaiveDateTime) -> u32;
    fn week_of_month(&self, dt: NaiveDateTime) -> u32;
    fn week_of_year(&self, dt: NaiveDateTime) -> u32;
}

/// The proleptic Gregorian calendar, backed by `chrono`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gregorian;

impl Calendar for Gregorian {
    fn add_years(&self, dt: NaiveDateTime, years: i32) -> Result<NaiveDateTime> {
        let months = years
            .checked_mul(12)
            .ok_or_else(|| overflow(dt, "years", i64::from(years)))?;
        self.add_months(dt, months)
    }

    fn add_months(&self, dt: NaiveDateTime, months: i32) -> Result<NaiveDateTime> {
        let shifted = if months >= 0 {
            dt.checked_add_months(Months::new(months.unsigned_abs()))
        } else {
            dt.checked_sub_months(Months::new(months.unsigned_abs()))
        };
        shifted.ok_or_else(|| overflow(dt, "months", i64::from(months)))
    }

    fn add_days(&self, dt: NaiveDateTime, days: i64) -> Result<NaiveDateTime> {
        TimeDelta::try_days(days)
            .and_then(|delta| dt.checked_add_signed(delta))
            .ok_or_else(|| overflow(dt, "days", days))
    }

    fn add_hours(&self, dt: NaiveDateTime, hours: i64) -> Result<NaiveDateTime> {
        TimeDelta::try_hours(hours)
            .and_then(|delta| dt.checked_add_signed(delta))
            .ok_or_else(|| overflow(dt, "hours", hours))
    }

    fn add_minutes(&self, dt: NaiveDateTime, minutes: i64) -> Result<NaiveDateTime> {
        TimeDelta::try_minutes(minutes)
            .and_then(|delta| dt.checked_add_signed(delta))
            .ok_or_else(|| overflow(dt, "minutes", minutes))
    }

    fn with_year(&self, dt: NaiveDateTime, year: i32) -> Result<NaiveDateTime> {
        let last = days_in_month(year, dt.month())?;
        build(year, dt.month(), dt.day().min(last), dt.time())
    }

    fn with_month(&self, dt: NaiveDateTime, month: u32) -> Result<NaiveDateTime> {
        let last = days_in_month(dt.year(), month)?;
        build(dt.year(), month, dt.day().min(last), dt.time())
    }

    fn with_day(&self, dt: NaiveDateTime, day: u32) -> Result<NaiveDateTime> {
        build(dt.year(), dt.month(), day, dt.time())
    }

    fn with_time(&self, dt: NaiveDateTime, hour: u32, minute: u32) -> Result<NaiveDateTime> {
        let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| {
            RecurrenceError::InvalidCalendarValue(format!("time {hour:02}:{minute:02}"))
        })?;
        Ok(dt.date().and_time(time))
    }

    fn start_of_quarter(&self, year: i32, quarter: u32) -> Result<NaiveDateTime> {
        if !(1..=4).contains(&quarter) {
            return Err(RecurrenceError::InvalidCalendarValue(format!(
                "quarter {quarter}"
            )));
        }
        build(year, 3 * (quarter - 1) + 1, 1, NaiveTime::MIN)
    }

    fn start_of_week_of_year(&self, dt: NaiveDateTime, week: u32) -> Result<NaiveDateTime> {
        let last_week = self.week_of_year(last_day_of_year(dt)?);
        if week == 0 || week > last_week {
            return Err(RecurrenceError::InvalidCalendarValue(format!(
                "week {week} of {} (last week is {last_week})",
                dt.year()
            )));
        }
        let current = self.week_of_year(dt);
        self.shift_to_week_start(dt, i64::from(week) - i64::from(current))
    }

    fn start_of_week_of_month(&self, dt: NaiveDateTime, week: u32) -> Result<NaiveDateTime> {
        let last_week = self.week_of_month(last_day_of_month(dt)?);
        if week == 0 || week > last_week {
            return Err(RecurrenceError::InvalidCalendarValue(format!(
                "week {week} of {}-{:02} (last week is {last_week})",
                dt.year(),
                dt.month()
            )));
        }
        let current = self.week_of_month(dt);
        self.shift_to_week_start(dt, i64::from(week) - i64::from(current))
    }

    fn nth_weekday_of_month(
        &self,
        dt: NaiveDateTime,
        ordinal: u32,
        weekday: u32,
    ) -> Result<NaiveDateTime> {
        if !(1..=5).contains(&ordinal) {
            return Err(RecurrenceError::InvalidCalendarValue(format!(
                "weekday ordinal {ordinal}"
            )));
        }
        check_weekday(weekday)?;
        let first = build(dt.year(), dt.month(), 1, dt.time())?;
        let diff = (i64::from(weekday) - i64::from(self.iso_weekday(first))).rem_euclid(7);
        let first_occurrence = self.add_days(first, diff)?;
        self.add_days(first_occurrence, 7 * (i64::from(ordinal) - 1))
    }

    fn adjacent_weekday(
        &self,
        dt: NaiveDateTime,
        weekday: u32,
        direction: Direction,
        inclusive: bool,
    ) -> Result<NaiveDateTime> {
        check_weekday(weekday)?;
        let target = i64::from(weekday);
        let current = i64::from(self.iso_weekday(dt));
        let distance = match direction {
            Direction::Forward => (target - current).rem_euclid(7),
            Direction::Backward => (current - target).rem_euclid(7),
        };
        let distance = if distance == 0 && !inclusive { 7 } else { distance };
        self.add_days(dt, distance * i64::from(direction.sign()))
    }

    fn iso_weekday(&self, dt: NaiveDateTime) -> u32 {
        dt.weekday().number_from_monday()
    }

    fn weekday_ordinal(&self, dt: NaiveDateTime) -> u32 {
        (dt.day() - 1) / 7 + 1
    }

    fn quarter(&self, dt: NaiveDateTime) -> u32 {
        (dt.month() - 1) / 3 + 1
    }

    fn week_of_month(&self, dt: NaiveDateTime) -> u32 {
        week_number(dt.day(), self.iso_weekday(dt))
    }

    fn week_of_year(&self, dt: NaiveDateTime) -> u32 {
        week_number(dt.ordinal(), self.iso_weekday(dt))
    }
}

impl Gregorian {
    /// Move `weeks` weeks from `dt`, then back to that week's Monday.
    fn shift_to_week_start(&self, dt: NaiveDateTime, weeks: i64) -> Result<NaiveDateTime> {
        let shifted = self.add_days(dt, 7 * weeks)?;
        let back = i64::from(self.iso_weekday(shifted)) - 1;
        self.add_days(shifted, -back)
    }
}

// ── Internal helpers ────────────────────────────────────────────────────────

/// Week number of the `day`-th day (of a month or a year) falling on ISO weekday `weekday`.
fn week_number(day: u32, weekday: u32) -> u32 {
    let day = i64::from(day);
    let week_start = (day - i64::from(weekday)).rem_euclid(7);
    let offset = if week_start + 1 > MIN_DAYS_IN_FIRST_WEEK {
        7 - week_start
    } else {
        -week_start
    };
    // Always non-negative: offset >= -3 and day >= 1.
    ((7 + offset + day - 1) / 7) as u32
}

fn build(year: i32, month: u32, day: u32, time: NaiveTime) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|date| date.and_time(time))
        .ok_or_else(|| {
            RecurrenceError::InvalidCalendarValue(format!("{year:04}-{month:02}-{day:02}"))
        })
}

fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map(|last| last.day())
        .ok_or_else(|| RecurrenceError::InvalidCalendarValue(format!("{year:04}-{month:02}")))
}

fn last_day_of_month(dt: NaiveDateTime) -> Result<NaiveDateTime> {
    let last = days_in_month(dt.year(), dt.month())?;
    build(dt.year(), dt.month(), last, dt.time())
}

fn last_day_of_year(dt: NaiveDateTime) -> Result<NaiveDateTime> {
    build(dt.year(), 12, 31, dt.time())
}

fn check_weekday(weekday: u32) -> Result<()> {
    if (1..=7).contains(&weekday) {
        Ok(())
    } else {
        Err(RecurrenceError::InvalidCalendarValue(format!(
            "weekday {weekday}"
        )))
    }
}

fn overflow(dt: NaiveDateTime, unit: &str, amount: i64) -> RecurrenceError {
    RecurrenceError::InvalidCalendarValue(format!("{dt} {amount:+} {unit} is out of range"))
}

// ── Tests ───────────────────────────────────────────────────────────────────
