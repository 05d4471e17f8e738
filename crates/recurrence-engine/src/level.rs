//! Search granularities and their single-step trials.
//!
//! Each [`Level`] knows how to move a date-time one of its units in the scan
//! direction and re-apply every finer fixed field, producing a trial that the
//! enumerator then tests. A fixed level has no trial of its own and passes the
//! search up to the next coarser level.

use std::fmt;

use chrono::{NaiveDateTime, Timelike};

use crate::anchor::{refine, reset_time, scan_months};
use crate::calendar::Calendar;
use crate::error::Result;
use crate::pattern::Pattern;

/// One of the five nested search granularities, finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Minute,
    Hour,
    DayOrWeekday,
    Month,
    Year,
}

impl Level {
    /// All levels, finest to coarsest. A level's position is its index here.
    pub const ALL: [Level; 5] = [
        Level::Minute,
        Level::Hour,
        Level::DayOrWeekday,
        Level::Month,
        Level::Year,
    ];

    pub const FINEST: Level = Level::Minute;

    /// The next coarser level, or `None` for [`Level::Year`].
    pub fn coarser(self) -> Option<Level> {
        Self::ALL.get(self as usize + 1).copied()
    }

    /// Whether `pattern` pins this level so it contributes no stepping.
    ///
    /// The day level is only pinned by a day without a weekday: a weekday
    /// still leaves the search free to hop between its occurrences.
    pub fn is_fixed(self, pattern: &Pattern) -> bool {
        match self {
            Level::Minute => pattern.minute().is_some(),
            Level::Hour => pattern.hour().is_some(),
            Level::DayOrWeekday => pattern.weekday().is_none() && pattern.day().is_some(),
            Level::Month => pattern.month().is_some(),
            Level::Year => pattern.year().is_some(),
        }
    }

    /// Move `current` one unit of this level in the scan direction and
    /// re-apply the finer fixed fields. `None` for a fixed level.
    ///
    /// # Errors
    ///
    /// Propagates calendar failures, e.g. a fixed day that the next month
    /// does not have.
    pub fn trial<C: Calendar + ?Sized>(
        self,
        pattern: &Pattern,
        calendar: &C,
        current: NaiveDateTime,
    ) -> Result<Option<NaiveDateTime>> {
        if self.is_fixed(pattern) {
            return Ok(None);
        }
        let sign = pattern.direction().sign();
        let trial = match self {
            Level::Minute => calendar.add_minutes(current, i64::from(sign))?,
            Level::Hour => {
                let stepped = calendar.add_hours(current, i64::from(sign))?;
                calendar.with_time(stepped, stepped.hour(), pattern.reset_minute())?
            }
            Level::DayOrWeekday => day_trial(pattern, calendar, current)?,
            Level::Month => {
                let stepped = calendar.add_months(current, sign)?;
                let stepped = calendar.with_day(stepped, pattern.day().unwrap_or(1))?;
                let stepped = reset_time(pattern, calendar, stepped)?;
                refine(pattern, calendar, stepped, current)?
            }
            Level::Year => {
                let stepped = calendar.add_years(current, sign)?;
                let stepped = calendar.with_month(stepped, pattern.month().unwrap_or(1))?;
                let stepped = calendar.with_day(stepped, pattern.day().unwrap_or(1))?;
                let stepped = reset_time(pattern, calendar, stepped)?;
                refine(pattern, calendar, stepped, current)?
            }
        };
        Ok(Some(trial))
    }
}

/// Next day, next weekday occurrence, or next n-th weekday of a month.
fn day_trial<C: Calendar + ?Sized>(
    pattern: &Pattern,
    calendar: &C,
    current: NaiveDateTime,
) -> Result<NaiveDateTime> {
    let direction = pattern.direction();
    let stepped = match pattern.weekday_rule() {
        Some(rule) if rule.ordinal.is_some() => {
            scan_months(pattern, calendar, rule, current, current)?
        }
        Some(rule) => calendar.adjacent_weekday(current, rule.weekday, direction, false)?,
        None => calendar.add_days(current, i64::from(direction.sign()))?,
    };
    reset_time(pattern, calendar, stepped)
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Minute => "minute",
            Level::Hour => "hour",
            Level::DayOrWeekday => "day",
            Level::Month => "month",
            Level::Year => "year",
        };
        f.write_str(name)
    }
}
