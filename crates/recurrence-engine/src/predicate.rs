//! Field-by-field test of a candidate date-time against a pattern.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::calendar::Calendar;
use crate::pattern::{Pattern, WeekRule};

/// Whether `dt` satisfies every fixed field of `pattern`.
///
/// Fields are checked in order (year, month, day, hour, minute, weekday,
/// weekday ordinal, quarter, week of month, week of year) and the first
/// mismatch short-circuits. The weekday ordinal only counts when a weekday is
/// set, and week of month is ignored when week of year is set.
pub fn matches<C: Calendar + ?Sized>(pattern: &Pattern, calendar: &C, dt: NaiveDateTime) -> bool {
    if pattern.year().is_some_and(|year| dt.year() != year) {
        return false;
    }
    if pattern.month().is_some_and(|month| dt.month() != month) {
        return false;
    }
    if pattern.day().is_some_and(|day| dt.day() != day) {
        return false;
    }
    if pattern.hour().is_some_and(|hour| dt.hour() != hour) {
        return false;
    }
    if pattern.minute().is_some_and(|minute| dt.minute() != minute) {
        return false;
    }
    if let Some(rule) = pattern.weekday_rule() {
        if calendar.iso_weekday(dt) != rule.weekday {
            return false;
        }
        if rule
            .ordinal
            .is_some_and(|ordinal| calendar.weekday_ordinal(dt) != ordinal)
        {
            return false;
        }
    }
    if pattern
        .quarter()
        .is_some_and(|quarter| calendar.quarter(dt) != quarter)
    {
        return false;
    }
    match pattern.week_rule() {
        Some(WeekRule::OfMonth(week)) => calendar.week_of_month(dt) == week,
        Some(WeekRule::OfYear(week)) => calendar.week_of_year(dt) == week,
        None => true,
    }
}
