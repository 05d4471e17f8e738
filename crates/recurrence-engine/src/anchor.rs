//! Anchor resolution: the first candidate the search walks from.
//!
//! The anchor is built in precedence passes, each refining the placement left
//! by the previous one:
//!
//! 1. overlay the fixed year/month/day/hour/minute onto the origin
//! 2. quarter
//! 3. week of year, or else week of month
//! 4. weekday (with or without an ordinal)
//!
//! Passes 2–4 are shared with the month and year steps of the enumerator,
//! which re-place a coarse trial relative to the last match instead of the
//! origin. The anchor is not guaranteed to satisfy the pattern; the
//! enumerator re-checks it.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::calendar::Calendar;
use crate::error::Result;
use crate::pattern::{Pattern, WeekRule, WeekdayRule};

/// Resolve the anchor for `pattern`.
///
/// # Errors
///
/// Returns [`RecurrenceError::InvalidCalendarValue`](crate::RecurrenceError::InvalidCalendarValue)
/// if a fixed field cannot be placed in the origin's cycle (e.g. `day = 31`
/// with `month = 2`).
pub fn resolve_anchor<C: Calendar + ?Sized>(pattern: &Pattern, calendar: &C) -> Result<NaiveDateTime> {
    let origin = pattern.origin();
    let overlaid = overlay(pattern, calendar, origin)?;
    let anchor = refine(pattern, calendar, overlaid, origin)?;
    tracing::debug!(%origin, %overlaid, %anchor, "Resolved anchor");
    Ok(anchor)
}

/// Copy the fixed ordinary fields onto `origin`; unset fields keep the origin's value.
fn overlay<C: Calendar + ?Sized>(
    pattern: &Pattern,
    calendar: &C,
    origin: NaiveDateTime,
) -> Result<NaiveDateTime> {
    let mut candidate = origin;
    if let Some(year) = pattern.year() {
        candidate = calendar.with_year(candidate, year)?;
    }
    if let Some(month) = pattern.month() {
        candidate = calendar.with_month(candidate, month)?;
    }
    if let Some(day) = pattern.day() {
        candidate = calendar.with_day(candidate, day)?;
    }
    calendar.with_time(
        candidate,
        pattern.hour().unwrap_or(origin.hour()),
        pattern.minute().unwrap_or(origin.minute()),
    )
}

/// Apply the quarter, week and weekday passes to `candidate`, scanning until
/// the placement lies strictly past `reference` in the pattern's direction.
pub(crate) fn refine<C: Calendar + ?Sized>(
    pattern: &Pattern,
    calendar: &C,
    candidate: NaiveDateTime,
    reference: NaiveDateTime,
) -> Result<NaiveDateTime> {
    let mut candidate = candidate;

    if let Some(quarter) = pattern.quarter() {
        let start = calendar.start_of_quarter(candidate.year(), quarter)?;
        let placed = scan_days(pattern, calendar, start, reference)?;
        candidate = reset_time(pattern, calendar, placed)?;
    }

    if let Some(rule) = pattern.week_rule() {
        let start = match rule {
            WeekRule::OfYear(week) => calendar.start_of_week_of_year(candidate, week)?,
            WeekRule::OfMonth(week) => calendar.start_of_week_of_month(candidate, week)?,
        };
        let placed = scan_days(pattern, calendar, start, reference)?;
        candidate = reset_time(pattern, calendar, placed)?;
    }

    if let Some(rule) = pattern.weekday_rule() {
        let placed = match rule.ordinal {
            Some(_) => scan_months(pattern, calendar, rule, candidate, reference)?,
            None => {
                let direction = pattern.direction();
                let inclusive = direction.is_beyond(candidate, reference);
                calendar.adjacent_weekday(candidate, rule.weekday, direction, inclusive)?
            }
        };
        candidate = reset_time(pattern, calendar, placed)?;
    }

    Ok(candidate)
}

/// Set the time to the fixed hour/minute, or midnight for unset ones.
pub(crate) fn reset_time<C: Calendar + ?Sized>(
    pattern: &Pattern,
    calendar: &C,
    dt: NaiveDateTime,
) -> Result<NaiveDateTime> {
    calendar.with_time(dt, pattern.reset_hour(), pattern.reset_minute())
}

/// Step one day at a time from `start` until strictly past `reference`.
fn scan_days<C: Calendar + ?Sized>(
    pattern: &Pattern,
    calendar: &C,
    start: NaiveDateTime,
    reference: NaiveDateTime,
) -> Result<NaiveDateTime> {
    let direction = pattern.direction();
    let step = i64::from(direction.sign());
    let mut dt = start;
    while !direction.is_beyond(dt, reference) {
        dt = calendar.add_days(dt, step)?;
    }
    Ok(dt)
}

/// Take the n-th weekday of `start`'s month, then of each following (or
/// preceding) month, until it lies strictly past `reference`.
pub(crate) fn scan_months<C: Calendar + ?Sized>(
    pattern: &Pattern,
    calendar: &C,
    rule: WeekdayRule,
    start: NaiveDateTime,
    reference: NaiveDateTime,
) -> Result<NaiveDateTime> {
    let direction = pattern.direction();
    let ordinal = rule.ordinal.unwrap_or(1);
    // Step on a separate cursor: a fifth occurrence can spill into the next
    // month, and stepping back from there would land on the same month again.
    let mut month = start;
    let mut dt = calendar.nth_weekday_of_month(month, ordinal, rule.weekday)?;
    while !direction.is_beyond(dt, reference) {
        month = calendar.add_months(month, direction.sign())?;
        dt = calendar.nth_weekday_of_month(month, ordinal, rule.weekday)?;
    }
    Ok(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Gregorian;
    use crate::pattern::{Direction, PatternBuilder};
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn builder(origin: NaiveDateTime) -> PatternBuilder {
        Pattern::builder(origin, 10)
    }

    fn anchor_of(builder: PatternBuilder) -> Result<NaiveDateTime> {
        resolve_anchor(&builder.build().unwrap(), &Gregorian)
    }

    #[test]
    fn test_no_fields_anchor_is_origin() {
        let origin = dt(2018, 9, 4, 11, 6);
        assert_eq!(anchor_of(builder(origin)).unwrap(), origin);
    }

    #[test]
    fn test_overlay_keeps_unset_fields() {
        let origin = dt(2018, 9, 4, 11, 6);
        let anchor = anchor_of(builder(origin).month(12).minute(45)).unwrap();
        assert_eq!(anchor, dt(2018, 12, 4, 11, 45));
    }

    #[test]
    fn test_overlay_clamps_origin_day_to_month() {
        let origin = dt(2018, 1, 31, 8, 0);
        let anchor = anchor_of(builder(origin).month(2)).unwrap();
        assert_eq!(anchor, dt(2018, 2, 28, 8, 0));
    }

    #[test]
    fn test_overlay_rejects_missing_day() {
        let origin = dt(2018, 9, 4, 11, 6);
        let err = anchor_of(builder(origin).month(2).day(31)).unwrap_err();
        assert!(err.to_string().contains("Invalid calendar value"), "got: {err}");
    }

    #[test]
    fn test_quarter_pass_lands_after_origin() {
        let origin = dt(2018, 9, 14, 11, 6);
        let anchor = anchor_of(builder(origin).quarter(3).hour(1).minute(30)).unwrap();
        assert_eq!(anchor, dt(2018, 9, 15, 1, 30));
    }

    #[test]
    fn test_quarter_pass_backward_keeps_earlier_start() {
        let origin = dt(2018, 9, 14, 11, 6);
        let anchor = anchor_of(
            builder(origin)
                .direction(Direction::Backward)
                .quarter(3),
        )
        .unwrap();
        assert_eq!(anchor, dt(2018, 7, 1, 0, 0));
    }

    #[test]
    fn test_week_of_month_pass() {
        let origin = dt(2018, 9, 14, 11, 6);
        let anchor = anchor_of(
            builder(origin)
                .month(9)
                .hour(1)
                .minute(30)
                .week_of_month(2),
        )
        .unwrap();
        assert_eq!(anchor, dt(2018, 9, 15, 1, 30));
    }

    #[test]
    fn test_week_of_year_pass() {
        let origin = dt(2018, 9, 14, 11, 6);
        let anchor = anchor_of(builder(origin).hour(1).minute(30).week_of_year(40)).unwrap();
        assert_eq!(anchor, dt(2018, 10, 1, 1, 30));
    }

    #[test]
    fn test_weekday_pass_inclusive_after_overlay() {
        // Overlay moves 11:06 to 11:30, already after the origin, so a Monday
        // on the overlaid date itself would qualify.
        let origin = dt(2018, 9, 4, 11, 6);
        let anchor = anchor_of(
            builder(origin)
                .year(2018)
                .month(9)
                .minute(30)
                .weekday(1),
        )
        .unwrap();
        assert_eq!(anchor, dt(2018, 9, 10, 0, 30));

        let monday = dt(2018, 9, 10, 11, 6);
        let anchor = anchor_of(builder(monday).minute(30).weekday(1)).unwrap();
        assert_eq!(anchor, dt(2018, 9, 10, 0, 30));
    }

    #[test]
    fn test_weekday_pass_strict_when_not_after_origin() {
        let monday = dt(2018, 9, 10, 11, 6);
        let anchor = anchor_of(builder(monday).weekday(1)).unwrap();
        assert_eq!(anchor, dt(2018, 9, 17, 0, 0));

        let anchor = anchor_of(
            builder(monday)
                .direction(Direction::Backward)
                .weekday(1),
        )
        .unwrap();
        assert_eq!(anchor, dt(2018, 9, 3, 0, 0));
    }

    #[test]
    fn test_weekday_ordinal_pass_moves_to_next_month() {
        // Second Monday of September 2018 (the 10th) precedes the origin
        let origin = dt(2018, 9, 14, 11, 6);
        let anchor = anchor_of(
            builder(origin)
                .hour(1)
                .minute(30)
                .weekday(1)
                .weekday_ordinal(2),
        )
        .unwrap();
        assert_eq!(anchor, dt(2018, 10, 8, 1, 30));
    }

    #[test]
    fn test_weekday_ordinal_pass_backward() {
        let origin = dt(2018, 9, 4, 11, 6);
        let anchor = anchor_of(
            builder(origin)
                .direction(Direction::Backward)
                .weekday(1)
                .weekday_ordinal(2),
        )
        .unwrap();
        assert_eq!(anchor, dt(2018, 8, 13, 0, 0));
    }

    #[test]
    fn test_scan_months_backward_past_spilled_fifth() {
        // January 2018 has five Mondays (1, 8, 15, 22, 29); December 2017 has four
        let pattern = builder(dt(2018, 1, 29, 0, 0))
            .direction(Direction::Backward)
            .weekday(1)
            .weekday_ordinal(5)
            .build()
            .unwrap();
        let rule = pattern.weekday_rule().unwrap();
        let placed = scan_months(
            &pattern,
            &Gregorian,
            rule,
            dt(2018, 1, 29, 0, 0),
            dt(2018, 1, 29, 0, 0),
        )
        .unwrap();
        // December 2017's "fifth Monday" spills to 2018-01-01
        assert_eq!(placed, dt(2018, 1, 1, 0, 0));
    }
}
