//! Recurrence patterns: an origin, a scan direction, and up to ten fixed
//! calendar fields.
//!
//! A [`Pattern`] is immutable once built. Unset fields are wildcards. Every
//! field value is range-checked on its own by [`PatternBuilder::build`], but
//! combinations are not checked against each other: `day = 31` with
//! `month = 2` builds fine and fails later, when the enumerator first tries
//! to construct that date.
//!
//! Patterns round-trip through JSON:
//!
//! ```
//! use recurrence_engine::Pattern;
//!
//! let pattern = Pattern::from_json(
//!     r#"{"origin":"2018-09-04T11:06:00","month":9,"day":4,"max_matches":2}"#,
//! )
//! .unwrap();
//! assert_eq!(pattern.month(), Some(9));
//! assert_eq!(pattern.hour(), None);
//! ```

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::calendar::Gregorian;
use crate::error::{RecurrenceError, Result};
use crate::predicate;

// ── Direction ───────────────────────────────────────────────────────────────

/// Which way the search steps from its anchor.
///
/// The anchor is the origin with the fixed fields overlaid, so it can land on
/// the other side of the origin (e.g. `month = 3` from a September origin).
/// Such an anchor is not emitted, but the walk still starts from it: a
/// forward run can then yield date-times earlier than the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Each match is later than the previous one.
    #[default]
    Forward,
    /// Each match is earlier than the previous one.
    Backward,
}

impl Direction {
    /// `1` for forward, `-1` for backward.
    pub fn sign(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }

    /// Whether `candidate` lies strictly past `reference` in this direction.
    pub fn is_beyond(self, candidate: NaiveDateTime, reference: NaiveDateTime) -> bool {
        match self {
            Direction::Forward => candidate > reference,
            Direction::Backward => candidate < reference,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Backward => f.write_str("backward"),
        }
    }
}

// ── Field ───────────────────────────────────────────────────────────────────

/// One of the ten matchable calendar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    /// ISO day of week, Monday = 1 through Sunday = 7.
    Weekday,
    /// Which occurrence of the weekday within its month (1st through 5th).
    WeekdayOrdinal,
    Quarter,
    /// ISO week within the month (Monday start, first week has at least 4 days).
    WeekOfMonth,
    /// ISO week within the year (Monday start, first week has at least 4 days).
    WeekOfYear,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Year,
        Field::Month,
        Field::Day,
        Field::Hour,
        Field::Minute,
        Field::Weekday,
        Field::WeekdayOrdinal,
        Field::Quarter,
        Field::WeekOfMonth,
        Field::WeekOfYear,
    ];

    /// The inclusive range of values accepted for this field.
    pub fn range(self) -> (i64, i64) {
        match self {
            Field::Year => (
                i64::from(NaiveDate::MIN.year()),
                i64::from(NaiveDate::MAX.year()),
            ),
            Field::Month => (1, 12),
            Field::Day => (1, 31),
            Field::Hour => (0, 23),
            Field::Minute => (0, 59),
            Field::Weekday => (1, 7),
            Field::WeekdayOrdinal => (1, 5),
            Field::Quarter => (1, 4),
            Field::WeekOfMonth => (1, 6),
            Field::WeekOfYear => (1, 53),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Year => "year",
            Field::Month => "month",
            Field::Day => "day",
            Field::Hour => "hour",
            Field::Minute => "minute",
            Field::Weekday => "weekday",
            Field::WeekdayOrdinal => "weekday_ordinal",
            Field::Quarter => "quarter",
            Field::WeekOfMonth => "week_of_month",
            Field::WeekOfYear => "week_of_year",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Derived rules ───────────────────────────────────────────────────────────

/// The effective week constraint after applying precedence
/// (week of year wins over week of month).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WeekRule {
    OfYear(u32),
    OfMonth(u32),
}

/// The effective weekday constraint. The ordinal only exists alongside a weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WeekdayRule {
    pub weekday: u32,
    pub ordinal: Option<u32>,
}

// ── Pattern ─────────────────────────────────────────────────────────────────

/// An immutable recurrence pattern. Build one with [`Pattern::builder`] or
/// decode one with [`Pattern::from_json`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PatternBuilder")]
pub struct Pattern {
    origin: NaiveDateTime,
    direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hour: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minute: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weekday: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weekday_ordinal: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quarter: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    week_of_month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    week_of_year: Option<u32>,
    max_matches: usize,
}

impl Pattern {
    /// Start building a pattern anchored at `origin` that emits at most
    /// `max_matches` occurrences.
    pub fn builder(origin: NaiveDateTime, max_matches: usize) -> PatternBuilder {
        PatternBuilder::new(origin, max_matches)
    }

    /// Decode a pattern from JSON. Field values are range-checked the same
    /// way [`PatternBuilder::build`] checks them.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceError::InvalidPattern`] if the document is malformed
    /// or any value is rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RecurrenceError::InvalidPattern(e.to_string()))
    }

    /// Encode the pattern as JSON. Unset fields are omitted.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| RecurrenceError::InvalidPattern(e.to_string()))
    }

    /// Whether `dt` satisfies every fixed field, using the Gregorian calendar.
    pub fn matches(&self, dt: NaiveDateTime) -> bool {
        predicate::matches(self, &Gregorian, dt)
    }

    pub fn origin(&self) -> NaiveDateTime {
        self.origin
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn max_matches(&self) -> usize {
        self.max_matches
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn day(&self) -> Option<u32> {
        self.day
    }

    pub fn hour(&self) -> Option<u32> {
        self.hour
    }

    pub fn minute(&self) -> Option<u32> {
        self.minute
    }

    pub fn weekday(&self) -> Option<u32> {
        self.weekday
    }

    pub fn weekday_ordinal(&self) -> Option<u32> {
        self.weekday_ordinal
    }

    pub fn quarter(&self) -> Option<u32> {
        self.quarter
    }

    pub fn week_of_month(&self) -> Option<u32> {
        self.week_of_month
    }

    pub fn week_of_year(&self) -> Option<u32> {
        self.week_of_year
    }

    /// The value of `field`, if fixed.
    pub fn get(&self, field: Field) -> Option<i64> {
        match field {
            Field::Year => self.year.map(i64::from),
            Field::Month => self.month.map(i64::from),
            Field::Day => self.day.map(i64::from),
            Field::Hour => self.hour.map(i64::from),
            Field::Minute => self.minute.map(i64::from),
            Field::Weekday => self.weekday.map(i64::from),
            Field::WeekdayOrdinal => self.weekday_ordinal.map(i64::from),
            Field::Quarter => self.quarter.map(i64::from),
            Field::WeekOfMonth => self.week_of_month.map(i64::from),
            Field::WeekOfYear => self.week_of_year.map(i64::from),
        }
    }

    /// Hour that finer-grained resets fall back to: the fixed hour, else midnight.
    pub(crate) fn reset_hour(&self) -> u32 {
        self.hour.unwrap_or(0)
    }

    pub(crate) fn reset_minute(&self) -> u32 {
        self.minute.unwrap_or(0)
    }

    pub(crate) fn week_rule(&self) -> Option<WeekRule> {
        match (self.week_of_year, self.week_of_month) {
            (Some(week), _) => Some(WeekRule::OfYear(week)),
            (None, Some(week)) => Some(WeekRule::OfMonth(week)),
            (None, None) => None,
        }
    }

    pub(crate) fn weekday_rule(&self) -> Option<WeekdayRule> {
        self.weekday.map(|weekday| WeekdayRule {
            weekday,
            ordinal: self.weekday_ordinal,
        })
    }
}

// ── PatternBuilder ──────────────────────────────────────────────────────────

/// Fluent builder for [`Pattern`]. Also the wire shape a pattern is decoded from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternBuilder {
    origin: NaiveDateTime,
    #[serde(default)]
    direction: Direction,
    #[serde(default)]
    year: Option<i64>,
    #[serde(default)]
    month: Option<i64>,
    #[serde(default)]
    day: Option<i64>,
    #[serde(default)]
    hour: Option<i64>,
    #[serde(default)]
    minute: Option<i64>,
    #[serde(default)]
    weekday: Option<i64>,
    #[serde(default)]
    weekday_ordinal: Option<i64>,
    #[serde(default)]
    quarter: Option<i64>,
    #[serde(default)]
    week_of_month: Option<i64>,
    #[serde(default)]
    week_of_year: Option<i64>,
    max_matches: usize,
}

impl PatternBuilder {
    pub fn new(origin: NaiveDateTime, max_matches: usize) -> Self {
        Self {
            origin,
            max_matches,
            ..Default::default()
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Fix `field` to `value`. Setting the same field twice keeps the last value.
    pub fn field(mut self, field: Field, value: i64) -> Self {
        *self.slot(field) = Some(value);
        self
    }

    /// Fix every `(field, value)` pair, as from a sparse field map.
    pub fn fields<I>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = (Field, i64)>,
    {
        fields
            .into_iter()
            .fold(self, |builder, (field, value)| builder.field(field, value))
    }

    pub fn year(self, year: i32) -> Self {
        self.field(Field::Year, i64::from(year))
    }

    pub fn month(self, month: u32) -> Self {
        self.field(Field::Month, i64::from(month))
    }

    pub fn day(self, day: u32) -> Self {
        self.field(Field::Day, i64::from(day))
    }

    pub fn hour(self, hour: u32) -> Self {
        self.field(Field::Hour, i64::from(hour))
    }

    pub fn minute(self, minute: u32) -> Self {
        self.field(Field::Minute, i64::from(minute))
    }

    pub fn weekday(self, weekday: u32) -> Self {
        self.field(Field::Weekday, i64::from(weekday))
    }

    pub fn weekday_ordinal(self, ordinal: u32) -> Self {
        self.field(Field::WeekdayOrdinal, i64::from(ordinal))
    }

    pub fn quarter(self, quarter: u32) -> Self {
        self.field(Field::Quarter, i64::from(quarter))
    }

    pub fn week_of_month(self, week: u32) -> Self {
        self.field(Field::WeekOfMonth, i64::from(week))
    }

    pub fn week_of_year(self, week: u32) -> Self {
        self.field(Field::WeekOfYear, i64::from(week))
    }

    /// Validate and freeze the pattern. Seconds and sub-seconds of the origin
    /// are truncated.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceError::InvalidMaxMatches`] if `max_matches` is zero,
    /// or [`RecurrenceError::InvalidField`] for the first field outside its
    /// [`Field::range`].
    pub fn build(self) -> Result<Pattern> {
        if self.max_matches == 0 {
            return Err(RecurrenceError::InvalidMaxMatches);
        }

        let origin = self
            .origin
            .date()
            .and_hms_opt(self.origin.hour(), self.origin.minute(), 0)
            .ok_or_else(|| {
                RecurrenceError::InvalidCalendarValue(format!("origin '{}'", self.origin))
            })?;

        Ok(Pattern {
            origin,
            direction: self.direction,
            year: checked(Field::Year, self.year)?,
            month: checked(Field::Month, self.month)?,
            day: checked(Field::Day, self.day)?,
            hour: checked(Field::Hour, self.hour)?,
            minute: checked(Field::Minute, self.minute)?,
            weekday: checked(Field::Weekday, self.weekday)?,
            weekday_ordinal: checked(Field::WeekdayOrdinal, self.weekday_ordinal)?,
            quarter: checked(Field::Quarter, self.quarter)?,
            week_of_month: checked(Field::WeekOfMonth, self.week_of_month)?,
            week_of_year: checked(Field::WeekOfYear, self.week_of_year)?,
            max_matches: self.max_matches,
        })
    }

    fn slot(&mut self, field: Field) -> &mut Option<i64> {
        match field {
            Field::Year => &mut self.year,
            Field::Month => &mut self.month,
            Field::Day => &mut self.day,
            Field::Hour => &mut self.hour,
            Field::Minute => &mut self.minute,
            Field::Weekday => &mut self.weekday,
            Field::WeekdayOrdinal => &mut self.weekday_ordinal,
            Field::Quarter => &mut self.quarter,
            Field::WeekOfMonth => &mut self.week_of_month,
            Field::WeekOfYear => &mut self.week_of_year,
        }
    }
}

impl TryFrom<PatternBuilder> for Pattern {
    type Error = RecurrenceError;

    fn try_from(builder: PatternBuilder) -> Result<Self> {
        builder.build()
    }
}

/// Range-check an optional field value and narrow it to the stored type.
fn checked<T: TryFrom<i64>>(field: Field, value: Option<i64>) -> Result<Option<T>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let (min, max) = field.range();
    let out_of_range = || RecurrenceError::InvalidField {
        field,
        value,
        min,
        max,
    };
    if !(min..=max).contains(&value) {
        return Err(out_of_range());
    }
    T::try_from(value).map(Some).map_err(|_| out_of_range())
}

// ── Tests ───────────────────────────────────────────────────────────────────
