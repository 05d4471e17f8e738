//! Cascading enumeration of pattern occurrences.
//!
//! The search keeps a single `current` date-time (the last match, or the
//! anchor) and tries to advance it at the finest free [`Level`]. A level's
//! trial that matches becomes the new `current`, is emitted, and the search
//! restarts at the finest level to pick up any further matches inside the
//! same coarse unit. A trial that misses escalates once to the next coarser
//! level. Fixed levels pass straight through.
//!
//! # Bounded work
//!
//! [`Level::Year`] is terminal: a next-year trial that does not match ends the
//! search. Sparse patterns whose next occurrence is not reached by one step
//! of each level therefore stop early instead of scanning indefinitely, and
//! [`Enumerator::enumerate`] can report fewer matches than requested.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use recurrence_engine::{Direction, Enumerator, Pattern};
//!
//! let origin = NaiveDate::from_ymd_opt(2018, 9, 4).unwrap().and_hms_opt(11, 6, 0).unwrap();
//! let pattern = Pattern::builder(origin, 2)
//!     .direction(Direction::Forward)
//!     .month(9)
//!     .day(4)
//!     .hour(11)
//!     .minute(6)
//!     .build()
//!     .unwrap();
//!
//! let occurrences = Enumerator::new(pattern).unwrap().collect().unwrap();
//! assert_eq!(occurrences.len(), 2);
//! assert_eq!(occurrences[1].date_time.to_string(), "2019-09-04 11:06:00");
//! ```

use chrono::NaiveDateTime;

use crate::anchor::resolve_anchor;
use crate::calendar::{Calendar, Gregorian};
use crate::error::Result;
use crate::level::Level;
use crate::pattern::Pattern;
use crate::predicate;
use crate::sink::{MatchSink, Occurrence};

/// A pattern with its resolved anchor, ready to enumerate.
#[derive(Debug, Clone)]
pub struct Enumerator<C = Gregorian> {
    pattern: Pattern,
    calendar: C,
    anchor: NaiveDateTime,
}

impl Enumerator<Gregorian> {
    /// Resolve the anchor of `pattern` on the Gregorian calendar.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceError::InvalidCalendarValue`](crate::RecurrenceError::InvalidCalendarValue)
    /// if the fixed fields cannot be placed in the origin's cycle.
    pub fn new(pattern: Pattern) -> Result<Self> {
        Self::with_calendar(pattern, Gregorian)
    }
}

impl<C: Calendar> Enumerator<C> {
    /// Resolve the anchor of `pattern` on `calendar`.
    pub fn with_calendar(pattern: Pattern, calendar: C) -> Result<Self> {
        let anchor = resolve_anchor(&pattern, &calendar)?;
        Ok(Self {
            pattern,
            calendar,
            anchor,
        })
    }

    /// The pattern being enumerated.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The first candidate the search walks from.
    pub fn anchor(&self) -> NaiveDateTime {
        self.anchor
    }

    /// Whether `dt` satisfies every fixed field of the pattern.
    pub fn matches(&self, dt: NaiveDateTime) -> bool {
        predicate::matches(&self.pattern, &self.calendar, dt)
    }

    /// Run the search, handing each match to `sink`, and return how many
    /// matches were produced (at most the pattern's `max_matches`).
    ///
    /// Each call starts from the anchor, so repeated calls yield the same
    /// sequence.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceError::InvalidCalendarValue`](crate::RecurrenceError::InvalidCalendarValue)
    /// when a step needs a date the calendar cannot build, e.g. `day = 31`
    /// reaching a 30-day month. Matches emitted before the failure have
    /// already been delivered to `sink`.
    #[tracing::instrument(
        skip_all,
        fields(
            direction = %self.pattern.direction(),
            max_matches = self.pattern.max_matches(),
        )
    )]
    pub fn enumerate<S: MatchSink + ?Sized>(&self, sink: &mut S) -> Result<usize> {
        let mut search = Search {
            pattern: &self.pattern,
            calendar: &self.calendar,
            current: self.anchor,
            count: 0,
        };
        tracing::debug!(anchor = %self.anchor, "Starting enumeration");

        let anchor_qualifies = (self.anchor == self.pattern.origin()
            || self
                .pattern
                .direction()
                .is_beyond(self.anchor, self.pattern.origin()))
            && self.matches(self.anchor);
        if anchor_qualifies {
            search.emit(self.anchor, sink);
        }

        let outcome = search.run(sink)?;
        tracing::debug!(count = search.count, ?outcome, "Enumeration finished");
        Ok(search.count)
    }

    /// Run the search and return the matches in scan order.
    pub fn collect(&self) -> Result<Vec<Occurrence>> {
        let mut occurrences = Vec::with_capacity(self.pattern.max_matches().min(1024));
        self.enumerate(&mut |sequence, date_time| {
            occurrences.push(Occurrence {
                sequence,
                date_time,
            });
        })?;
        Ok(occurrences)
    }
}

/// How a search run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// `max_matches` reached.
    Complete,
    /// The coarsest level had nothing left to try.
    Exhausted,
}

/// Per-call search state.
struct Search<'a, C: ?Sized> {
    pattern: &'a Pattern,
    calendar: &'a C,
    current: NaiveDateTime,
    count: usize,
}

impl<C: Calendar + ?Sized> Search<'_, C> {
    fn run<S: MatchSink + ?Sized>(&mut self, sink: &mut S) -> Result<Outcome> {
        let max = self.pattern.max_matches();
        let mut level = Level::FINEST;

        while self.count < max {
            let trial = level.trial(self.pattern, self.calendar, self.current)?;
            let hit = trial.filter(|&candidate| {
                self.pattern.direction().is_beyond(candidate, self.current)
                    && predicate::matches(self.pattern, self.calendar, candidate)
            });

            match hit {
                Some(candidate) => {
                    self.emit(candidate, sink);
                    level = Level::FINEST;
                }
                None => match level.coarser() {
                    Some(next) => {
                        if trial.is_some() {
                            tracing::trace!(from = %level, to = %next, ?trial, "Escalating");
                        }
                        level = next;
                    }
                    None => return Ok(Outcome::Exhausted),
                },
            }
        }

        Ok(Outcome::Complete)
    }

    fn emit<S: MatchSink + ?Sized>(&mut self, candidate: NaiveDateTime, sink: &mut S) {
        self.current = candidate;
        self.count += 1;
        tracing::trace!(sequence = self.count, date_time = %candidate, "Matched");
        sink.on_matched(self.count, candidate);
    }
}
