//! Receivers for matched occurrences.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Receives each match as it is found, synchronously and in scan order.
///
/// Implemented for every `FnMut(usize, NaiveDateTime)`, so a closure works
/// wherever a sink is expected:
///
/// ```
/// use chrono::NaiveDate;
/// use recurrence_engine::{Enumerator, Pattern};
///
/// let origin = NaiveDate::from_ymd_opt(2018, 9, 4).unwrap().and_hms_opt(11, 6, 0).unwrap();
/// let pattern = Pattern::builder(origin, 3).minute(0).build().unwrap();
/// let mut seen = Vec::new();
/// let count = Enumerator::new(pattern)
///     .unwrap()
///     .enumerate(&mut |sequence, date_time| seen.push((sequence, date_time)))
///     .unwrap();
/// assert_eq!(count, 3);
/// assert_eq!(seen[0].0, 1);
/// ```
pub trait MatchSink {
    /// Called once per match. `sequence` starts at 1 and increases by 1.
    fn on_matched(&mut self, sequence: usize, date_time: NaiveDateTime);
}

impl<F> MatchSink for F
where
    F: FnMut(usize, NaiveDateTime),
{
    fn on_matched(&mut self, sequence: usize, date_time: NaiveDateTime) {
        self(sequence, date_time)
    }
}

/// Discards every match. Useful when only the count matters.
impl MatchSink for () {
    fn on_matched(&mut self, _sequence: usize, _date_time: NaiveDateTime) {}
}

/// A single matched occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    /// 1-based position in the emitted sequence.
    pub sequence: usize,
    /// The matching date-time.
    pub date_time: NaiveDateTime,
}
