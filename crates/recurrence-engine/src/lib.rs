//! # recurrence-engine
//!
//! Deterministic enumeration of recurring calendar occurrences.
//!
//! A [`Pattern`] fixes any of ten calendar fields (year, month, day, hour,
//! minute, weekday, weekday ordinal, quarter, week of month, week of year)
//! around an origin date-time. An [`Enumerator`] resolves an anchor near the
//! origin and then walks time minute → hour → day → month → year, emitting
//! every date-time that satisfies all fixed fields, in scan order, until the
//! requested count is reached or the search gives up.
//!
//! ## Modules
//!
//! - [`pattern`] — Patterns, fields, scan direction, JSON encoding
//! - [`calendar`] — Calendar arithmetic and derived fields (ISO weeks, quarters, ordinals)
//! - [`predicate`] — Does a date-time satisfy a pattern?
//! - [`anchor`] — First candidate near the origin
//! - [`level`] — Search granularities and their single-step trials
//! - [`enumerator`] — The cascading search
//! - [`sink`] — Match receivers
//! - [`error`] — Error types

pub mod anchor;
pub mod calendar;
pub mod enumerator;
pub mod error;
pub mod level;
pub mod pattern;
pub mod predicate;
pub mod sink;

pub use anchor::resolve_anchor;
pub use calendar::{Calendar, Gregorian};
pub use enumerator::Enumerator;
pub use error::{RecurrenceError, Result};
pub use level::Level;
pub use pattern::{Direction, Field, Pattern, PatternBuilder};
pub use sink::{MatchSink, Occurrence};
