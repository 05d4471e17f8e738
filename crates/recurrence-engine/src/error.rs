//! Error types for recurrence-engine operations.

use thiserror::Error;

use crate::pattern::Field;

#[derive(Error, Debug)]
pub enum RecurrenceError {
    /// A date-time could not be built from the fixed fields in the current cycle
    /// (e.g. day 31 in a 30-day month, week 53 in a 52-week year).
    #[error("Invalid calendar value: {0}")]
    InvalidCalendarValue(String),

    #[error("Invalid field: {field} = {value} (expected {min}..={max})")]
    InvalidField {
        field: Field,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Invalid max matches: must be greater than zero")]
    InvalidMaxMatches,

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

pub type Result<T> = std::result::Result<T, RecurrenceError>;
