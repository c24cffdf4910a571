//! Typed failures of the scheduling and attendance core.
//!
//! Validation variants are raised before any storage is touched. Everything
//! raised inside an engine transaction causes that transaction to roll back,
//! so the caller always observes the state from before the call.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

/// Errors returned by rule parsing, the stores and the engine.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// A date string is not `YYYY-MM-DD`
    #[error("Invalid date '{value}', expected YYYY-MM-DD")]
    DateFormat { value: String },

    /// A time-of-day string is not `HH:MM`
    #[error("Invalid time '{value}', expected HH:MM")]
    TimeFormat { value: String },

    /// A weekday key could not be normalised to Monday..Sunday
    #[error("Invalid weekday '{value}', expected 0-6 or a day name")]
    InvalidWeekday { value: String },

    /// End date precedes start date
    #[error("End date {end} is before start date {start}")]
    Range { start: NaiveDate, end: NaiveDate },

    /// End time is not after start time
    #[error("End time {end} must be after start time {start}")]
    TimeRange { start: NaiveTime, end: NaiveTime },

    /// A rule meant for generation has no enabled weekday
    #[error("Select at least one weekday")]
    NoWeekdaysSelected,

    /// A session of the group is running right now
    #[error("Group {group_id} has a session in progress ({date} {start}-{end}); schedule changes are locked")]
    ScheduleLocked {
        group_id: i64,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    },

    /// The (group, date, start, end) slot already exists
    #[error("Session {date} {start}-{end} already exists for group {group_id}")]
    DuplicateSession {
        group_id: i64,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    },

    /// A referenced row does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

impl ScheduleError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        ScheduleError::NotFound { entity, id }
    }

    /// Returns true for failures detected before storage was touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ScheduleError::DateFormat { .. }
                | ScheduleError::TimeFormat { .. }
                | ScheduleError::InvalidWeekday { .. }
                | ScheduleError::Range { .. }
                | ScheduleError::TimeRange { .. }
                | ScheduleError::NoWeekdaysSelected
        )
    }
}

pub type Result<T, E = ScheduleError> = std::result::Result<T, E>;
