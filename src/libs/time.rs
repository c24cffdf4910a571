//! Date and time-of-day helpers shared by the rule parser and the stores.
//!
//! Dates travel as `YYYY-MM-DD` and times of day as `HH:MM`, both naive
//! local wall-clock values. Weekdays are `chrono::Weekday` internally and
//! numbered Monday=0 .. Sunday=6 wherever they are stored or exchanged.

use super::error::{Result, ScheduleError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Format used when a date and a time of day are compared as one string.
pub const SLOT_FORMAT: &str = "%Y-%m-%d %H:%M";

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| ScheduleError::DateFormat { value: value.to_string() })
}

pub fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT).map_err(|_| ScheduleError::TimeFormat { value: value.to_string() })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Truncates an instant to the minute-resolution key sessions are compared by.
pub fn slot_key(at: NaiveDateTime) -> String {
    at.format(SLOT_FORMAT).to_string()
}

/// Monday=0 .. Sunday=6.
pub fn weekday_index(day: Weekday) -> u8 {
    day.num_days_from_monday() as u8
}

pub fn weekday_from_index(index: i64) -> Result<Weekday> {
    usize::try_from(index)
        .ok()
        .and_then(|i| WEEKDAYS.get(i).copied())
        .ok_or_else(|| ScheduleError::InvalidWeekday { value: index.to_string() })
}

/// Normalises a weekday key coming from a form or a JSON payload.
///
/// Accepts the numeric index (`"0"`..`"6"`) as well as English names and
/// their usual abbreviations in any case.
pub fn parse_weekday(value: &str) -> Result<Weekday> {
    let key = value.trim();
    if let Ok(index) = key.parse::<i64>() {
        return weekday_from_index(index);
    }
    key.parse::<Weekday>().map_err(|_| ScheduleError::InvalidWeekday { value: value.to_string() })
}

/// Every calendar date from `start` to `end`, both inclusive.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}
