//! Expansion of a schedule rule into concrete lesson slots.
//!
//! Pure: nothing here reads or writes storage. The engine deletes the rows
//! being replaced and inserts what [`materialize`] returns.

use super::rule::ScheduleRule;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// A lesson slot about to be stored for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewSession {
    pub group_id: i64,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl NewSession {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start)
    }
}

/// Sessions generated by `rule` for `group_id`, in date order.
///
/// With a `cutoff`, only sessions starting strictly after it are produced:
/// a later date, or the cutoff's date with a later start time. One session
/// per date at most, so the slot key is unique by construction.
pub fn materialize(rule: &ScheduleRule, group_id: i64, cutoff: Option<NaiveDateTime>) -> Vec<NewSession> {
    rule.occurrences()
        .map(|(date, window)| NewSession {
            group_id,
            date,
            start: window.start,
            end: window.end,
        })
        .filter(|session| cutoff.map_or(true, |c| session.starts_at() > c))
        .collect()
}
