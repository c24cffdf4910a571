//! Group and student lookups the attendance side depends on.
//!
//! Students, groups and membership are owned by the rest of the school
//! application; the core only reads them through these traits.
//! [`crate::db::roster::Roster`] is the SQLite implementation.

use super::error::Result;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub join_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub name: String,
}

/// Current group membership.
pub trait Membership {
    /// Members of `group_id` right now, ordered by name.
    fn members(&self, group_id: i64) -> Result<Vec<Student>>;

    /// Groups `student_id` currently belongs to, ordered by name.
    fn groups_of(&self, student_id: i64) -> Result<Vec<Group>>;
}

pub trait StudentDirectory {
    /// Fails with `NotFound` for an unknown id.
    fn student(&self, student_id: i64) -> Result<Student>;
}
