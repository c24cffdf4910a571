//! Read views over sessions and presence marks.
//!
//! Two questions are answered here: who was present or absent at one
//! session, and how a student's attendance looks month by month.
//!
//! A session nobody has a mark for is one where attendance was never taken.
//! It is left out of a student's history rather than counted as an absence,
//! which gives each ended session one of three states:
//!
//! | marks for session | student's own mark | reported as     |
//! |-------------------|--------------------|-----------------|
//! | none              | -                  | excluded        |
//! | some              | yes                | present         |
//! | some              | no                 | absent          |
//!
//! Sessions that have not ended yet are never reported.
//!
//! Rosters are built against *current* membership: a student who left the
//! group is missing from old rosters, and one who joined later shows up as
//! absent at sessions held before they joined.

use super::clock::Clock;
use super::error::{Result, ScheduleError};
use super::roster::{Membership, Student, StudentDirectory};
use crate::db::attendance::Attendance;
use crate::db::sessions::Sessions;
use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRoster {
    pub present: Vec<Student>,
    pub absent: Vec<Student>,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub session_id: i64,
    pub date: NaiveDate,
    pub present: bool,
}

/// History entries bucketed by `(year, month)`, both in date order.
pub type MonthHistory = BTreeMap<(i32, u32), Vec<HistoryEntry>>;

pub struct AttendanceService<'a, C, M, S>
where
    C: Clock,
    M: Membership,
    S: StudentDirectory,
{
    conn: &'a Connection,
    clock: C,
    members: &'a M,
    students: &'a S,
}

impl<'a, C, M, S> AttendanceService<'a, C, M, S>
where
    C: Clock,
    M: Membership,
    S: StudentDirectory,
{
    pub fn new(conn: &'a Connection, clock: C, members: &'a M, students: &'a S) -> Self {
        Self {
            conn,
            clock,
            members,
            students,
        }
    }

    /// Current members of the group split by whether they are marked
    /// present at the session.
    pub fn session_roster(&self, session_id: i64, group_id: i64) -> Result<SessionRoster> {
        let session = Sessions::new(self.conn).get(session_id)?;
        if session.group_id != group_id {
            return Err(ScheduleError::not_found("Session", session_id));
        }

        let marked = Attendance::new(self.conn).present_students(session_id)?;
        let members = self.members.members(group_id)?;
        let total = members.len();
        let (present, absent): (Vec<Student>, Vec<Student>) = members.into_iter().partition(|s| marked.contains(&s.id));

        Ok(SessionRoster { present, absent, total })
    }

    /// The student's presence at every ended, taken session of the group
    /// since the student joined.
    pub fn student_month_history(&self, group_id: i64, student_id: i64) -> Result<MonthHistory> {
        let student = self.students.student(student_id)?;
        let now = self.clock.now();
        let attendance = Attendance::new(self.conn);

        let mut history = MonthHistory::new();
        for session in Sessions::new(self.conn).ended_since(group_id, student.join_date, now)? {
            if !attendance.is_taken(session.id)? {
                continue;
            }
            history.entry((session.date.year(), session.date.month())).or_default().push(HistoryEntry {
                session_id: session.id,
                date: session.date,
                present: attendance.is_present(session.id, student_id)?,
            });
        }
        Ok(history)
    }
}
