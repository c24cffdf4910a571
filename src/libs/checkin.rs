//! Live check-in: "is there a lesson for this student right now".
//!
//! A scanned or typed student id is matched against today's sessions of
//! every group the student belongs to. A session accepts check-ins from
//! `window` minutes before its start until its end, and the student is
//! marked present at every session in that window.

use super::clock::Clock;
use super::config::CheckInConfig;
use super::error::Result;
use super::roster::{Group, Membership, Student, StudentDirectory};
use crate::db::attendance::Attendance;
use crate::db::sessions::{Session, Sessions};
use crate::msg_debug;
use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// The student is not in any group.
    NoGroup,
    /// None of the student's groups has a session in its window now.
    NoSessionNow,
    /// Already marked present at every session in window.
    AlreadyPresent(Vec<Session>),
    Marked { sessions: Vec<Session>, new_marks: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInResult {
    pub student: Student,
    pub groups: Vec<Group>,
    pub outcome: CheckInOutcome,
}

pub struct CheckIn<'a, C, M, S>
where
    C: Clock,
    M: Membership,
    S: StudentDirectory,
{
    conn: &'a Connection,
    clock: C,
    members: &'a M,
    students: &'a S,
    window: Duration,
}

impl<'a, C, M, S> CheckIn<'a, C, M, S>
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
            window: Duration::minutes(CheckInConfig::default().window_minutes),
        }
    }

    pub fn with_config(mut self, config: &CheckInConfig) -> Self {
        self.window = Duration::minutes(config.window_minutes);
        self
    }

    /// Today's sessions of `group_ids` whose `[start - window, end]` contains `now`.
    pub fn current_sessions(&self, group_ids: &[i64], now: NaiveDateTime) -> Result<Vec<Session>> {
        let sessions = Sessions::new(self.conn).on_date(group_ids, now.date())?;
        Ok(sessions
            .into_iter()
            .filter(|s| s.starts_at() - self.window <= now && now <= s.ends_at())
            .collect())
    }

    pub fn check_in(&self, student_id: i64) -> Result<CheckInResult> {
        let student = self.students.student(student_id)?;
        let groups = self.members.groups_of(student_id)?;
        let now = self.clock.now();

        let outcome = if groups.is_empty() {
            CheckInOutcome::NoGroup
        } else {
            let group_ids: Vec<i64> = groups.iter().map(|g| g.id).collect();
            let candidates = self.current_sessions(&group_ids, now)?;
            self.mark(student_id, candidates)?
        };

        msg_debug!(format!("Check-in of student {} at {}: {:?}", student_id, now, outcome));
        Ok(CheckInResult { student, groups, outcome })
    }

    fn mark(&self, student_id: i64, candidates: Vec<Session>) -> Result<CheckInOutcome> {
        if candidates.is_empty() {
            return Ok(CheckInOutcome::NoSessionNow);
        }

        let tx = self.conn.unchecked_transaction()?;
        let attendance = Attendance::new(&tx);
        let mut already_all = true;
        for session in &candidates {
            if !attendance.is_present(session.id, student_id)? {
                already_all = false;
                break;
            }
        }
        if already_all {
            return Ok(CheckInOutcome::AlreadyPresent(candidates));
        }

        let ids: Vec<i64> = candidates.iter().map(|s| s.id).collect();
        let new_marks = attendance.mark_present_many(&ids, student_id)?;
        tx.commit()?;

        Ok(CheckInOutcome::Marked {
            sessions: candidates,
            new_marks,
        })
    }
}
