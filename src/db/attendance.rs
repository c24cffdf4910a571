//! Presence marks.
//!
//! A row `(session_id, student_id)` means the student was present; absence
//! is the lack of a row. Rows are only ever inserted, and disappear with
//! their session or student through the foreign-key cascade.

use crate::libs::error::Result;
use rusqlite::{params, Connection};
use std::collections::HashSet;

const INSERT_MARK: &str = "INSERT OR IGNORE INTO attendance (session_id, student_id) VALUES (?1, ?2)";
const SELECT_MARK: &str = "SELECT EXISTS(SELECT 1 FROM attendance WHERE session_id = ?1 AND student_id = ?2)";
const SELECT_TAKEN: &str = "SELECT EXISTS(SELECT 1 FROM attendance WHERE session_id = ?1)";
const SELECT_PRESENT: &str = "SELECT student_id FROM attendance WHERE session_id = ?1";
const COUNT_FOR_SESSION: &str = "SELECT COUNT(*) FROM attendance WHERE session_id = ?1";

pub struct Attendance<'a> {
    conn: &'a Connection,
}

impl<'a> Attendance<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Records presence. Returns false when the student was already marked.
    pub fn mark_present(&self, session_id: i64, student_id: i64) -> Result<bool> {
        Ok(self.conn.execute(INSERT_MARK, params![session_id, student_id])? == 1)
    }

    /// Marks the student at several sessions at once; returns how many marks are new.
    pub fn mark_present_many(&self, session_ids: &[i64], student_id: i64) -> Result<usize> {
        let mut stmt = self.conn.prepare(INSERT_MARK)?;
        let mut inserted = 0;
        for session_id in session_ids {
            inserted += stmt.execute(params![session_id, student_id])?;
        }
        Ok(inserted)
    }

    pub fn is_present(&self, session_id: i64, student_id: i64) -> Result<bool> {
        Ok(self.conn.query_row(SELECT_MARK, params![session_id, student_id], |row| row.get(0))?)
    }

    /// Whether attendance was taken at all, i.e. anyone has a mark.
    pub fn is_taken(&self, session_id: i64) -> Result<bool> {
        Ok(self.conn.query_row(SELECT_TAKEN, params![session_id], |row| row.get(0))?)
    }

    pub fn present_students(&self, session_id: i64) -> Result<HashSet<i64>> {
        let mut stmt = self.conn.prepare(SELECT_PRESENT)?;
        let ids = stmt.query_map(params![session_id], |row| row.get(0))?.collect::<rusqlite::Result<HashSet<i64>>>()?;
        Ok(ids)
    }

    pub fn count_for_session(&self, session_id: i64) -> Result<usize> {
        let count: i64 = self.conn.query_row(COUNT_FOR_SESSION, params![session_id], |row| row.get(0))?;
        Ok(count as usize)
    }
}
