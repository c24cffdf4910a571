//! Persistence of materialized lesson sessions.
//!
//! A session is keyed by `(group_id, date, start_time, end_time)`. Inserting
//! an existing slot is reported as [`ScheduleError::DuplicateSession`]
//! instead of being ignored. "After a cutoff" always means the session's
//! start, compared at minute resolution (`YYYY-MM-DD HH:MM`).

use crate::libs::error::{Result, ScheduleError};
use crate::libs::materializer::NewSession;
use crate::libs::time::{format_time, slot_key};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{ffi, params, params_from_iter, Connection, OptionalExtension, Row};

const INSERT_SESSION: &str = "
    INSERT INTO sessions (group_id, date, start_time, end_time, is_temporary, override_id)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
";
const SESSION_COLUMNS: &str = "id, group_id, date, start_time, end_time, is_temporary, override_id";
const DELETE_FOR_GROUP: &str = "DELETE FROM sessions WHERE group_id = ?1";
const DELETE_AFTER: &str = "DELETE FROM sessions WHERE group_id = ?1 AND (date || ' ' || start_time) > ?2";
const DELETE_IN_RANGE: &str = "DELETE FROM sessions WHERE group_id = ?1 AND date BETWEEN ?2 AND ?3";
const DELETE_IN_RANGE_AFTER: &str = "
    DELETE FROM sessions
    WHERE group_id = ?1 AND date BETWEEN ?2 AND ?3 AND (date || ' ' || start_time) > ?4
";

/// One concrete lesson of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: i64,
    pub group_id: i64,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// Produced by a temporary override rather than the base schedule
    pub is_temporary: bool,
    /// Override that produced it; cleared if that override is later removed
    pub override_id: Option<i64>,
}

impl Session {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.date.and_time(self.end)
    }

    /// `now` falls inside `[start, end)`.
    pub fn is_running_at(&self, now: NaiveDateTime) -> bool {
        self.starts_at() <= now && now < self.ends_at()
    }

    pub fn has_ended(&self, now: NaiveDateTime) -> bool {
        self.ends_at() < now
    }
}

/// Which rule a batch of sessions is generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
    Base,
    Override(i64),
}

impl SessionSource {
    fn columns(self) -> (bool, Option<i64>) {
        match self {
            SessionSource::Base => (false, None),
            SessionSource::Override(id) => (true, Some(id)),
        }
    }
}

pub struct Sessions<'a> {
    conn: &'a Connection,
}

impl<'a> Sessions<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, session: &NewSession, source: SessionSource) -> Result<i64> {
        let (is_temporary, override_id) = source.columns();
        let inserted = self.conn.execute(
            INSERT_SESSION,
            params![
                session.group_id,
                session.date,
                format_time(session.start),
                format_time(session.end),
                is_temporary,
                override_id
            ],
        );
        match inserted {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE => Err(ScheduleError::DuplicateSession {
                group_id: session.group_id,
                date: session.date,
                start: session.start,
                end: session.end,
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub fn insert_all(&self, sessions: &[NewSession], source: SessionSource) -> Result<usize> {
        for session in sessions {
            self.insert(session, source)?;
        }
        Ok(sessions.len())
    }

    pub fn get(&self, id: i64) -> Result<Session> {
        self.conn
            .query_row(&format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"), params![id], Self::from_row)
            .optional()?
            .ok_or_else(|| ScheduleError::not_found("Session", id))
    }

    /// Every session of the group in chronological order.
    pub fn list_for_group(&self, group_id: i64) -> Result<Vec<Session>> {
        self.query(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE group_id = ?1 ORDER BY date, start_time"),
            params![group_id],
        )
    }

    pub fn list_between(&self, group_id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<Session>> {
        self.query(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE group_id = ?1 AND date BETWEEN ?2 AND ?3 ORDER BY date, start_time"),
            params![group_id, from, to],
        )
    }

    /// Sessions of any of `group_ids` held on `date`, by start time.
    pub fn on_date(&self, group_ids: &[i64], date: NaiveDate) -> Result<Vec<Session>> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; group_ids.len()].join(",");
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE date = ? AND group_id IN ({placeholders}) ORDER BY start_time, group_id");
        let date = date.to_string();
        let values = std::iter::once(rusqlite::types::Value::Text(date)).chain(group_ids.iter().map(|id| rusqlite::types::Value::Integer(*id)));
        self.query(&sql, params_from_iter(values))
    }

    /// The session of the group in progress at `now`, if any.
    pub fn running_at(&self, group_id: i64, now: NaiveDateTime) -> Result<Option<Session>> {
        Ok(self.on_date(&[group_id], now.date())?.into_iter().find(|s| s.is_running_at(now)))
    }

    /// Sessions dated on or after `from` that ended strictly before `now`.
    pub fn ended_since(&self, group_id: i64, from: NaiveDate, now: NaiveDateTime) -> Result<Vec<Session>> {
        let sessions = self.query(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE group_id = ?1 AND date >= ?2 AND date <= ?3 ORDER BY date, start_time"),
            params![group_id, from, now.date()],
        )?;
        Ok(sessions.into_iter().filter(|s| s.has_ended(now)).collect())
    }

    pub fn delete_all_for_group(&self, group_id: i64) -> Result<usize> {
        Ok(self.conn.execute(DELETE_FOR_GROUP, params![group_id])?)
    }

    /// Deletes the group's sessions starting strictly after `cutoff`.
    pub fn delete_after(&self, group_id: i64, cutoff: NaiveDateTime) -> Result<usize> {
        Ok(self.conn.execute(DELETE_AFTER, params![group_id, slot_key(cutoff)])?)
    }

    pub fn delete_in_range(&self, group_id: i64, start: NaiveDate, end: NaiveDate) -> Result<usize> {
        Ok(self.conn.execute(DELETE_IN_RANGE, params![group_id, start, end])?)
    }

    /// Like [`Sessions::delete_after`], restricted to dates in `[start, end]`.
    pub fn delete_in_range_after(&self, group_id: i64, start: NaiveDate, end: NaiveDate, cutoff: NaiveDateTime) -> Result<usize> {
        Ok(self.conn.execute(DELETE_IN_RANGE_AFTER, params![group_id, start, end, slot_key(cutoff)])?)
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Session>> {
        let mut stmt = self.conn.prepare(sql)?;
        let sessions = stmt.query_map(params, Self::from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Session> {
        Ok(Session {
            id: row.get(0)?,
            group_id: row.get(1)?,
            date: row.get(2)?,
            start: row.get(3)?,
            end: row.get(4)?,
            is_temporary: row.get(5)?,
            override_id: row.get(6)?,
        })
    }
}
