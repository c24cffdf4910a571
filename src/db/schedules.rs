//! Persistence of base schedules and temporary overrides.
//!
//! A group has at most one base schedule (`group_schedules`, keyed by group)
//! and any number of overrides (`schedule_overrides`). Both keep their
//! weekday windows and excluded dates in side tables which are always
//! replaced wholesale when the rule changes.

use crate::libs::error::{Result, ScheduleError};
use crate::libs::rule::{DayWindow, ScheduleRule};
use crate::libs::time::{format_time, weekday_from_index, weekday_index};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension};

const UPSERT_BASE: &str = "
    INSERT INTO group_schedules (group_id, start_date, end_date) VALUES (?1, ?2, ?3)
    ON CONFLICT(group_id) DO UPDATE SET start_date = excluded.start_date, end_date = excluded.end_date
";
const SELECT_BASE: &str = "SELECT start_date, end_date FROM group_schedules WHERE group_id = ?1";
const DELETE_BASE: &str = "DELETE FROM group_schedules WHERE group_id = ?1";
const INSERT_OVERRIDE: &str = "INSERT INTO schedule_overrides (group_id, start_date, end_date) VALUES (?1, ?2, ?3)";
const UPDATE_OVERRIDE: &str = "UPDATE schedule_overrides SET start_date = ?2, end_date = ?3 WHERE id = ?1";
const DELETE_OVERRIDE: &str = "DELETE FROM schedule_overrides WHERE id = ?1";
const DELETE_GROUP_OVERRIDES: &str = "DELETE FROM schedule_overrides WHERE group_id = ?1";
const SELECT_OVERRIDE: &str = "SELECT id, group_id, start_date, end_date FROM schedule_overrides WHERE id = ?1";
const SELECT_GROUP_OVERRIDES: &str = "
    SELECT id, group_id, start_date, end_date FROM schedule_overrides
    WHERE group_id = ?1
    ORDER BY start_date, id
";
const SELECT_OVERLAPPING: &str = "
    SELECT id, group_id, start_date, end_date FROM schedule_overrides
    WHERE group_id = ?1 AND start_date <= ?3 AND end_date >= ?2
    ORDER BY start_date, id
";

/// A stored temporary override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleOverride {
    pub id: i64,
    pub group_id: i64,
    pub rule: ScheduleRule,
}

/// Which rule the weekday and exclusion rows belong to.
#[derive(Debug, Clone, Copy)]
enum Owner {
    Group(i64),
    Override(i64),
}

impl Owner {
    fn id(self) -> i64 {
        match self {
            Owner::Group(id) | Owner::Override(id) => id,
        }
    }

    fn days_table(self) -> (&'static str, &'static str) {
        match self {
            Owner::Group(_) => ("group_schedule_days", "group_id"),
            Owner::Override(_) => ("override_days", "override_id"),
        }
    }

    fn exclusions_table(self) -> (&'static str, &'static str) {
        match self {
            Owner::Group(_) => ("group_schedule_exclusions", "group_id"),
            Owner::Override(_) => ("override_exclusions", "override_id"),
        }
    }
}

pub struct Schedules<'a> {
    conn: &'a Connection,
}

impl<'a> Schedules<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Inserts or replaces the group's base schedule, its weekday windows and exclusions.
    pub fn save_base(&self, group_id: i64, rule: &ScheduleRule) -> Result<()> {
        self.conn.execute(UPSERT_BASE, params![group_id, rule.start_date(), rule.end_date()])?;
        self.replace_rows(Owner::Group(group_id), rule)
    }

    pub fn load_base(&self, group_id: i64) -> Result<Option<ScheduleRule>> {
        let range = self
            .conn
            .query_row(SELECT_BASE, params![group_id], |row| Ok((row.get::<_, NaiveDate>(0)?, row.get::<_, NaiveDate>(1)?)))
            .optional()?;
        match range {
            Some((start, end)) => Ok(Some(self.load_rule(Owner::Group(group_id), start, end)?)),
            None => Ok(None),
        }
    }

    /// Drops the base schedule row together with its weekday and exclusion rows.
    pub fn delete_base(&self, group_id: i64) -> Result<()> {
        self.clear_rows(Owner::Group(group_id))?;
        self.conn.execute(DELETE_BASE, params![group_id])?;
        Ok(())
    }

    pub fn insert_override(&self, group_id: i64, rule: &ScheduleRule) -> Result<i64> {
        self.conn.execute(INSERT_OVERRIDE, params![group_id, rule.start_date(), rule.end_date()])?;
        let id = self.conn.last_insert_rowid();
        self.replace_rows(Owner::Override(id), rule)?;
        Ok(id)
    }

    /// Rewrites an override's range, weekday windows and exclusions in place.
    pub fn update_override(&self, id: i64, rule: &ScheduleRule) -> Result<()> {
        if self.conn.execute(UPDATE_OVERRIDE, params![id, rule.start_date(), rule.end_date()])? == 0 {
            return Err(ScheduleError::not_found("Override", id));
        }
        self.replace_rows(Owner::Override(id), rule)
    }

    /// Weekday and exclusion rows go with the override through the cascade.
    pub fn delete_override(&self, id: i64) -> Result<()> {
        if self.conn.execute(DELETE_OVERRIDE, params![id])? == 0 {
            return Err(ScheduleError::not_found("Override", id));
        }
        Ok(())
    }

    pub fn delete_group_overrides(&self, group_id: i64) -> Result<usize> {
        Ok(self.conn.execute(DELETE_GROUP_OVERRIDES, params![group_id])?)
    }

    pub fn get_override(&self, id: i64) -> Result<ScheduleOverride> {
        let header = self.conn.query_row(SELECT_OVERRIDE, params![id], Self::override_header).optional()?;
        let (id, group_id, start, end) = header.ok_or_else(|| ScheduleError::not_found("Override", id))?;
        self.build_override(id, group_id, start, end)
    }

    /// All overrides of a group in start-date order.
    pub fn list_overrides(&self, group_id: i64) -> Result<Vec<ScheduleOverride>> {
        self.query_overrides(SELECT_GROUP_OVERRIDES, params![group_id])
    }

    /// Overrides of a group whose range intersects `[start, end]`.
    pub fn overlapping_overrides(&self, group_id: i64, start: NaiveDate, end: NaiveDate) -> Result<Vec<ScheduleOverride>> {
        self.query_overrides(SELECT_OVERLAPPING, params![group_id, start, end])
    }

    fn query_overrides(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<ScheduleOverride>> {
        let mut stmt = self.conn.prepare(sql)?;
        let headers = stmt.query_map(params, Self::override_header)?.collect::<rusqlite::Result<Vec<_>>>()?;
        headers
            .into_iter()
            .map(|(id, group_id, start, end)| self.build_override(id, group_id, start, end))
            .collect()
    }

    fn override_header(row: &rusqlite::Row) -> rusqlite::Result<(i64, i64, NaiveDate, NaiveDate)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }

    fn build_override(&self, id: i64, group_id: i64, start: NaiveDate, end: NaiveDate) -> Result<ScheduleOverride> {
        Ok(ScheduleOverride {
            id,
            group_id,
            rule: self.load_rule(Owner::Override(id), start, end)?,
        })
    }

    fn load_rule(&self, owner: Owner, start: NaiveDate, end: NaiveDate) -> Result<ScheduleRule> {
        let mut rule = ScheduleRule::new(start, end)?;

        let (table, column) = owner.days_table();
        let mut stmt = self.conn.prepare(&format!("SELECT weekday, start_time, end_time FROM {table} WHERE {column} = ?1 ORDER BY weekday"))?;
        let days = stmt
            .query_map(params![owner.id()], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, NaiveTime>(1)?, row.get::<_, NaiveTime>(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for (weekday, start_time, end_time) in days {
            rule.set_day(weekday_from_index(weekday)?, DayWindow::new(start_time, end_time)?);
        }

        let (table, column) = owner.exclusions_table();
        let mut stmt = self.conn.prepare(&format!("SELECT date FROM {table} WHERE {column} = ?1 ORDER BY date"))?;
        let dates = stmt.query_map(params![owner.id()], |row| row.get::<_, NaiveDate>(0))?.collect::<rusqlite::Result<Vec<_>>>()?;
        for date in dates {
            rule = rule.exclude(date);
        }

        Ok(rule)
    }

    fn replace_rows(&self, owner: Owner, rule: &ScheduleRule) -> Result<()> {
        self.clear_rows(owner)?;

        let (table, column) = owner.days_table();
        let mut stmt = self.conn.prepare(&format!("INSERT INTO {table} ({column}, weekday, start_time, end_time) VALUES (?1, ?2, ?3, ?4)"))?;
        for (day, window) in rule.days() {
            stmt.execute(params![owner.id(), weekday_index(day), format_time(window.start), format_time(window.end)])?;
        }

        let (table, column) = owner.exclusions_table();
        let mut stmt = self.conn.prepare(&format!("INSERT INTO {table} ({column}, date) VALUES (?1, ?2)"))?;
        for date in rule.exclusions() {
            stmt.execute(params![owner.id(), date])?;
        }
        Ok(())
    }

    fn clear_rows(&self, owner: Owner) -> Result<()> {
        let (table, column) = owner.days_table();
        self.conn.execute(&format!("DELETE FROM {table} WHERE {column} = ?1"), params![owner.id()])?;
        let (table, column) = owner.exclusions_table();
        self.conn.execute(&format!("DELETE FROM {table} WHERE {column} = ?1"), params![owner.id()])?;
        Ok(())
    }
}
