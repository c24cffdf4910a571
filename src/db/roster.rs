use crate::libs::error::{Result, ScheduleError};
use crate::libs::roster::{Group, Membership, Student, StudentDirectory};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

const INSERT_GROUP: &str = "INSERT INTO groups (name) VALUES (?1)";
const DELETE_GROUP: &str = "DELETE FROM groups WHERE id = ?1";
const SELECT_GROUP: &str = "SELECT id, name FROM groups WHERE id = ?1";
const SELECT_GROUPS: &str = "SELECT id, name FROM groups ORDER BY name, id";
const INSERT_STUDENT: &str = "INSERT INTO students (name, join_date) VALUES (?1, ?2)";
const SELECT_STUDENT: &str = "SELECT id, name, join_date FROM students WHERE id = ?1";
const INSERT_MEMBER: &str = "INSERT OR IGNORE INTO student_group (student_id, group_id) VALUES (?1, ?2)";
const DELETE_MEMBER: &str = "DELETE FROM student_group WHERE student_id = ?1 AND group_id = ?2";
const SELECT_MEMBERS: &str = "
    SELECT s.id, s.name, s.join_date FROM students s
    JOIN student_group sg ON sg.student_id = s.id
    WHERE sg.group_id = ?1
    ORDER BY s.name, s.id
";
const SELECT_GROUPS_OF: &str = "
    SELECT g.id, g.name FROM groups g
    JOIN student_group sg ON sg.group_id = g.id
    WHERE sg.student_id = ?1
    ORDER BY g.name
";

/// Groups, students and membership as stored in the shared school database.
///
/// Only the bookkeeping the schedule core and its callers need; full
/// student/group management belongs to the wider application.
pub struct Roster<'a> {
    conn: &'a Connection,
}

impl<'a> Roster<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn create_group(&self, name: &str) -> Result<i64> {
        self.conn.execute(INSERT_GROUP, params![name.trim()])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Removes a group together with everything cascading from it.
    pub fn delete_group(&self, group_id: i64) -> Result<()> {
        if self.conn.execute(DELETE_GROUP, params![group_id])? == 0 {
            return Err(ScheduleError::not_found("Group", group_id));
        }
        Ok(())
    }

    pub fn group(&self, group_id: i64) -> Result<Group> {
        self.conn
            .query_row(SELECT_GROUP, params![group_id], Self::group_from_row)
            .optional()?
            .ok_or_else(|| ScheduleError::not_found("Group", group_id))
    }

    pub fn list_groups(&self) -> Result<Vec<Group>> {
        let mut stmt = self.conn.prepare(SELECT_GROUPS)?;
        let groups = stmt.query_map([], Self::group_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(groups)
    }

    pub fn group_exists(&self, group_id: i64) -> Result<bool> {
        Ok(self.conn.query_row(SELECT_GROUP, params![group_id], |_| Ok(())).optional()?.is_some())
    }

    pub fn create_student(&self, name: &str, join_date: NaiveDate) -> Result<i64> {
        self.conn.execute(INSERT_STUDENT, params![name.trim(), join_date])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn add_member(&self, student_id: i64, group_id: i64) -> Result<()> {
        self.conn.execute(INSERT_MEMBER, params![student_id, group_id])?;
        Ok(())
    }

    pub fn remove_member(&self, student_id: i64, group_id: i64) -> Result<()> {
        self.conn.execute(DELETE_MEMBER, params![student_id, group_id])?;
        Ok(())
    }

    fn group_from_row(row: &Row) -> rusqlite::Result<Group> {
        Ok(Group {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }

    fn student_from_row(row: &Row) -> rusqlite::Result<Student> {
        Ok(Student {
            id: row.get(0)?,
            name: row.get(1)?,
            join_date: row.get(2)?,
        })
    }
}

impl Membership for Roster<'_> {
    fn members(&self, group_id: i64) -> Result<Vec<Student>> {
        let mut stmt = self.conn.prepare(SELECT_MEMBERS)?;
        let students = stmt.query_map(params![group_id], Self::student_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(students)
    }

    fn groups_of(&self, student_id: i64) -> Result<Vec<Group>> {
        let mut stmt = self.conn.prepare(SELECT_GROUPS_OF)?;
        let groups = stmt.query_map(params![student_id], Self::group_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(groups)
    }
}

impl StudentDirectory for Roster<'_> {
    fn student(&self, student_id: i64) -> Result<Student> {
        self.conn
            .query_row(SELECT_STUDENT, params![student_id], Self::student_from_row)
            .optional()?
            .ok_or_else(|| ScheduleError::not_found("Student", student_id))
    }
}
