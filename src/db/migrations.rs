//! Versioned schema migrations.
//!
//! Every database file carries a `migrations` table recording which schema
//! versions have been applied. Opening a database applies whatever is
//! pending inside a single transaction, so a half-migrated file is never
//! left behind.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lessonbook::db::migrations::{get_db_version, init_with_migrations};
//! use rusqlite::Connection;
//!
//! let mut conn = Connection::open("lessonbook.db")?;
//! init_with_migrations(&mut conn)?;
//! let version = get_db_version(&conn)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::libs::messages::Message;
use crate::{msg_debug, msg_error};
use anyhow::Result;
use rusqlite::{params, Connection, Transaction};

/// Tracking table for applied migrations.
const MIGRATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

#[derive(Debug, Clone)]
struct Migration {
    /// Unique version number for ordering and tracking
    version: u32,
    /// Human-readable name describing the migration's purpose
    name: &'static str,
    /// Applies the schema change within the surrounding transaction
    up: fn(&Transaction) -> Result<()>,
}

/// Registry of all migrations in version order.
pub struct MigrationManager {
    migrations: Vec<Migration>,
}

impl MigrationManager {
    pub fn new() -> Self {
        let mut manager = Self { migrations: Vec::new() };
        manager.register_migrations();
        manager
    }

    fn register_migrations(&mut self) {
        // Version 1: groups, students and membership.
        // Owned by the wider school application; the schedule tables reference them.
        self.add_migration(1, "create_roster_tables", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS groups (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE
                )",
                [],
            )?;
            tx.execute(
                "CREATE TABLE IF NOT EXISTS students (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    join_date TEXT NOT NULL DEFAULT (date('now'))
                )",
                [],
            )?;
            tx.execute(
                "CREATE TABLE IF NOT EXISTS student_group (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    student_id INTEGER NOT NULL,
                    group_id INTEGER NOT NULL,
                    UNIQUE(student_id, group_id),
                    FOREIGN KEY(student_id) REFERENCES students(id) ON DELETE CASCADE,
                    FOREIGN KEY(group_id) REFERENCES groups(id) ON DELETE CASCADE
                )",
                [],
            )?;
            Ok(())
        });

        // Version 2: base schedules and temporary overrides, each with
        // weekday windows (0=Mon .. 6=Sun) and excluded dates.
        self.add_migration(2, "create_schedule_tables", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS group_schedules (
                    group_id INTEGER PRIMARY KEY,
                    start_date TEXT NOT NULL,
                    end_date TEXT NOT NULL,
                    FOREIGN KEY(group_id) REFERENCES groups(id) ON DELETE CASCADE
                )",
                [],
            )?;
            tx.execute(
                "CREATE TABLE IF NOT EXISTS group_schedule_days (
                    group_id INTEGER NOT NULL,
                    weekday INTEGER NOT NULL CHECK(weekday BETWEEN 0 AND 6),
                    start_time TEXT NOT NULL,
                    end_time TEXT NOT NULL,
                    UNIQUE(group_id, weekday),
                    FOREIGN KEY(group_id) REFERENCES groups(id) ON DELETE CASCADE
                )",
                [],
            )?;
            tx.execute(
                "CREATE TABLE IF NOT EXISTS group_schedule_exclusions (
                    group_id INTEGER NOT NULL,
                    date TEXT NOT NULL,
                    UNIQUE(group_id, date),
                    FOREIGN KEY(group_id) REFERENCES groups(id) ON DELETE CASCADE
                )",
                [],
            )?;
            tx.execute(
                "CREATE TABLE IF NOT EXISTS schedule_overrides (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    group_id INTEGER NOT NULL,
                    start_date TEXT NOT NULL,
                    end_date TEXT NOT NULL,
                    FOREIGN KEY(group_id) REFERENCES groups(id) ON DELETE CASCADE
                )",
                [],
            )?;
            tx.execute(
                "CREATE TABLE IF NOT EXISTS override_days (
                    override_id INTEGER NOT NULL,
                    weekday INTEGER NOT NULL CHECK(weekday BETWEEN 0 AND 6),
                    start_time TEXT NOT NULL,
                    end_time TEXT NOT NULL,
                    UNIQUE(override_id, weekday),
                    FOREIGN KEY(override_id) REFERENCES schedule_overrides(id) ON DELETE CASCADE
                )",
                [],
            )?;
            tx.execute(
                "CREATE TABLE IF NOT EXISTS override_exclusions (
                    override_id INTEGER NOT NULL,
                    date TEXT NOT NULL,
                    UNIQUE(override_id, date),
                    FOREIGN KEY(override_id) REFERENCES schedule_overrides(id) ON DELETE CASCADE
                )",
                [],
            )?;
            tx.execute(
                "CREATE INDEX IF NOT EXISTS idx_overrides_group_start ON schedule_overrides(group_id, start_date)",
                [],
            )?;
            Ok(())
        });

        // Version 3: materialized sessions and presence marks.
        // Removing an override keeps the sessions it already produced.
        self.add_migration(3, "create_sessions_and_attendance", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    group_id INTEGER NOT NULL,
                    date TEXT NOT NULL,
                    start_time TEXT NOT NULL,
                    end_time TEXT NOT NULL,
                    is_temporary INTEGER NOT NULL DEFAULT 0,
                    override_id INTEGER,
                    UNIQUE(group_id, date, start_time, end_time),
                    FOREIGN KEY(group_id) REFERENCES groups(id) ON DELETE CASCADE,
                    FOREIGN KEY(override_id) REFERENCES schedule_overrides(id) ON DELETE SET NULL
                )",
                [],
            )?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_sessions_group_date ON sessions(group_id, date)", [])?;
            tx.execute(
                "CREATE TABLE IF NOT EXISTS attendance (
                    session_id INTEGER NOT NULL,
                    student_id INTEGER NOT NULL,
                    UNIQUE(session_id, student_id),
                    FOREIGN KEY(session_id) REFERENCES sessions(id) ON DELETE CASCADE,
                    FOREIGN KEY(student_id) REFERENCES students(id) ON DELETE CASCADE
                )",
                [],
            )?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_attendance_student ON attendance(student_id)", [])?;
            Ok(())
        });
    }

    fn add_migration(&mut self, version: u32, name: &'static str, up: fn(&Transaction) -> Result<()>) {
        self.migrations.push(Migration { version, name, up });
    }

    /// Applies every pending migration in one transaction.
    pub fn run_migrations(&self, conn: &mut Connection) -> Result<()> {
        conn.execute(MIGRATIONS_TABLE, [])?;

        let current_version = self.get_current_version(conn)?;
        let pending: Vec<&Migration> = self.migrations.iter().filter(|m| m.version > current_version).collect();

        if pending.is_empty() {
            msg_debug!(Message::DatabaseUpToDate);
            return Ok(());
        }

        msg_debug!(Message::MigrationsFound(pending.len()));

        let tx = conn.transaction()?;

        for migration in pending {
            msg_debug!(Message::RunningMigration(migration.version, migration.name.to_string()));

            match (migration.up)(&tx) {
                Ok(()) => {
                    tx.execute(
                        "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
                        params![migration.version, migration.name],
                    )?;
                }
                Err(e) => {
                    msg_error!(Message::MigrationFailed(migration.version, e.to_string()));
                    return Err(e);
                }
            }
        }

        tx.commit()?;
        msg_debug!(Message::AllMigrationsCompleted);

        Ok(())
    }

    fn get_current_version(&self, conn: &Connection) -> Result<u32> {
        if !has_migrations_table(conn)? {
            return Ok(0);
        }
        let version: Option<u32> = conn.query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0))?;
        Ok(version.unwrap_or(0))
    }

    pub fn is_migration_applied(&self, conn: &Connection, version: u32) -> Result<bool> {
        let count: i32 = conn.query_row("SELECT COUNT(*) FROM migrations WHERE version = ?1", params![version], |row| row.get(0))?;

        Ok(count > 0)
    }

    /// `(version, name, applied_at)` of every applied migration, by version.
    pub fn get_migration_history(&self, conn: &Connection) -> Result<Vec<(u32, String, String)>> {
        if !has_migrations_table(conn)? {
            return Ok(Vec::new());
        }
        let mut stmt = conn.prepare("SELECT version, name, applied_at FROM migrations ORDER BY version")?;

        let history = stmt
            .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(history)
    }

    /// `(version, name)` of every migration the database has not applied yet.
    pub fn pending_migrations(&self, conn: &Connection) -> Result<Vec<(u32, &'static str)>> {
        let current = self.get_current_version(conn)?;
        Ok(self.migrations.iter().filter(|m| m.version > current).map(|m| (m.version, m.name)).collect())
    }

    pub fn latest_version(&self) -> u32 {
        self.migrations.last().map(|m| m.version).unwrap_or(0)
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

/// A database that was never opened through [`init_with_migrations`] has no tracking table.
fn has_migrations_table(conn: &Connection) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'migrations')",
        [],
        |row| row.get(0),
    )?)
}

pub fn init_with_migrations(conn: &mut Connection) -> Result<()> {
    MigrationManager::new().run_migrations(conn)
}

pub fn get_db_version(conn: &Connection) -> Result<u32> {
    MigrationManager::new().get_current_version(conn)
}

pub fn needs_migration(conn: &Connection) -> Result<bool> {
    Ok(!MigrationManager::new().pending_migrations(conn)?.is_empty())
}
