//! Database layer.
//!
//! Everything lives in one SQLite file with foreign keys enforced. Deleting
//! a group cascades to its schedule, overrides, sessions and attendance.
//!
//! ```rust,no_run
//! use lessonbook::db::{db::Db, sessions::Sessions};
//!
//! let db = Db::new()?;
//! let sessions = Sessions::new(&db.conn).list_for_group(1)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

/// Connection setup and migration on open.
pub mod db;

/// Versioned schema migrations.
pub mod migrations;

/// Presence marks per session.
pub mod attendance;

/// Groups, students and membership.
pub mod roster;

/// Base schedules and temporary overrides.
pub mod schedules;

/// Materialized sessions.
pub mod sessions;
