//! Core library modules for lessonbook.
//!
//! ## Features
//!
//! - **Schedule Core**: Rules, session materialization, the regeneration engine
//! - **Attendance**: Per-session rosters, monthly history and live check-in
//! - **Infrastructure**: Configuration, data storage, clock, messaging
//! - **User Interface**: Console tables
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lessonbook::db::db::Db;
//! use lessonbook::libs::clock::SystemClock;
//! use lessonbook::libs::engine::ScheduleEngine;
//! use lessonbook::libs::rule::{ParseMode, RawRule, ScheduleRule};
//!
//! let raw: RawRule = serde_json::from_str(r#"{
//!     "start_date": "2024-09-01", "end_date": "2024-09-30",
//!     "days": { "mon": { "start": "17:00", "end": "18:30" } }
//! }"#)?;
//! let rule = ScheduleRule::from_raw(&raw, ParseMode::Generate)?;
//!
//! let mut db = Db::new()?;
//! ScheduleEngine::new(&mut db.conn, SystemClock).save_base_schedule_future_only(1, Some(&rule))?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod attendance;
pub mod checkin;
pub mod clock;
pub mod config;
pub mod data_storage;
pub mod engine;
pub mod error;
pub mod materializer;
pub mod messages;
pub mod roster;
pub mod rule;
pub mod time;
pub mod view;
