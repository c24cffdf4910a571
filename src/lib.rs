//! # Lessonbook
//!
//! Lesson schedules and attendance for a small school's groups.
//!
//! ## Features
//!
//! - **Recurring Schedules**: Weekday time windows over a date range, with excluded dates
//! - **Session Generation**: Concrete lessons materialized from a group's schedule
//! - **Safe Edits**: Past, running and imminent sessions survive schedule changes
//! - **Temporary Overrides**: Date ranges with their own timetable that win over the base schedule
//! - **Attendance**: Check-in, per-session rosters and monthly history
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lessonbook::commands::Cli;
//!
//! fn main() -> anyhow::Result<()> {
//!     Cli::menu()
//! }
//! ```

pub mod commands;
pub mod db;
pub mod libs;
