//! Command-line interface.
//!
//! Each subcommand lives in its own module exposing an `Args` struct and a
//! `cmd` function. Library errors surface through `anyhow` with their own
//! messages, e.g. a refused edit while a lesson is running:
//!
//! ```text
//! $ lessonbook schedule set 3 autumn.json
//! Error: Group 3 has a session in progress (2024-09-02 17:00:00-18:30:00); schedule changes are locked
//! ```

pub mod attendance;
pub mod checkin;
pub mod group;
pub mod init;
pub mod migrations;
pub mod overrides;
pub mod schedule;
pub mod sessions;
pub mod student;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init,
    #[command(about = "Manage groups")]
    Group(group::GroupArgs),
    #[command(about = "Manage students and group membership")]
    Student(student::StudentArgs),
    #[command(about = "Manage a group's base schedule", arg_required_else_help = true)]
    Schedule(schedule::ScheduleArgs),
    #[command(about = "Manage temporary schedule overrides", arg_required_else_help = true)]
    Override(overrides::OverrideArgs),
    #[command(about = "List a group's sessions")]
    Sessions(sessions::SessionsArgs),
    #[command(about = "Session rosters, monthly history and manual marks", arg_required_else_help = true)]
    Attendance(attendance::AttendanceArgs),
    #[command(about = "Check students in to their current session")]
    Checkin(checkin::CheckInArgs),
    #[command(about = "Database schema status", arg_required_else_help = true)]
    Migrations(migrations::MigrationsArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init => init::cmd(),
            Commands::Group(args) => group::cmd(args),
            Commands::Student(args) => student::cmd(args),
            Commands::Schedule(args) => schedule::cmd(args),
            Commands::Override(args) => overrides::cmd(args),
            Commands::Sessions(args) => sessions::cmd(args),
            Commands::Attendance(args) => attendance::cmd(args),
            Commands::Checkin(args) => checkin::cmd(args),
            Commands::Migrations(args) => migrations::cmd(args),
        }
    }
}
