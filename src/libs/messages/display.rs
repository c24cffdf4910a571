//! Text of every [`Message`].
//!
//! All user-facing wording lives in this one match so that commands only
//! choose *which* message to show.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

fn join_ids(ids: &[i64]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigModuleSchedule => "Schedule settings".to_string(),
            Message::ConfigModuleCheckIn => "Check-in settings".to_string(),
            Message::ConfigModuleDatabase => "Database settings".to_string(),
            Message::PromptSelectModules => "Select the sections to configure (space to select, enter to confirm)".to_string(),
            Message::PromptProtectionMinutes => "Minutes before a session during which edits leave it untouched".to_string(),
            Message::PromptCheckInWindow => "Minutes before a session start that check-in opens".to_string(),
            Message::PromptDatabaseFile => "Database file name".to_string(),

            // === DATABASE MESSAGES ===
            Message::SchemaVersion { current, latest } => format!("Schema version {} of {}", current, latest),
            Message::PendingMigration(version, name) => format!("Pending v{}: {}", version, name),
            Message::DatabaseUpToDate => "Database is up to date".to_string(),
            Message::MigrationsFound(count) => format!("Found {} pending migration(s)", count),
            Message::RunningMigration(version, name) => format!("Running migration v{}: {}", version, name),
            Message::MigrationFailed(version, error) => format!("Migration v{} failed: {}", version, error),
            Message::AllMigrationsCompleted => "All migrations completed".to_string(),
            Message::MigrationHistory => "Migration history:".to_string(),
            Message::NoMigrationsApplied => "No migrations applied yet; they run the next time the database is opened.".to_string(),

            // === GROUP MESSAGES ===
            Message::GroupCreated(id, name) => format!("Group '{}' created with ID {}", name, id),
            Message::GroupDeleted(id) => format!("Group {} deleted together with its sessions and attendance", id),
            Message::GroupCreationRolledBack(name) => format!("Schedule of group '{}' could not be generated, group was not created", name),
            Message::GroupsHeader => "Groups".to_string(),
            Message::NoGroups => "No groups yet.".to_string(),

            // === STUDENT MESSAGES ===
            Message::StudentCreated(id, name) => format!("Student '{}' created with ID {}", name, id),
            Message::StudentJoinedGroup(student, group) => format!("Student {} joined group {}", student, group),
            Message::StudentLeftGroup(student, group) => format!("Student {} left group {}", student, group),
            Message::StudentNotInGroup(student, group) => format!("Student {} is not a member of group {}, skipped", student, group),
            Message::MembersHeader(name) => format!("Members of '{}'", name),
            Message::NoMembers(group) => format!("Group {} has no members.", group),

            // === SCHEDULE MESSAGES ===
            Message::BaseScheduleSaved(group) => format!("Base schedule of group {} saved", group),
            Message::BaseScheduleCleared(group) => format!("Base schedule of group {} removed", group),
            Message::NoBaseSchedule(group) => format!("Group {} has no base schedule.", group),
            Message::SessionsRegenerated { deleted, inserted } => format!("Sessions regenerated: {} removed, {} created", deleted, inserted),
            Message::SchedulePreview(count) => format!("This schedule produces {} session(s)", count),
            Message::ConfirmClearAll(group) => format!("Remove the schedule, overrides and ALL sessions of group {}, past ones included?", group),
            Message::ConfirmClearAllFinal => "Attendance of those sessions is lost as well. Are you REALLY sure?".to_string(),
            Message::OperationCancelled => "Operation cancelled.".to_string(),

            // === OVERRIDE MESSAGES ===
            Message::OverrideCreated(id) => format!("Override {} created", id),
            Message::OverridesRemoved(ids) => format!("Overrides replaced entirely: {}", join_ids(ids)),
            Message::OverridesShrunk(ids) => format!("Overrides shortened: {}", join_ids(ids)),
            Message::OverridesSplitOff(ids) => format!("Overrides split off as new rows: {}", join_ids(ids)),
            Message::OverridesReapplied(group) => format!("Overrides of group {} reapplied", group),
            Message::NoOverrides(group) => format!("Group {} has no overrides.", group),

            // === SESSION AND ATTENDANCE MESSAGES ===
            Message::SessionsHeader(name) => format!("Sessions of '{}'", name),
            Message::NoSessions(group) => format!("No sessions found for group {}.", group),
            Message::SessionsRangeInverted(from, to) => format!("--from {} is after --to {}", from, to),
            Message::SessionRunning(id, slot) => format!("Session {} is running now ({})", id, slot),
            Message::RosterHeader { date, present, total } => format!("Attendance on {}: {}/{} present", date, present, total),
            Message::HistoryMonth { year, month, present, total } => format!("{:04}-{:02}: {}/{} attended", year, month, present, total),
            Message::NoHistory => "No attendance recorded for ended sessions yet.".to_string(),

            // === CHECK-IN MESSAGES ===
            Message::PromptStudentId => "Student ID".to_string(),
            Message::CheckInNoGroup(name) => format!("{} is not enrolled in any group", name),
            Message::CheckInNoSession(name) => format!("No session of {}'s groups is open for check-in right now", name),
            Message::CheckInAlreadyPresent(name) => format!("{} is already checked in", name),
            Message::CheckInMarked(name, count) => format!("{} checked in to {} session(s)", name, count),
        };
        write!(f, "{}", text)
    }
}
