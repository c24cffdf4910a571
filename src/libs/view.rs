use super::attendance::{HistoryEntry, SessionRoster};
use super::roster::{Group, Student};
use super::rule::ScheduleRule;
use super::time::{format_date, format_time};
use crate::db::schedules::ScheduleOverride;
use crate::db::sessions::Session;
use anyhow::Result;
use prettytable::{row, Table};

pub struct View {}

impl View {
    /// Applied schema versions, oldest first.
    pub fn migrations(history: &[(u32, String, String)]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["VERSION", "NAME", "APPLIED"]);
        for (version, name, applied_at) in history {
            table.add_row(row![version, name, applied_at]);
        }
        table.printstd();

        Ok(())
    }

    pub fn groups(groups: &[Group]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", "NAME"]);
        for group in groups {
            table.add_row(row![group.id, group.name]);
        }
        table.printstd();

        Ok(())
    }

    pub fn students(students: &[Student]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", "NAME", "JOINED"]);
        for student in students {
            table.add_row(row![student.id, student.name, format_date(student.join_date)]);
        }
        table.printstd();

        Ok(())
    }

    /// Range, weekday windows and exclusions of one rule.
    pub fn rule(rule: &ScheduleRule) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["FROM", "TO"]);
        table.add_row(row![format_date(rule.start_date()), format_date(rule.end_date())]);
        table.printstd();

        let mut days = Table::new();
        days.add_row(row!["WEEKDAY", "START", "END"]);
        for (day, window) in rule.days() {
            days.add_row(row![day, format_time(window.start), format_time(window.end)]);
        }
        days.printstd();

        if !rule.exclusions().is_empty() {
            let excluded: Vec<String> = rule.exclusions().iter().map(|d| format_date(*d)).collect();
            println!("Excluded: {}", excluded.join(", "));
        }

        Ok(())
    }

    pub fn overrides(overrides: &[ScheduleOverride]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", "FROM", "TO", "DAYS", "EXCLUDED"]);
        for stored in overrides {
            let days: Vec<String> = stored
                .rule
                .days()
                .map(|(day, w)| format!("{} {}-{}", day, format_time(w.start), format_time(w.end)))
                .collect();
            table.add_row(row![
                stored.id,
                format_date(stored.rule.start_date()),
                format_date(stored.rule.end_date()),
                days.join("\n"),
                stored.rule.exclusions().len()
            ]);
        }
        table.printstd();

        Ok(())
    }

    pub fn sessions(sessions: &[Session]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", "DATE", "START", "END", "SOURCE"]);
        for session in sessions {
            let source = match session.override_id {
                Some(id) => format!("override {}", id),
                None if session.is_temporary => "override (removed)".to_string(),
                None => "base".to_string(),
            };
            table.add_row(row![
                session.id,
                format_date(session.date),
                format_time(session.start),
                format_time(session.end),
                source
            ]);
        }
        table.printstd();

        Ok(())
    }

    pub fn roster(roster: &SessionRoster) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", "NAME", "PRESENT"]);
        for student in &roster.present {
            table.add_row(row![student.id, student.name, "yes"]);
        }
        for student in &roster.absent {
            table.add_row(row![student.id, student.name, "no"]);
        }
        table.printstd();

        Ok(())
    }

    /// Entries of one month of a student's history.
    pub fn history_month(entries: &[HistoryEntry]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["DATE", "SESSION", "STATUS"]);
        for entry in entries {
            let status = if entry.present { "present" } else { "absent" };
            table.add_row(row![format_date(entry.date), entry.session_id, status]);
        }
        table.printstd();

        Ok(())
    }
}
