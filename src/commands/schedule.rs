use crate::{
    db::{db::Db, roster::Roster, schedules::Schedules},
    libs::{
        clock::SystemClock,
        config::Config,
        engine::{Regeneration, ScheduleEngine},
        messages::Message,
        rule::{preview_count, ParseMode, RawRule, ScheduleRule},
        view::View,
    },
    msg_info, msg_print, msg_success, msg_warning,
};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm};
use rusqlite::Connection;
use std::{fs, path::Path, path::PathBuf};

#[derive(Debug, Args)]
pub struct ScheduleArgs {
    #[command(subcommand)]
    command: ScheduleCommand,
}

#[derive(Debug, Subcommand)]
enum ScheduleCommand {
    /// Replace the base schedule; started and imminent sessions are kept
    Set { group: i64, file: PathBuf },
    /// Remove the base schedule
    Clear {
        group: i64,
        /// Also remove overrides and every session, past ones included
        #[arg(long)]
        all: bool,
    },
    /// Print the stored base schedule
    Show { group: i64 },
    /// Count the sessions a schedule file would produce
    Preview { file: PathBuf },
}

pub fn cmd(args: ScheduleArgs) -> Result<()> {
    match args.command {
        ScheduleCommand::Set { group, file } => handle_set(group, &file),
        ScheduleCommand::Clear { group, all } => handle_clear(group, all),
        ScheduleCommand::Show { group } => handle_show(group),
        ScheduleCommand::Preview { file } => handle_preview(&file),
    }
}

/// Reads a JSON schedule payload from disk.
pub(crate) fn read_raw(path: &Path) -> Result<RawRule> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let raw: RawRule = serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(raw)
}

pub(crate) fn read_rule(path: &Path) -> Result<ScheduleRule> {
    Ok(ScheduleRule::from_raw(&read_raw(path)?, ParseMode::Generate)?)
}

/// Engine on the live clock with the configured protection window.
pub(crate) fn engine(conn: &mut Connection) -> Result<ScheduleEngine<'_, SystemClock>> {
    let config = Config::read()?.schedule.unwrap_or_default();
    Ok(ScheduleEngine::new(conn, SystemClock).with_config(&config))
}

pub(crate) fn report_regeneration(regen: Regeneration) {
    msg_info!(Message::SessionsRegenerated {
        deleted: regen.deleted,
        inserted: regen.inserted,
    });
}

fn handle_set(group_id: i64, file: &Path) -> Result<()> {
    let rule = read_rule(file)?;
    let mut db = Db::new()?;

    let regen = engine(&mut db.conn)?.save_base_schedule_future_only(group_id, Some(&rule))?;

    msg_success!(Message::BaseScheduleSaved(group_id));
    report_regeneration(regen);
    Ok(())
}

fn handle_clear(group_id: i64, all: bool) -> Result<()> {
    let mut db = Db::new()?;
    Roster::new(&db.conn).group(group_id)?;

    let regen = if all {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmClearAll(group_id).to_string())
            .default(false)
            .interact()?
            && Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::ConfirmClearAllFinal.to_string())
                .default(false)
                .interact()?;
        if !confirmed {
            msg_warning!(Message::OperationCancelled);
            return Ok(());
        }
        engine(&mut db.conn)?.save_base_schedule(group_id, None)?
    } else {
        engine(&mut db.conn)?.save_base_schedule_future_only(group_id, None)?
    };

    msg_success!(Message::BaseScheduleCleared(group_id));
    report_regeneration(regen);
    Ok(())
}

fn handle_show(group_id: i64) -> Result<()> {
    let db = Db::new()?;
    let group = Roster::new(&db.conn).group(group_id)?;

    match Schedules::new(&db.conn).load_base(group_id)? {
        Some(rule) => {
            msg_print!(group.name, true);
            View::rule(&rule)?;
        }
        None => msg_info!(Message::NoBaseSchedule(group_id)),
    }
    Ok(())
}

fn handle_preview(file: &Path) -> Result<()> {
    let count = preview_count(&read_raw(file)?)?;
    msg_print!(Message::SchedulePreview(count));
    Ok(())
}
