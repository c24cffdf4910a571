use super::schedule::{engine, read_rule, report_regeneration};
use crate::{
    db::{db::Db, roster::Roster, schedules::Schedules},
    libs::{messages::Message, view::View},
    msg_info, msg_print, msg_success,
};
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct OverrideArgs {
    #[command(subcommand)]
    command: OverrideCommand,
}

#[derive(Debug, Subcommand)]
enum OverrideCommand {
    /// Add a temporary schedule for a date range; overlapping overrides are clipped
    Add { group: i64, file: PathBuf },
    List { group: i64 },
    /// Regenerate every override's future sessions
    Reapply { group: i64 },
}

pub fn cmd(args: OverrideArgs) -> Result<()> {
    match args.command {
        OverrideCommand::Add { group, file } => handle_add(group, file),
        OverrideCommand::List { group } => handle_list(group),
        OverrideCommand::Reapply { group } => {
            let mut db = Db::new()?;
            let regen = engine(&mut db.conn)?.reapply_overrides_future(group)?;
            msg_success!(Message::OverridesReapplied(group));
            report_regeneration(regen);
            Ok(())
        }
    }
}

fn handle_add(group_id: i64, file: PathBuf) -> Result<()> {
    let rule = read_rule(&file)?;
    let mut db = Db::new()?;

    let created = engine(&mut db.conn)?.create_temporary_override(group_id, &rule)?;

    msg_success!(Message::OverrideCreated(created.override_id));
    if !created.removed.is_empty() {
        msg_info!(Message::OverridesRemoved(created.removed));
    }
    if !created.shrunk.is_empty() {
        msg_info!(Message::OverridesShrunk(created.shrunk));
    }
    if !created.split_off.is_empty() {
        msg_info!(Message::OverridesSplitOff(created.split_off));
    }
    report_regeneration(created.regeneration);
    Ok(())
}

fn handle_list(group_id: i64) -> Result<()> {
    let db = Db::new()?;
    let group = Roster::new(&db.conn).group(group_id)?;
    let overrides = Schedules::new(&db.conn).list_overrides(group_id)?;

    if overrides.is_empty() {
        msg_info!(Message::NoOverrides(group_id));
        return Ok(());
    }

    msg_print!(group.name, true);
    View::overrides(&overrides)?;
    Ok(())
}
