use super::schedule::{engine, read_rule, report_regeneration};
use crate::{
    db::{db::Db, roster::Roster},
    libs::{messages::Message, roster::Membership, view::View},
    msg_bail_anyhow, msg_info, msg_print, msg_success,
};
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct GroupArgs {
    #[command(subcommand)]
    command: Option<GroupCommand>,
}

#[derive(Debug, Subcommand)]
enum GroupCommand {
    /// Create a group, optionally generating its sessions from a schedule file
    Add {
        name: String,
        #[arg(short, long)]
        schedule: Option<PathBuf>,
    },
    /// Delete a group with its schedule, sessions and attendance
    Delete { group: i64 },
    List,
    Members { group: i64 },
}

pub fn cmd(args: GroupArgs) -> Result<()> {
    match args.command {
        Some(GroupCommand::Add { name, schedule }) => handle_add(name, schedule),
        Some(GroupCommand::Delete { group }) => handle_delete(group),
        Some(GroupCommand::Members { group }) => handle_members(group),
        Some(GroupCommand::List) | None => handle_list(),
    }
}

fn handle_add(name: String, schedule: Option<PathBuf>) -> Result<()> {
    // Parse first so a bad file never leaves an empty group behind.
    let rule = schedule.as_deref().map(read_rule).transpose()?;
    let mut db = Db::new()?;
    let group_id = Roster::new(&db.conn).create_group(&name)?;

    if let Some(rule) = rule {
        let generated = engine(&mut db.conn)?.save_base_schedule(group_id, Some(&rule));
        match generated {
            Ok(regen) => report_regeneration(regen),
            Err(e) => {
                // Drop whatever was generated, then the group itself.
                engine(&mut db.conn)?.save_base_schedule(group_id, None)?;
                Roster::new(&db.conn).delete_group(group_id)?;
                msg_bail_anyhow!(format!("{}: {}", Message::GroupCreationRolledBack(name), e));
            }
        }
    }

    msg_success!(Message::GroupCreated(group_id, name));
    Ok(())
}

fn handle_delete(group_id: i64) -> Result<()> {
    let db = Db::new()?;
    Roster::new(&db.conn).delete_group(group_id)?;
    msg_success!(Message::GroupDeleted(group_id));
    Ok(())
}

fn handle_list() -> Result<()> {
    let db = Db::new()?;
    let groups = Roster::new(&db.conn).list_groups()?;

    if groups.is_empty() {
        msg_info!(Message::NoGroups);
        return Ok(());
    }

    msg_print!(Message::GroupsHeader, true);
    View::groups(&groups)?;
    Ok(())
}

fn handle_members(group_id: i64) -> Result<()> {
    let db = Db::new()?;
    let roster = Roster::new(&db.conn);
    let group = roster.group(group_id)?;
    let members = roster.members(group_id)?;

    if members.is_empty() {
        msg_info!(Message::NoMembers(group_id));
        return Ok(());
    }

    msg_print!(Message::MembersHeader(group.name), true);
    View::students(&members)?;
    Ok(())
}
