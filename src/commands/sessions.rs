use crate::{
    db::{db::Db, roster::Roster, sessions::Sessions},
    libs::{
        messages::Message,
        time::{format_date, parse_date, slot_key},
        view::View,
    },
    msg_bail_anyhow, msg_info, msg_print,
};
use anyhow::Result;
use chrono::Local;
use clap::Args;

#[derive(Debug, Args)]
pub struct SessionsArgs {
    group: i64,
    /// First date to list (YYYY-MM-DD)
    #[arg(short, long)]
    from: Option<String>,
    /// Last date to list (YYYY-MM-DD)
    #[arg(short, long)]
    to: Option<String>,
}

pub fn cmd(args: SessionsArgs) -> Result<()> {
    let db = Db::new()?;
    let group = Roster::new(&db.conn).group(args.group)?;
    let sessions_db = Sessions::new(&db.conn);

    let sessions = match (args.from, args.to) {
        (Some(from), Some(to)) => {
            let (from, to) = (parse_date(&from)?, parse_date(&to)?);
            if from > to {
                msg_bail_anyhow!(Message::SessionsRangeInverted(format_date(from), format_date(to)));
            }
            sessions_db.list_between(args.group, from, to)?
        }
        (from, to) => {
            let from = from.map(|d| parse_date(&d)).transpose()?;
            let to = to.map(|d| parse_date(&d)).transpose()?;
            sessions_db
                .list_for_group(args.group)?
                .into_iter()
                .filter(|s| from.map_or(true, |from| s.date >= from) && to.map_or(true, |to| s.date <= to))
                .collect()
        }
    };

    if sessions.is_empty() {
        msg_info!(Message::NoSessions(args.group));
        return Ok(());
    }

    msg_print!(Message::SessionsHeader(group.name), true);
    View::sessions(&sessions)?;

    let now = Local::now().naive_local();
    if let Some(running) = sessions_db.running_at(args.group, now)? {
        msg_info!(Message::SessionRunning(running.id, slot_key(running.starts_at())));
    }
    Ok(())
}
