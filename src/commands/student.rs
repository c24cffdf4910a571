use crate::{
    db::{db::Db, roster::Roster},
    libs::{messages::Message, time::parse_date},
    msg_success,
};
use anyhow::Result;
use chrono::Local;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct StudentArgs {
    #[command(subcommand)]
    command: StudentCommand,
}

#[derive(Debug, Subcommand)]
enum StudentCommand {
    Add {
        name: String,
        /// Join date (YYYY-MM-DD), today by default
        #[arg(short, long)]
        joined: Option<String>,
        /// Groups to enroll the student in
        #[arg(short, long, num_args = 1..)]
        group: Vec<i64>,
    },
    Join { student: i64, group: i64 },
    Leave { student: i64, group: i64 },
}

pub fn cmd(args: StudentArgs) -> Result<()> {
    let db = Db::new()?;
    let roster = Roster::new(&db.conn);

    match args.command {
        StudentCommand::Add { name, joined, group } => {
            let join_date = match joined {
                Some(date) => parse_date(&date)?,
                None => Local::now().date_naive(),
            };
            let student_id = roster.create_student(&name, join_date)?;
            msg_success!(Message::StudentCreated(student_id, name));
            for group_id in group {
                roster.group(group_id)?;
                roster.add_member(student_id, group_id)?;
                msg_success!(Message::StudentJoinedGroup(student_id, group_id));
            }
        }
        StudentCommand::Join { student, group } => {
            roster.group(group)?;
            roster.add_member(student, group)?;
            msg_success!(Message::StudentJoinedGroup(student, group));
        }
        StudentCommand::Leave { student, group } => {
            roster.remove_member(student, group)?;
            msg_success!(Message::StudentLeftGroup(student, group));
        }
    }

    Ok(())
}
