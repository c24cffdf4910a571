use crate::{
    db::{attendance::Attendance, db::Db, roster::Roster, sessions::Sessions},
    libs::{attendance::AttendanceService, clock::SystemClock, messages::Message, roster::Membership, time::format_date, view::View},
    msg_info, msg_print, msg_success, msg_warning,
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct AttendanceArgs {
    #[command(subcommand)]
    command: AttendanceCommand,
}

#[derive(Debug, Subcommand)]
enum AttendanceCommand {
    /// Who was present and absent at a session
    Roster { group: i64, session: i64 },
    /// A student's attendance per month
    History { group: i64, student: i64 },
    /// Mark students present at a session by hand
    Mark {
        session: i64,
        #[arg(required = true, num_args = 1..)]
        students: Vec<i64>,
    },
}

pub fn cmd(args: AttendanceArgs) -> Result<()> {
    let db = Db::new()?;
    let roster = Roster::new(&db.conn);
    let service = AttendanceService::new(&db.conn, SystemClock, &roster, &roster);

    match args.command {
        AttendanceCommand::Roster { group, session } => {
            let date = Sessions::new(&db.conn).get(session)?.date;
            let result = service.session_roster(session, group)?;
            msg_print!(
                Message::RosterHeader {
                    date: format_date(date),
                    present: result.present.len(),
                    total: result.total,
                },
                true
            );
            View::roster(&result)?;
        }
        AttendanceCommand::History { group, student } => {
            let history = service.student_month_history(group, student)?;
            if history.is_empty() {
                msg_info!(Message::NoHistory);
                return Ok(());
            }
            for ((year, month), entries) in &history {
                msg_print!(
                    Message::HistoryMonth {
                        year: *year,
                        month: *month,
                        present: entries.iter().filter(|e| e.present).count(),
                        total: entries.len(),
                    },
                    true
                );
                View::history_month(entries)?;
            }
        }
        AttendanceCommand::Mark { session, students } => {
            let session = Sessions::new(&db.conn).get(session)?;
            let members = roster.members(session.group_id)?;
            let attendance = Attendance::new(&db.conn);
            for student_id in students {
                let Some(student) = members.iter().find(|s| s.id == student_id) else {
                    msg_warning!(Message::StudentNotInGroup(student_id, session.group_id));
                    continue;
                };
                if attendance.mark_present(session.id, student.id)? {
                    msg_success!(Message::CheckInMarked(student.name.clone(), 1));
                } else {
                    msg_info!(Message::CheckInAlreadyPresent(student.name.clone()));
                }
            }
        }
    }

    Ok(())
}
