use crate::{
    db::{db::Db, roster::Roster},
    libs::{
        checkin::{CheckIn, CheckInOutcome, CheckInResult},
        clock::SystemClock,
        config::Config,
        messages::Message,
        view::View,
    },
    msg_error, msg_info, msg_success, msg_warning,
};
use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Input};

#[derive(Debug, Args)]
pub struct CheckInArgs {
    /// Student to check in; without it, IDs are read one per line until an empty one
    student: Option<i64>,
}

pub fn cmd(args: CheckInArgs) -> Result<()> {
    let db = Db::new()?;
    let roster = Roster::new(&db.conn);
    let config = Config::read()?.checkin.unwrap_or_default();
    let checkin = CheckIn::new(&db.conn, SystemClock, &roster, &roster).with_config(&config);

    if let Some(student_id) = args.student {
        report(checkin.check_in(student_id)?)?;
        return Ok(());
    }

    loop {
        let input: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptStudentId.to_string())
            .allow_empty(true)
            .interact_text()?;
        let input = input.trim();
        if input.is_empty() {
            break;
        }

        let result = input
            .parse::<i64>()
            .map_err(anyhow::Error::from)
            .and_then(|id| checkin.check_in(id).map_err(anyhow::Error::from));
        match result {
            Ok(result) => report(result)?,
            Err(e) => msg_error!(e),
        }
    }
    Ok(())
}

fn report(result: CheckInResult) -> Result<()> {
    let name = result.student.name;
    match result.outcome {
        CheckInOutcome::NoGroup => msg_warning!(Message::CheckInNoGroup(name)),
        CheckInOutcome::NoSessionNow => msg_warning!(Message::CheckInNoSession(name)),
        CheckInOutcome::AlreadyPresent(sessions) => {
            msg_info!(Message::CheckInAlreadyPresent(name));
            View::sessions(&sessions)?;
        }
        CheckInOutcome::Marked { sessions, .. } => {
            msg_success!(Message::CheckInMarked(name, sessions.len()));
            View::sessions(&sessions)?;
        }
    }
    Ok(())
}
