use crate::{
    db::{
        db::Db,
        migrations::{get_db_version, MigrationManager},
    },
    libs::{messages::Message, view::View},
    msg_info, msg_print, msg_success, msg_warning,
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct MigrationsArgs {
    #[command(subcommand)]
    command: MigrationsCommand,
}

#[derive(Debug, Subcommand)]
enum MigrationsCommand {
    /// Schema version and the migrations still to be applied
    Status,
    /// Applied migrations with their timestamps
    History,
}

pub fn cmd(args: MigrationsArgs) -> Result<()> {
    // Opened raw: inspecting the schema must not migrate it.
    let conn = Db::new_without_migrations()?;
    let manager = MigrationManager::new();

    match args.command {
        MigrationsCommand::Status => {
            let pending = manager.pending_migrations(&conn)?;
            msg_print!(Message::SchemaVersion {
                current: get_db_version(&conn)?,
                latest: manager.latest_version(),
            });

            if pending.is_empty() {
                msg_success!(Message::DatabaseUpToDate);
            }
            for (version, name) in pending {
                msg_warning!(Message::PendingMigration(version, name.to_string()));
            }
        }
        MigrationsCommand::History => {
            let history = manager.get_migration_history(&conn)?;
            if history.is_empty() {
                msg_info!(Message::NoMigrationsApplied);
                return Ok(());
            }
            msg_print!(Message::MigrationHistory, true);
            View::migrations(&history)?;
        }
    }

    Ok(())
}
