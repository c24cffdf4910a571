use crate::db::migrations::init_with_migrations;
use crate::libs::config::Config;
use crate::libs::data_storage::DataStorage;
use crate::msg_debug;
use anyhow::Result;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub const DB_FILE_NAME: &str = "lessonbook.db";

pub struct Db {
    pub conn: Connection,
}

impl Db {
    /// Opens the database named in the configuration inside the data directory.
    pub fn new() -> Result<Db> {
        Self::open(Self::default_path()?)
    }

    /// Opens (or creates) a database file and brings its schema up to date.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Db> {
        msg_debug!(format!("Opening database {}", path.as_ref().display()));
        let mut conn = Self::connect(Connection::open(path)?)?;
        init_with_migrations(&mut conn)?;
        Ok(Db { conn })
    }

    pub fn in_memory() -> Result<Db> {
        let mut conn = Self::connect(Connection::open_in_memory()?)?;
        init_with_migrations(&mut conn)?;
        Ok(Db { conn })
    }

    /// Raw connection to the data directory database, schema untouched.
    pub fn new_without_migrations() -> Result<Connection> {
        Self::connect(Connection::open(Self::default_path()?)?)
    }

    fn default_path() -> Result<PathBuf> {
        let file_name = Config::read()?.database.unwrap_or_default().file_name;
        DataStorage::new().get_path(&file_name)
    }

    fn connect(conn: Connection) -> Result<Connection> {
        // Cascades from groups, sessions and students rely on this.
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }
}
