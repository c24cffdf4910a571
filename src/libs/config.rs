//! Application configuration.
//!
//! Stored as `config.json` in the platform data directory (see
//! [`DataStorage`]). Every section is optional and falls back to its
//! defaults, so the application runs without any configuration file.
//!
//! ```rust,no_run
//! use lessonbook::libs::config::Config;
//!
//! let config = Config::read()?;
//! let schedule = config.schedule.unwrap_or_default();
//! println!("Protected window: {} minutes", schedule.protection_minutes);
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use crate::db::db::DB_FILE_NAME;
use crate::libs::engine::DEFAULT_PROTECTION_MINUTES;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};

pub const CONFIG_FILE_NAME: &str = "config.json";

/// A configurable section offered by the setup wizard.
#[derive(Debug, Clone)]
pub struct ConfigModule {
    pub key: String,
    pub name: String,
}

/// Schedule regeneration settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScheduleConfig {
    /// Sessions starting within this many minutes from now are left alone
    /// by edit-safe regeneration, as are past and running ones.
    pub protection_minutes: i64,
}

/// Live check-in settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CheckInConfig {
    /// How many minutes before a session's start a check-in already counts.
    pub window_minutes: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DatabaseConfig {
    /// Database file name inside the data directory.
    pub file_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkin: Option<CheckInConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            protection_minutes: DEFAULT_PROTECTION_MINUTES,
        }
    }
}

impl Default for CheckInConfig {
    fn default() -> Self {
        CheckInConfig { window_minutes: 30 }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            file_name: DB_FILE_NAME.to_string(),
        }
    }
}

impl Config {
    /// Loads `config.json`, or the defaults when there is none yet.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;

        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;

        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Interactive setup wizard; current values are offered as defaults.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();

        let modules = vec![
            ConfigModule {
                key: "schedule".to_string(),
                name: "Schedule".to_string(),
            },
            ConfigModule {
                key: "checkin".to_string(),
                name: "Check-in".to_string(),
            },
            ConfigModule {
                key: "database".to_string(),
                name: "Database".to_string(),
            },
        ];

        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSelectModules.to_string())
            .items(&modules.iter().map(|module| &module.name).collect::<Vec<_>>())
            .interact()?;

        for &selection in &selected {
            match modules[selection].key.as_str() {
                "schedule" => {
                    let default = config.schedule.clone().unwrap_or_default();
                    msg_print!(Message::ConfigModuleSchedule);
                    config.schedule = Some(ScheduleConfig {
                        protection_minutes: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptProtectionMinutes.to_string())
                            .default(default.protection_minutes)
                            .interact_text()?,
                    });
                }
                "checkin" => {
                    let default = config.checkin.clone().unwrap_or_default();
                    msg_print!(Message::ConfigModuleCheckIn);
                    config.checkin = Some(CheckInConfig {
                        window_minutes: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptCheckInWindow.to_string())
                            .default(default.window_minutes)
                            .interact_text()?,
                    });
                }
                "database" => {
                    let default = config.database.clone().unwrap_or_default();
                    msg_print!(Message::ConfigModuleDatabase);
                    config.database = Some(DatabaseConfig {
                        file_name: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptDatabaseFile.to_string())
                            .default(default.file_name)
                            .interact_text()?,
                    });
                }
                _ => {}
            }
        }

        Ok(config)
    }
}
