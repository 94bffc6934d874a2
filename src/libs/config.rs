//! Configuration management for taskdesk.
//!
//! Settings live in `config.json` inside the platform data directory (see
//! [`DataStorage`]). Every section is optional: a missing file, or a missing
//! section, falls back to defaults so the application runs without setup.
//!
//! ## Configuration Structure
//!
//! - **User**: the identity tasks are created under and listed for
//! - **Store**: conflict retries and database lock timeout
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskdesk::libs::config::Config;
//!
//! let mut config = Config::read()?;
//! let retries = config.store_or_default().conflict_retries;
//! config.save()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use crate::db::db::DEFAULT_BUSY_TIMEOUT_MS;
use crate::libs::messages::Message;
use crate::libs::store::DEFAULT_CONFLICT_RETRIES;
use crate::{msg_error_anyhow, msg_print};
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};

/// Configuration file name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Environment variable that selects the active user, overriding `config.json`.
pub const USER_ENV_VAR: &str = "TASKDESK_USER";

/// A module offered by the interactive setup.
#[derive(Debug, Clone)]
pub struct ConfigModule {
    pub key: String,
    pub name: String,
}

/// Identity tasks are owned by.
///
/// `id` is what gets stored in every task's `userId`; `name` is only shown
/// in greetings and headers.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl UserConfig {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
        }
    }

    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Task store tuning.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StoreConfig {
    /// How often a mutation is replayed after losing a race with another writer.
    pub conflict_retries: u32,
    /// How long to wait on a database locked by another process, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,
}

impl Config {
    /// Reads `config.json` from the platform data directory.
    pub fn read() -> Result<Config> {
        Self::read_in(&DataStorage::new())
    }

    /// Reads `config.json` from `storage`, returning defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or parsed.
    pub fn read_in(storage: &DataStorage) -> Result<Config> {
        let config_file_path = storage.get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        serde_json::from_str(&config_str).map_err(|e| msg_error_anyhow!(Message::ConfigParseError(e.to_string())))
    }

    pub fn save(&self) -> Result<()> {
        self.save_in(&DataStorage::new())
    }

    /// Writes the configuration as pretty-printed JSON, replacing any existing file.
    pub fn save_in(&self, storage: &DataStorage) -> Result<()> {
        let config_file_path = storage.get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    pub fn delete() -> Result<bool> {
        Self::delete_in(&DataStorage::new())
    }

    /// Removes `config.json`. Returns `false` when there was no file.
    pub fn delete_in(storage: &DataStorage) -> Result<bool> {
        let config_file_path = storage.get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(false);
        }
        fs::remove_file(config_file_path)?;
        Ok(true)
    }

    pub fn store_or_default(&self) -> StoreConfig {
        self.store.clone().unwrap_or_default()
    }

    /// Picks the active user: explicit flag, then environment, then `config.json`.
    ///
    /// Blank values are skipped. A flag or environment id that matches the
    /// configured user keeps the configured display name.
    pub fn resolve_user(&self, flag: Option<&str>, env: Option<&str>) -> Option<UserConfig> {
        let explicit = [flag, env]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|id| !id.is_empty());

        match (explicit, &self.user) {
            (Some(id), Some(configured)) if configured.id == id => Some(configured.clone()),
            (Some(id), _) => Some(UserConfig::new(id)),
            (None, Some(configured)) if !configured.id.trim().is_empty() => Some(configured.clone()),
            (None, _) => None,
        }
    }

    /// Interactive setup wizard, pre-filled with the current values.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();

        let modules = vec![
            ConfigModule {
                key: "user".to_string(),
                name: Message::ConfigModuleUser.to_string(),
            },
            ConfigModule {
                key: "store".to_string(),
                name: Message::ConfigModuleStore.to_string(),
            },
        ];

        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSelectModules.to_string())
            .items(&modules.iter().map(|module| &module.name).collect::<Vec<_>>())
            .defaults(&[true, false])
            .interact()?;

        for &selection in &selected {
            match modules[selection].key.as_str() {
                "user" => {
                    let default = config.user.clone().unwrap_or_else(|| UserConfig::new(""));
                    msg_print!(Message::ConfigModuleUser);
                    let id: String = Input::with_theme(&ColorfulTheme::default())
                        .with_prompt(Message::PromptUserId.to_string())
                        .with_initial_text(default.id)
                        .validate_with(|input: &String| -> std::result::Result<(), String> {
                            if input.trim().is_empty() {
                                Err(Message::PromptUserId.to_string())
                            } else {
                                Ok(())
                            }
                        })
                        .interact_text()?;
                    let name: String = Input::with_theme(&ColorfulTheme::default())
                        .with_prompt(Message::PromptUserName.to_string())
                        .with_initial_text(default.name)
                        .allow_empty(true)
                        .interact_text()?;
                    config.user = Some(UserConfig {
                        id: id.trim().to_string(),
                        name: name.trim().to_string(),
                    });
                }
                "store" => {
                    let default = config.store_or_default();
                    msg_print!(Message::ConfigModuleStore);
                    config.store = Some(StoreConfig {
                        conflict_retries: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptConflictRetries.to_string())
                            .default(default.conflict_retries)
                            .interact_text()?,
                        busy_timeout_ms: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptBusyTimeout.to_string())
                            .default(default.busy_timeout_ms)
                            .interact_text()?,
                    });
                }
                _ => {}
            }
        }

        Ok(config)
    }
}
