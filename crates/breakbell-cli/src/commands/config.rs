use clap::Subcommand;
use breakbell_core::error::ConfigError;
use breakbell_core::Config;

use super::{CmdResult, ConfigStore};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "main.interval_value", "calendar.work_mode")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value; lists and tables as JSON
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Print the config file location
    Path,
}

pub fn run(action: ConfigAction, store: &ConfigStore) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let config = store.load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(ConfigError::UnknownKey(key).into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = store.load()?;
            config.set(&key, &value)?;
            store.save(&config)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = store.load()?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let mut config = Config::default();
            // Reminders are user data, not settings.
            config.reminders = store.load().map(|c| c.reminders).unwrap_or_default();
            store.save(&config)?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => match store.path() {
            Some(path) => println!("{}", path.display()),
            None => println!("{}", Config::path()?.display()),
        },
    }
    Ok(())
}
