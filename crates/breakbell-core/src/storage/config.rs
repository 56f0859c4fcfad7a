//! TOML-based application configuration.
//!
//! Stores:
//! - The main break reminder (interval, title, message)
//! - Calendar gating (work mode, holidays, active hours)
//! - Engine timing constants
//! - Holiday data source
//! - The custom reminder definitions, including each interval's next
//!   trigger time
//!
//! Configuration is stored at `~/.config/breakbell/config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use super::data_dir;
use crate::calendar::{CalendarPolicy, HolidaySource, DEFAULT_HOLIDAY_URL};
use crate::error::{ConfigError, ValidationError};
use crate::reminder::{MainReminderConfig, ReminderDefinition};
use crate::timer::{EngineSetup, EngineTuning};

/// Calendar gating for the main reminder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Master switch; when off the main reminder ignores the calendar.
    #[serde(default)]
    pub active_hours_enabled: bool,
    #[serde(flatten)]
    pub policy: CalendarPolicy,
}

/// Holiday data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayConfig {
    /// URL with a `{year}` placeholder.
    #[serde(default = "default_holiday_url")]
    pub url_template: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// A notification surface is attached. Without one the host chimes.
    #[serde(default = "default_true")]
    pub external_surface: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breakbell/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub main: MainReminderConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub engine: EngineTuning,
    #[serde(default)]
    pub holidays: HolidayConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub reminders: Vec<ReminderDefinition>,
}

// Default functions
fn default_holiday_url() -> String {
    DEFAULT_HOLIDAY_URL.into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_true() -> bool {
    true
}

impl Default for HolidayConfig {
    fn default() -> Self {
        Self {
            url_template: default_holiday_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            external_surface: true,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let mut cfg: Config =
                    toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
                cfg.dedup_reminders();
                debug!(path = %path.display(), reminders = cfg.reminders.len(), "config loaded");
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(load_failed(e.to_string())),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. The caller persists.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result does not validate. The config is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate().map_err(|e| invalid(e.to_string()))?;
        *self = updated;
        Ok(())
    }

    /// Calendar ranges and reminder definitions must be well formed, with
    /// unique ids.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.calendar.policy.validate()?;
        let mut seen = HashSet::new();
        for def in &self.reminders {
            def.validate()?;
            if !seen.insert(def.id()) {
                return Err(ValidationError::DuplicateId(def.id().to_string()));
            }
        }
        Ok(())
    }

    /// Keep the first definition for each id.
    fn dedup_reminders(&mut self) {
        let mut seen = HashSet::new();
        self.reminders.retain(|def| {
            let first = seen.insert(def.id().to_string());
            if !first {
                warn!(id = def.id(), "duplicate reminder id in config, dropped");
            }
            first
        });
    }

    pub fn engine_setup(&self) -> EngineSetup {
        EngineSetup {
            tuning: self.engine.clone(),
            main: self.main.clone(),
            active_hours_enabled: self.calendar.active_hours_enabled,
            policy: self.calendar.policy.clone(),
            reminders: self.reminders.clone(),
            external_surface: self.notifications.external_surface,
        }
    }

    pub fn holiday_source(&self) -> HolidaySource {
        HolidaySource {
            url_template: self.holidays.url_template.clone(),
            timeout: Duration::from_secs(self.holidays.timeout_secs),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
