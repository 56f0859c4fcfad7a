pub mod calendar;
pub mod config;
pub mod reminder;
pub mod run;
pub mod status;

use breakbell_core::calendar::{CalendarGate, HolidayCache};
use breakbell_core::error::{ConfigError, CoreError};
use breakbell_core::{Config, ReminderEngine};
use chrono::{DateTime, Datelike, Local, NaiveDateTime, TimeZone};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;

pub type CmdResult = breakbell_core::error::Result<()>;

/// Config file location for this invocation.
pub struct ConfigStore {
    path: Option<PathBuf>,
}

impl ConfigStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        match &self.path {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        match &self.path {
            Some(path) => config.save_to(path),
            None => config.save(),
        }
    }

    /// Last modification time of the config file, if it can be read.
    pub fn modified(&self) -> Option<SystemTime> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => Config::path().ok()?,
        };
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}

/// Engine over `config` for a one-shot command.
pub fn engine_at(config: &Config, holidays: &HolidayCache, now: DateTime<Local>) -> ReminderEngine {
    ReminderEngine::new(config.engine_setup(), CalendarGate::new(holidays.clone()), now)
}

/// Fill the holiday cache for `now` before a one-shot gate check.
///
/// Fetch failures are logged; the gate then treats the day as a work day.
pub fn preload_holidays(config: &Config, now: DateTime<Local>) -> Result<HolidayCache, std::io::Error> {
    let cache = HolidayCache::with_source(config.holiday_source());
    if config.calendar.policy.skip_holidays {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        if let Err(e) = rt.block_on(cache.ensure_year_now(now.year(), now.month())) {
            warn!("holiday data unavailable: {e}");
        }
    }
    Ok(cache)
}

/// Accepts RFC 3339 or local "YYYY-MM-DD HH:MM[:SS]".
pub fn parse_local_time(value: &str) -> Result<DateTime<Local>, CoreError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M"))
        .map_err(|_| CoreError::Custom(format!("cannot parse '{value}' as a date and time")))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| CoreError::Custom(format!("'{value}' does not exist in the local time zone")))
}
