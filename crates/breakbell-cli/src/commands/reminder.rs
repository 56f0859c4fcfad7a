use breakbell_core::calendar::HolidayCache;
use breakbell_core::error::CoreError;
use breakbell_core::{IntervalReminder, IntervalUnit, OneTimeReminder, ReminderDefinition};
use chrono::Local;
use clap::{Subcommand, ValueEnum};

use super::{engine_at, parse_local_time, CmdResult, ConfigStore};

#[derive(Clone, Copy, ValueEnum)]
pub enum UnitArg {
    Seconds,
    Minutes,
    Hours,
}

impl From<UnitArg> for IntervalUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Seconds => IntervalUnit::Seconds,
            UnitArg::Minutes => IntervalUnit::Minutes,
            UnitArg::Hours => IntervalUnit::Hours,
        }
    }
}

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Add a repeating reminder
    AddInterval {
        /// Reminder title
        title: String,
        /// Period length
        #[arg(long)]
        every: f64,
        #[arg(long, value_enum, default_value = "minutes")]
        unit: UnitArg,
        /// Explicit id (a UUID is generated otherwise)
        #[arg(long)]
        id: Option<String>,
    },
    /// Add a reminder that fires once
    AddOnce {
        /// Reminder title
        title: String,
        /// RFC 3339 or local "YYYY-MM-DD HH:MM"
        #[arg(long)]
        at: String,
        #[arg(long)]
        id: Option<String>,
    },
    /// List reminders with their countdowns as JSON
    List,
    /// Remove a reminder
    Remove { id: String },
    /// Enable a reminder; its countdown restarts
    Enable { id: String },
    /// Disable a reminder, keeping it in the list
    Disable { id: String },
}

fn new_id(id: Option<String>) -> String {
    id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

pub fn run(action: ReminderAction, store: &ConfigStore) -> CmdResult {
    let mut config = store.load()?;
    let now = Local::now();
    // The gate does not affect custom reminders; no holiday data needed.
    let mut engine = engine_at(&config, &HolidayCache::new(), now);

    let outcome = match action {
        ReminderAction::AddInterval {
            title,
            every,
            unit,
            id,
        } => {
            let def = ReminderDefinition::Interval(IntervalReminder {
                id: new_id(id),
                title,
                enabled: true,
                interval_value: every,
                interval_unit: unit.into(),
                next_trigger_time: None,
            });
            let id = def.id().to_string();
            let outcome = engine.upsert_reminder(def, now)?;
            println!("{id}");
            outcome
        }
        ReminderAction::AddOnce { title, at, id } => {
            let target = parse_local_time(&at)?;
            if target <= now {
                return Err(CoreError::Custom(format!("'{at}' is in the past")));
            }
            let def = ReminderDefinition::OneTime(OneTimeReminder {
                id: new_id(id),
                title,
                enabled: true,
                target_date_time: target.timestamp_millis(),
            });
            let id = def.id().to_string();
            let outcome = engine.upsert_reminder(def, now)?;
            println!("{id}");
            outcome
        }
        ReminderAction::List => {
            engine.tick_at(now);
            let rows = engine.status().reminders;
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }
        ReminderAction::Remove { id } => engine.delete_reminder(&id, now)?,
        ReminderAction::Enable { id } => engine.set_reminder_enabled(&id, true, now)?,
        ReminderAction::Disable { id } => engine.set_reminder_enabled(&id, false, now)?,
    };

    if outcome.definitions_changed {
        config.reminders = engine.reminders().to_vec();
        store.save(&config)?;
    }
    Ok(())
}
