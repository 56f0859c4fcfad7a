use breakbell_core::calendar::gate::date_key;
use breakbell_core::calendar::{is_within_active_hours, work_mode_allows, CalendarGate};
use chrono::{Datelike, Local};
use clap::Subcommand;
use serde::Serialize;

use super::{parse_local_time, preload_holidays, CmdResult, ConfigStore};

#[derive(Subcommand)]
pub enum CalendarAction {
    /// Report whether a moment is active for the main reminder
    Check {
        /// Moment to check (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },
}

#[derive(Serialize)]
struct GateReport {
    at: String,
    active_hours_enabled: bool,
    active: bool,
    off_day: bool,
    work_day: bool,
    within_active_hours: bool,
}

pub fn run(action: CalendarAction, store: &ConfigStore) -> CmdResult {
    match action {
        CalendarAction::Check { at } => {
            let config = store.load()?;
            let moment = match at {
                Some(value) => parse_local_time(&value)?,
                None => Local::now(),
            };
            let holidays = preload_holidays(&config, moment)?;
            let policy = &config.calendar.policy;
            let naive = moment.naive_local();
            let key = date_key(&naive);

            let report = GateReport {
                at: moment.to_rfc3339(),
                active_hours_enabled: config.calendar.active_hours_enabled,
                active: CalendarGate::new(holidays.clone()).is_active_at(policy, naive),
                off_day: holidays.is_off_day(&key),
                work_day: work_mode_allows(policy, naive.weekday()),
                within_active_hours: is_within_active_hours(naive.time(), &policy.active_hours),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
