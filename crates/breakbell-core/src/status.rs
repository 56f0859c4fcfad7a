//! Read-only projection of the engine for display.

use serde::{Deserialize, Serialize};

use crate::reminder::ReminderKind;
use crate::timer::AppStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainStatus {
    pub status: AppStatus,
    pub time_left: u64,
    pub total_time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderStatus {
    pub id: String,
    pub title: String,
    pub time_left: u64,
    /// Period in seconds; one-time reminders have none.
    pub total_time: Option<u64>,
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: ReminderKind,
    pub target_date_time: Option<i64>,
    pub alert_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub main: MainStatus,
    pub reminders: Vec<ReminderStatus>,
    pub active_alerts: Vec<String>,
}

impl EngineStatus {
    pub fn reminder(&self, id: &str) -> Option<&ReminderStatus> {
        self.reminders.iter().find(|r| r.id == id)
    }
}
