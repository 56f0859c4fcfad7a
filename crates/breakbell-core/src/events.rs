use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reminder::ReminderKind;
use crate::timer::AppStatus;

/// Everything the engine tells the outside world.
///
/// `Notify` and `Dismiss` are the messages for the notification surface;
/// the host forwards them. `Chime` replaces `Notify` when no surface is
/// attached. `StatusChanged` tracks the main reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Notify {
        id: String,
        title: String,
        message: String,
        kind: ReminderKind,
        at: DateTime<Utc>,
    },
    Dismiss {
        id: String,
        at: DateTime<Utc>,
    },
    /// Play the local audio cue for an alert.
    Chime {
        id: String,
        at: DateTime<Utc>,
    },
    StatusChanged {
        from: AppStatus,
        to: AppStatus,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Whether this message is meant for the notification surface.
    pub fn is_outbound(&self) -> bool {
        matches!(self, Event::Notify { .. } | Event::Dismiss { .. })
    }
}
