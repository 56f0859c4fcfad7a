//! Active alert bookkeeping.
//!
//! An id is in the active set from the moment it fires until it is
//! dismissed, and at most once. The displayed title and message are
//! frozen at fire time so later edits to the reminder do not rewrite an
//! alert that is already on screen.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::events::Event;
use crate::reminder::{MainReminderConfig, ReminderDefinition, ReminderKind, MAIN_ID};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSnapshot {
    pub title: String,
    pub message: String,
    pub kind: ReminderKind,
}

/// What is firing.
#[derive(Debug, Clone, Copy)]
pub enum AlertSource<'a> {
    Main(&'a MainReminderConfig),
    Custom(&'a ReminderDefinition),
}

impl AlertSource<'_> {
    fn id(&self) -> &str {
        match self {
            AlertSource::Main(_) => MAIN_ID,
            AlertSource::Custom(def) => def.id(),
        }
    }

    fn snapshot(&self) -> Option<NotificationSnapshot> {
        match self {
            AlertSource::Main(config) => config.can_fire().then(|| NotificationSnapshot {
                title: config.title.clone(),
                message: config.message(),
                kind: ReminderKind::Main,
            }),
            AlertSource::Custom(def) => Some(NotificationSnapshot {
                title: def.title().to_string(),
                message: custom_message(def),
                kind: def.kind(),
            }),
        }
    }
}

fn custom_message(def: &ReminderDefinition) -> String {
    match def {
        ReminderDefinition::Interval(r) => {
            format!("Every {} {}", r.interval_value, r.interval_unit.as_str())
        }
        ReminderDefinition::OneTime(_) => "Scheduled reminder".to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct AlertManager {
    active: IndexMap<String, NotificationSnapshot>,
    external_surface: bool,
}

impl AlertManager {
    /// `external_surface` selects `Notify` events; without a surface the
    /// manager asks for a local chime instead.
    pub fn new(external_surface: bool) -> Self {
        Self {
            active: IndexMap::new(),
            external_surface,
        }
    }

    pub fn set_external_surface(&mut self, attached: bool) {
        self.external_surface = attached;
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains_key(id)
    }

    /// Active ids in firing order.
    pub fn active_ids(&self) -> Vec<String> {
        self.active.keys().cloned().collect()
    }

    pub fn snapshot(&self, id: &str) -> Option<&NotificationSnapshot> {
        self.active.get(id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Record a fired alert and build the outbound event.
    ///
    /// Returns `None` when the id is already active or the main reminder
    /// is not allowed to fire.
    pub fn fire(&mut self, source: AlertSource<'_>, at: DateTime<Utc>) -> Option<Event> {
        let id = source.id().to_string();
        if self.active.contains_key(&id) {
            return None;
        }
        let snapshot = source.snapshot()?;
        info!(%id, title = %snapshot.title, "alert fired");

        let event = if self.external_surface {
            Event::Notify {
                id: id.clone(),
                title: snapshot.title.clone(),
                message: snapshot.message.clone(),
                kind: snapshot.kind,
                at,
            }
        } else {
            Event::Chime { id: id.clone(), at }
        };
        self.active.insert(id, snapshot);
        Some(event)
    }

    /// Drop an alert. Unknown ids are a no-op and return `None`.
    pub fn dismiss(&mut self, id: &str) -> Option<NotificationSnapshot> {
        let snapshot = self.active.shift_remove(id)?;
        info!(%id, "alert dismissed");
        Some(snapshot)
    }
}
