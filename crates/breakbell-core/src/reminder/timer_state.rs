//! Derived countdown state, keyed by reminder id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Countdown of one reminder.
///
/// `end_time == None` means not counting down: disabled, already fired,
/// or not configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    /// Whole seconds left, as last displayed.
    pub time_left: u64,
    /// Deadline (epoch ms).
    pub end_time: Option<i64>,
}

impl TimerState {
    pub fn armed(end_time: i64, time_left: u64) -> Self {
        Self {
            time_left,
            end_time: Some(end_time),
        }
    }
}

/// All custom reminders' timer states. Rows outlive disabling and are
/// only dropped when the reminder itself is deleted.
#[derive(Debug, Clone, Default)]
pub struct TimerStore {
    states: HashMap<String, TimerState>,
}

impl TimerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&TimerState> {
        self.states.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.states.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn set(&mut self, id: &str, state: TimerState) {
        self.states.insert(id.to_string(), state);
    }

    /// Stop counting but keep the row.
    pub fn disarm(&mut self, id: &str) {
        if let Some(state) = self.states.get_mut(id) {
            state.end_time = None;
        }
    }

    /// Write `time_left` only when it differs. Returns whether it changed.
    pub fn update_time_left(&mut self, id: &str, secs: u64) -> bool {
        match self.states.get_mut(id) {
            Some(state) if state.time_left != secs => {
                state.time_left = secs;
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<TimerState> {
        self.states.remove(id)
    }

    /// Drop rows whose id is not in `keep`.
    pub fn retain_ids<'a>(&mut self, keep: impl IntoIterator<Item = &'a str>) {
        let keep: std::collections::HashSet<&str> = keep.into_iter().collect();
        self.states.retain(|id, _| keep.contains(id.as_str()));
    }
}
