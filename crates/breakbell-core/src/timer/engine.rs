//! Reminder scheduling engine.
//!
//! The engine is a wall-clock-driven state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()`
//! periodically (about every 100 ms).
//!
//! ## One tick
//!
//! 1. Detect a possible host sleep (stalled loop or recent resume signal).
//! 2. Apply the calendar gate to the main reminder and advance it.
//! 3. Advance every enabled custom reminder. Due interval reminders are
//!    re-anchored on their previous deadline; due one-time reminders fire
//!    once, or are dropped when they were missed.
//! 4. Only after all timers are computed, write back definitions, drop
//!    missed reminders and fire alerts.
//!
//! A due timer alerts only when the tick is neither a possible sleep nor
//! severely overdue. Otherwise the occurrence is skipped silently.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = ReminderEngine::new(setup, CalendarGate::default(), Local::now());
//! // In a loop:
//! let outcome = engine.tick();
//! for event in outcome.events { /* forward */ }
//! if outcome.definitions_changed { /* persist engine.reminders() */ }
//! ```

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::anchor::next_anchor;
use super::main_timer::{AppStatus, Countdown, MainTimer};
use super::sleep::SleepDetector;
use crate::alerts::{AlertManager, AlertSource};
use crate::calendar::{CalendarGate, CalendarPolicy};
use crate::error::ValidationError;
use crate::events::Event;
use crate::reminder::{
    ceil_secs, MainReminderConfig, ReminderDefinition, TimerState, TimerStore, MAIN_ID,
};
use crate::status::{EngineStatus, MainStatus, ReminderStatus};

/// Timing constants. The overdue tolerances are small grace periods, not
/// meaningful values in themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineTuning {
    pub poll_interval_ms: u64,
    /// A tick gap above this means the loop stalled.
    pub sleep_gap_ms: i64,
    /// Ticks this soon after a resume signal count as possibly slept.
    pub resume_grace_ms: i64,
    /// Custom reminders this late are skipped instead of alerting.
    pub custom_overdue_ms: i64,
    /// Main reminder this late is skipped instead of alerting.
    pub main_overdue_ms: i64,
    /// Main reminder that showed more than this much time on the previous
    /// tick and is due now jumped, and is skipped.
    pub main_jump_ms: i64,
    /// A rescheduled deadline must be strictly further ahead than this.
    pub reschedule_lead_ms: i64,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            sleep_gap_ms: 1_000,
            resume_grace_ms: 10_000,
            custom_overdue_ms: 3_000,
            main_overdue_ms: 10_000,
            main_jump_ms: 5_000,
            reschedule_lead_ms: 1_000,
        }
    }
}

/// Everything the settings store supplies at startup.
#[derive(Debug, Clone, Default)]
pub struct EngineSetup {
    pub tuning: EngineTuning,
    pub main: MainReminderConfig,
    pub active_hours_enabled: bool,
    pub policy: CalendarPolicy,
    pub reminders: Vec<ReminderDefinition>,
    pub external_surface: bool,
}

/// Result of a tick or a command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutcome {
    pub events: Vec<Event>,
    /// The definition set changed and should be persisted.
    pub definitions_changed: bool,
    /// The tick was treated as a possible host sleep.
    pub slept: bool,
}

#[derive(Debug, Clone)]
pub struct ReminderEngine {
    tuning: EngineTuning,
    main_config: MainReminderConfig,
    main: MainTimer,
    gate: CalendarGate,
    active_hours_enabled: bool,
    policy: CalendarPolicy,
    reminders: Vec<ReminderDefinition>,
    timers: TimerStore,
    sleep: SleepDetector,
    alerts: AlertManager,
    /// Events produced outside a tick, delivered with the next one.
    pending: Vec<Event>,
    dirty: bool,
}

impl ReminderEngine {
    pub fn new(setup: EngineSetup, gate: CalendarGate, now: DateTime<Local>) -> Self {
        let now_ms = now.timestamp_millis();
        let mut engine = Self {
            sleep: SleepDetector::new(setup.tuning.sleep_gap_ms, setup.tuning.resume_grace_ms),
            tuning: setup.tuning,
            main: MainTimer::new(&setup.main),
            main_config: setup.main,
            gate,
            active_hours_enabled: setup.active_hours_enabled,
            policy: setup.policy,
            reminders: Vec::new(),
            timers: TimerStore::new(),
            alerts: AlertManager::new(setup.external_surface),
            pending: Vec::new(),
            dirty: false,
        };

        for def in setup.reminders {
            if engine.position(def.id()).is_some() {
                warn!(id = def.id(), "duplicate reminder id ignored");
                engine.dirty = true;
                continue;
            }
            if let Err(e) = def.validate() {
                warn!("reminder will not be scheduled: {e}");
            }
            engine.reminders.push(def);
        }
        for idx in 0..engine.reminders.len() {
            engine.arm_reminder(idx, now_ms, false);
        }

        if engine.main_config.auto_start {
            if let Some(event) = engine.start(now) {
                engine.pending.push(event);
            }
        }
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn tuning(&self) -> &EngineTuning {
        &self.tuning
    }

    pub fn main_config(&self) -> &MainReminderConfig {
        &self.main_config
    }

    pub fn main_status(&self) -> AppStatus {
        self.main.status()
    }

    pub fn main_time_left(&self) -> u64 {
        self.main.time_left()
    }

    pub fn policy(&self) -> &CalendarPolicy {
        &self.policy
    }

    pub fn active_hours_enabled(&self) -> bool {
        self.active_hours_enabled
    }

    /// The authoritative definition set, for persistence.
    pub fn reminders(&self) -> &[ReminderDefinition] {
        &self.reminders
    }

    pub fn reminder(&self, id: &str) -> Option<&ReminderDefinition> {
        self.reminders.iter().find(|d| d.id() == id)
    }

    pub fn timer(&self, id: &str) -> Option<&TimerState> {
        self.timers.get(id)
    }

    pub fn alerts(&self) -> &AlertManager {
        &self.alerts
    }

    pub fn is_alert_active(&self, id: &str) -> bool {
        self.alerts.is_active(id)
    }

    /// Read-only projection for display.
    pub fn status(&self) -> EngineStatus {
        let reminders = self
            .reminders
            .iter()
            .map(|def| ReminderStatus {
                id: def.id().to_string(),
                title: def.title().to_string(),
                time_left: self.timers.get(def.id()).map(|s| s.time_left).unwrap_or(0),
                total_time: def.period_ms().map(|ms| ceil_secs(ms) as u64),
                enabled: def.enabled(),
                kind: def.kind(),
                target_date_time: def.target_date_time(),
                alert_active: self.alerts.is_active(def.id()),
            })
            .collect();

        EngineStatus {
            main: MainStatus {
                status: self.main.status(),
                time_left: self.main.time_left(),
                total_time: self.main_config.total_secs(),
            },
            reminders,
            active_alerts: self.alerts.active_ids(),
        }
    }

    // ── Main reminder commands ───────────────────────────────────────

    /// Start the main countdown from `Idle` (or `Paused`).
    pub fn start(&mut self, now: DateTime<Local>) -> Option<Event> {
        let before = self.main.status();
        match before {
            AppStatus::Idle | AppStatus::Paused => {
                if self.active_hours_enabled && !self.gate_open(now) {
                    self.main.enter_waiting(&self.main_config);
                } else {
                    self.main.begin(&self.main_config, now.timestamp_millis());
                }
            }
            AppStatus::Running | AppStatus::Waiting | AppStatus::AlertActive => return None,
        }
        self.status_event(before, now)
    }

    /// Manual pause. Only available while the calendar gate is off.
    pub fn pause(&mut self, now: DateTime<Local>) -> Option<Event> {
        if self.active_hours_enabled {
            return None;
        }
        let before = self.main.status();
        self.main.pause(now.timestamp_millis());
        self.status_event(before, now)
    }

    pub fn resume(&mut self, now: DateTime<Local>) -> Option<Event> {
        if self.active_hours_enabled {
            return None;
        }
        let before = self.main.status();
        self.main.resume(&self.main_config, now.timestamp_millis());
        self.status_event(before, now)
    }

    pub fn toggle(&mut self, now: DateTime<Local>) -> Option<Event> {
        match self.main.status() {
            AppStatus::Running => self.pause(now),
            AppStatus::Paused => self.resume(now),
            AppStatus::Idle => self.start(now),
            AppStatus::Waiting | AppStatus::AlertActive => None,
        }
    }

    /// Restart the configured countdown from now.
    pub fn reset(&mut self, now: DateTime<Local>) -> Option<Event> {
        let before = self.main.status();
        match before {
            AppStatus::Running | AppStatus::Paused | AppStatus::Idle => {
                if self.active_hours_enabled && !self.gate_open(now) {
                    self.main.enter_waiting(&self.main_config);
                } else {
                    self.main.begin(&self.main_config, now.timestamp_millis());
                }
            }
            AppStatus::Waiting | AppStatus::AlertActive => return None,
        }
        self.status_event(before, now)
    }

    /// The power monitor reported that the host woke up.
    pub fn on_system_resume(&mut self, now: DateTime<Local>) {
        info!("system resume reported");
        self.sleep.record_resume(now.timestamp_millis());
    }

    // ── Tick ─────────────────────────────────────────────────────────

    pub fn tick(&mut self) -> EngineOutcome {
        self.tick_at(Local::now())
    }

    pub fn tick_at(&mut self, now: DateTime<Local>) -> EngineOutcome {
        let now_ms = now.timestamp_millis();
        let slept = self.sleep.observe(now_ms);
        if slept {
            debug!(gap_ms = ?self.sleep.last_gap_ms(), "possible sleep, due alerts suppressed");
        }

        let mut events = std::mem::take(&mut self.pending);
        self.tick_main(now, slept, &mut events);
        self.tick_reminders(now, slept, &mut events);

        EngineOutcome {
            events,
            definitions_changed: std::mem::take(&mut self.dirty),
            slept,
        }
    }

    fn tick_main(&mut self, now: DateTime<Local>, slept: bool, events: &mut Vec<Event>) {
        let now_ms = now.timestamp_millis();
        let before = self.main.status();
        if self.active_hours_enabled {
            self.apply_gate(now);
        }

        let shown_ms = (self.main.time_left() as i64).saturating_mul(1000);
        let mut notify = None;
        if let Countdown::Due {
            end_time,
            period_ms,
        } = self.main.countdown(&self.main_config, now_ms)
        {
            let overdue = now_ms.saturating_sub(end_time);
            let severe = overdue > self.tuning.main_overdue_ms || shown_ms > self.tuning.main_jump_ms;
            if !slept && !severe {
                notify = self
                    .alerts
                    .fire(AlertSource::Main(&self.main_config), now.with_timezone(&Utc));
            }
            match notify {
                Some(_) => self.main.fire(),
                None => {
                    if let Some(next) =
                        next_anchor(end_time, period_ms, now_ms, self.tuning.reschedule_lead_ms)
                    {
                        debug!(overdue, next, "main reminder occurrence skipped");
                        self.main.reschedule(next, now_ms);
                    }
                }
            }
        }

        events.extend(self.status_event(before, now));
        events.extend(notify);
    }

    fn tick_reminders(&mut self, now: DateTime<Local>, slept: bool, events: &mut Vec<Event>) {
        let now_ms = now.timestamp_millis();
        let lead = self.tuning.reschedule_lead_ms;
        let mut rescheduled: Vec<(String, i64)> = Vec::new();
        let mut missed: Vec<String> = Vec::new();
        let mut due: Vec<String> = Vec::new();

        // Compute phase: timer state only.
        for def in &self.reminders {
            let id = def.id();
            let Some(end) = self.timers.get(id).and_then(|s| s.end_time) else {
                continue;
            };
            if !def.enabled() {
                self.timers.disarm(id);
                continue;
            }

            let remaining = ceil_secs(end.saturating_sub(now_ms));
            if remaining > 0 {
                self.timers.update_time_left(id, remaining as u64);
                continue;
            }

            let overdue = now_ms.saturating_sub(end);
            let should_alert = !slept && overdue <= self.tuning.custom_overdue_ms;
            match def {
                ReminderDefinition::Interval(_) => {
                    match def.period_ms().and_then(|p| next_anchor(end, p, now_ms, lead)) {
                        Some(next) => {
                            let left = ceil_secs(next.saturating_sub(now_ms)).max(0) as u64;
                            self.timers.set(id, TimerState::armed(next, left));
                            rescheduled.push((id.to_string(), next));
                        }
                        None => self.timers.disarm(id),
                    }
                    if should_alert {
                        due.push(id.to_string());
                    } else {
                        debug!(%id, overdue, "interval occurrence skipped");
                    }
                }
                ReminderDefinition::OneTime(_) => {
                    if should_alert {
                        self.timers.set(id, TimerState::default());
                        due.push(id.to_string());
                    } else {
                        missed.push(id.to_string());
                    }
                }
            }
        }

        // Apply phase: definitions and alerts.
        for (id, next) in rescheduled {
            if let Some(ReminderDefinition::Interval(r)) =
                self.reminders.iter_mut().find(|d| d.id() == id)
            {
                r.next_trigger_time = Some(next);
                self.dirty = true;
            }
        }

        for id in missed {
            info!(%id, "one-time reminder missed, removed");
            self.remove_definition(&id);
        }

        let at = now.with_timezone(&Utc);
        for id in due {
            if let Some(def) = self.reminders.iter().find(|d| d.id() == id) {
                events.extend(self.alerts.fire(AlertSource::Custom(def), at));
            }
        }
    }

    // ── Alert lifecycle ──────────────────────────────────────────────

    /// Acknowledge an alert.
    ///
    /// Unknown or already dismissed ids are a no-op. A spent one-time
    /// reminder is deleted. Dismissing the main alert resumes its
    /// countdown, or waits when the calendar gate is closed. The
    /// outbound `Dismiss` is suppressed when the surface itself asked.
    pub fn dismiss(&mut self, id: &str, from_external: bool, now: DateTime<Local>) -> EngineOutcome {
        let mut outcome = EngineOutcome::default();
        if self.alerts.dismiss(id).is_none() {
            return outcome;
        }
        let now_ms = now.timestamp_millis();

        if id == MAIN_ID {
            let before = self.main.status();
            if before == AppStatus::AlertActive {
                if self.active_hours_enabled && !self.gate_open(now) {
                    self.main.enter_waiting(&self.main_config);
                } else {
                    self.main.begin(&self.main_config, now_ms);
                }
            }
            outcome.events.extend(self.status_event(before, now));
        } else if matches!(
            self.reminder(id),
            Some(ReminderDefinition::OneTime(r)) if r.target_date_time <= now_ms
        ) {
            self.remove_definition(id);
        }

        if !from_external {
            outcome.events.push(Event::Dismiss {
                id: id.to_string(),
                at: now.with_timezone(&Utc),
            });
        }
        outcome.definitions_changed = std::mem::take(&mut self.dirty);
        outcome
    }

    // ── Definition management ────────────────────────────────────────

    /// Add a reminder or replace the one with the same id.
    ///
    /// The countdown restarts when the schedule changed or the reminder
    /// was re-enabled. Disabling stops the countdown but keeps its row.
    pub fn upsert_reminder(
        &mut self,
        def: ReminderDefinition,
        now: DateTime<Local>,
    ) -> Result<EngineOutcome, ValidationError> {
        def.validate()?;
        let now_ms = now.timestamp_millis();

        match self.position(def.id()) {
            Some(idx) => {
                let old = std::mem::replace(&mut self.reminders[idx], def);
                let new = &self.reminders[idx];
                let id = new.id().to_string();
                let reshaped = old.shape() != new.shape();
                let re_enabled = !old.enabled() && new.enabled();

                if !new.enabled() {
                    self.timers.disarm(&id);
                } else if reshaped || re_enabled || !self.timers.contains(&id) {
                    self.arm_reminder(idx, now_ms, true);
                } else if let ReminderDefinition::Interval(r) = &mut self.reminders[idx] {
                    // Title-only edit: keep the running deadline.
                    if let Some(end) = self.timers.get(&id).and_then(|s| s.end_time) {
                        r.next_trigger_time = Some(end);
                    }
                }
            }
            None => {
                self.reminders.push(def);
                self.arm_reminder(self.reminders.len() - 1, now_ms, false);
            }
        }

        self.dirty = true;
        Ok(self.command_outcome())
    }

    pub fn set_reminder_enabled(
        &mut self,
        id: &str,
        enabled: bool,
        now: DateTime<Local>,
    ) -> Result<EngineOutcome, ValidationError> {
        let mut def = self
            .reminder(id)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownReminder(id.to_string()))?;
        if def.enabled() == enabled {
            return Ok(EngineOutcome::default());
        }
        def.set_enabled(enabled);
        self.upsert_reminder(def, now)
    }

    /// Delete a reminder and its timer row; an outstanding alert for it is
    /// dismissed.
    pub fn delete_reminder(
        &mut self,
        id: &str,
        now: DateTime<Local>,
    ) -> Result<EngineOutcome, ValidationError> {
        if self.remove_definition(id).is_none() {
            return Err(ValidationError::UnknownReminder(id.to_string()));
        }
        let mut outcome = self.command_outcome();
        if self.alerts.dismiss(id).is_some() {
            outcome.events.push(Event::Dismiss {
                id: id.to_string(),
                at: now.with_timezone(&Utc),
            });
        }
        Ok(outcome)
    }

    /// Swap in a whole definition set from the settings store.
    ///
    /// Validated up front; on error nothing changes.
    pub fn replace_reminders(
        &mut self,
        defs: Vec<ReminderDefinition>,
        now: DateTime<Local>,
    ) -> Result<EngineOutcome, ValidationError> {
        let mut order = std::collections::HashMap::new();
        for (idx, def) in defs.iter().enumerate() {
            def.validate()?;
            if order.insert(def.id().to_string(), idx).is_some() {
                return Err(ValidationError::DuplicateId(def.id().to_string()));
            }
        }

        let mut outcome = EngineOutcome::default();
        let stale: Vec<String> = self
            .reminders
            .iter()
            .map(|d| d.id().to_string())
            .filter(|id| !order.contains_key(id))
            .collect();
        for id in stale {
            outcome.events.extend(self.delete_reminder(&id, now)?.events);
        }
        for def in defs {
            outcome.events.extend(self.upsert_reminder(def, now)?.events);
        }
        self.reminders
            .sort_by_key(|d| order.get(d.id()).copied().unwrap_or(usize::MAX));
        self.timers.retain_ids(self.reminders.iter().map(|d| d.id()));

        outcome.definitions_changed = true;
        self.dirty = false;
        Ok(outcome)
    }

    /// New main reminder settings. A changed interval, or message text
    /// appearing or disappearing, restarts a running countdown.
    pub fn set_main_config(&mut self, config: MainReminderConfig, now: DateTime<Local>) {
        let restart = config.period_ms() != self.main_config.period_ms()
            || config.has_message() != self.main_config.has_message();
        self.main_config = config;
        if restart {
            self.main.reconfigure(&self.main_config, now.timestamp_millis());
        }
    }

    /// New calendar settings, applied to the main reminder right away.
    pub fn set_calendar_policy(
        &mut self,
        active_hours_enabled: bool,
        policy: CalendarPolicy,
        now: DateTime<Local>,
    ) -> Result<Option<Event>, ValidationError> {
        policy.validate()?;
        self.policy = policy;
        self.active_hours_enabled = active_hours_enabled;

        let before = self.main.status();
        if active_hours_enabled {
            self.apply_gate(now);
        } else if before == AppStatus::Waiting {
            self.main.begin(&self.main_config, now.timestamp_millis());
        }
        Ok(self.status_event(before, now))
    }

    pub fn set_external_surface(&mut self, attached: bool) {
        self.alerts.set_external_surface(attached);
    }

    /// Bring the engine in line with a freshly loaded settings store.
    ///
    /// Everything is validated before anything changes. Running
    /// countdowns survive edits that leave their schedule alone. Tuning
    /// only takes effect at construction.
    pub fn apply_setup(
        &mut self,
        setup: EngineSetup,
        now: DateTime<Local>,
    ) -> Result<EngineOutcome, ValidationError> {
        setup.policy.validate()?;
        let mut outcome = self.replace_reminders(setup.reminders, now)?;
        self.set_main_config(setup.main, now);
        outcome.events.extend(self.set_calendar_policy(
            setup.active_hours_enabled,
            setup.policy,
            now,
        )?);
        self.set_external_surface(setup.external_surface);
        Ok(outcome)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn position(&self, id: &str) -> Option<usize> {
        self.reminders.iter().position(|d| d.id() == id)
    }

    fn remove_definition(&mut self, id: &str) -> Option<ReminderDefinition> {
        let idx = self.position(id)?;
        self.timers.remove(id);
        self.dirty = true;
        Some(self.reminders.remove(idx))
    }

    fn command_outcome(&mut self) -> EngineOutcome {
        EngineOutcome {
            events: Vec::new(),
            definitions_changed: std::mem::take(&mut self.dirty),
            slept: false,
        }
    }

    fn gate_open(&self, now: DateTime<Local>) -> bool {
        self.gate.is_active_at(&self.policy, now.naive_local())
    }

    /// Calendar transitions for the main reminder. An outstanding alert
    /// is never overridden.
    fn apply_gate(&mut self, now: DateTime<Local>) {
        let open = self.gate_open(now);
        match (self.main.status(), open) {
            (AppStatus::Running | AppStatus::Idle | AppStatus::Paused, false) => {
                self.main.enter_waiting(&self.main_config)
            }
            (AppStatus::Waiting, true) => {
                self.main.begin(&self.main_config, now.timestamp_millis())
            }
            (AppStatus::Paused, true) => {
                self.main.resume(&self.main_config, now.timestamp_millis());
            }
            _ => {}
        }
    }

    fn status_event(&self, before: AppStatus, now: DateTime<Local>) -> Option<Event> {
        let after = self.main.status();
        (before != after).then(|| {
            info!(from = ?before, to = ?after, "main reminder status changed");
            Event::StatusChanged {
                from: before,
                to: after,
                at: now.with_timezone(&Utc),
            }
        })
    }

    /// (Re)derive the timer row for `self.reminders[idx]`.
    ///
    /// `fresh` restarts an interval from now; otherwise a stored
    /// `next_trigger_time` is honoured.
    fn arm_reminder(&mut self, idx: usize, now_ms: i64, fresh: bool) {
        let def = &mut self.reminders[idx];
        let id = def.id().to_string();
        if !def.enabled() {
            if self.timers.contains(&id) {
                self.timers.disarm(&id);
            } else {
                self.timers.set(&id, TimerState::default());
            }
            return;
        }

        let period = def.period_ms();
        let end = match def {
            ReminderDefinition::Interval(r) => {
                let Some(period) = period else {
                    self.timers.set(&id, TimerState::default());
                    return;
                };
                let end = match r.next_trigger_time {
                    Some(stored) if !fresh => Some(stored),
                    _ => now_ms.checked_add(period),
                };
                let Some(end) = end else {
                    warn!(%id, "interval too long to schedule");
                    self.timers.set(&id, TimerState::default());
                    return;
                };
                if r.next_trigger_time != Some(end) {
                    r.next_trigger_time = Some(end);
                    self.dirty = true;
                }
                end
            }
            ReminderDefinition::OneTime(r) => r.target_date_time,
        };
        let left = ceil_secs(end.saturating_sub(now_ms)).max(0) as u64;
        self.timers.set(&id, TimerState::armed(end, left));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::HolidayCache;
    use crate::reminder::{IntervalReminder, IntervalUnit, OneTimeReminder};
    use chrono::TimeZone;

    const BASE: i64 = 1_717_400_000_000;

    fn at_ms(ms: i64) -> DateTime<Local> {
        Local.timestamp_millis_opt(ms).unwrap()
    }

    fn main_config(seconds: f64) -> MainReminderConfig {
        MainReminderConfig {
            interval_value: Some(seconds),
            interval_unit: IntervalUnit::Seconds,
            title: "Break".into(),
            message_lead: "Stand up".into(),
            message_tail: String::new(),
            auto_start: true,
        }
    }

    fn interval(id: &str, seconds: f64) -> ReminderDefinition {
        ReminderDefinition::Interval(IntervalReminder {
            id: id.into(),
            title: id.into(),
            enabled: true,
            interval_value: seconds,
            interval_unit: IntervalUnit::Seconds,
            next_trigger_time: None,
        })
    }

    fn engine_with(reminders: Vec<ReminderDefinition>) -> ReminderEngine {
        let setup = EngineSetup {
            main: main_config(600.0),
            reminders,
            external_surface: true,
            ..EngineSetup::default()
        };
        ReminderEngine::new(setup, CalendarGate::new(HolidayCache::new()), at_ms(BASE))
    }

    /// Tick every 100 ms from `from` to `to` inclusive, collecting events.
    fn run(engine: &mut ReminderEngine, from: i64, to: i64) -> Vec<Event> {
        let mut events = Vec::new();
        let mut t = from;
        while t <= to {
            events.extend(engine.tick_at(at_ms(t)).events);
            t += 100;
        }
        events
    }

    fn notified(events: &[Event], id: &str) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, Event::Notify { id: n, .. } if n == id))
            .count()
    }

    #[test]
    fn auto_start_reports_running() {
        let mut engine = engine_with(Vec::new());
        assert_eq!(engine.main_status(), AppStatus::Running);
        let events = engine.tick_at(at_ms(BASE)).events;
        assert!(matches!(
            events.first(),
            Some(Event::StatusChanged {
                from: AppStatus::Idle,
                to: AppStatus::Running,
                ..
            })
        ));
    }

    #[test]
    fn interval_fires_once_and_reanchors() {
        let mut engine = engine_with(vec![interval("water", 5.0)]);
        let events = run(&mut engine, BASE, BASE + 5_000);
        assert_eq!(notified(&events, "water"), 1);
        assert_eq!(engine.timer("water").unwrap().end_time, Some(BASE + 10_000));
        match engine.reminder("water") {
            Some(ReminderDefinition::Interval(r)) => {
                assert_eq!(r.next_trigger_time, Some(BASE + 10_000))
            }
            other => panic!("Expected interval, got {other:?}"),
        }
    }

    #[test]
    fn active_alert_is_not_duplicated() {
        let mut engine = engine_with(vec![interval("water", 2.0)]);
        let events = run(&mut engine, BASE, BASE + 6_000);
        assert_eq!(notified(&events, "water"), 1);
        assert!(engine.is_alert_active("water"));
    }

    #[test]
    fn main_fires_and_dismiss_restarts() {
        let setup = EngineSetup {
            main: main_config(3.0),
            external_surface: true,
            ..EngineSetup::default()
        };
        let mut engine =
            ReminderEngine::new(setup, CalendarGate::new(HolidayCache::new()), at_ms(BASE));
        let events = run(&mut engine, BASE, BASE + 3_000);
        assert_eq!(notified(&events, MAIN_ID), 1);
        assert_eq!(engine.main_status(), AppStatus::AlertActive);

        // Stays alerted while ticks continue.
        run(&mut engine, BASE + 3_100, BASE + 9_000);
        assert_eq!(engine.main_status(), AppStatus::AlertActive);

        let outcome = engine.dismiss(MAIN_ID, false, at_ms(BASE + 9_000));
        assert_eq!(engine.main_status(), AppStatus::Running);
        assert_eq!(engine.main_time_left(), 3);
        assert!(outcome
            .events
            .iter()
            .any(|e| matches!(e, Event::Dismiss { id, .. } if id == MAIN_ID)));
    }

    #[test]
    fn dismiss_from_surface_does_not_echo() {
        let mut engine = engine_with(vec![interval("water", 1.0)]);
        run(&mut engine, BASE, BASE + 1_000);
        let outcome = engine.dismiss("water", true, at_ms(BASE + 1_100));
        assert!(outcome.events.is_empty());
        assert!(!engine.is_alert_active("water"));
    }

    #[test]
    fn pause_only_without_gate() {
        let mut engine = engine_with(Vec::new());
        assert!(engine.pause(at_ms(BASE + 1_000)).is_some());
        assert_eq!(engine.main_status(), AppStatus::Paused);
        assert!(engine.toggle(at_ms(BASE + 2_000)).is_some());
        assert_eq!(engine.main_status(), AppStatus::Running);

        engine
            .set_calendar_policy(true, CalendarPolicy::default(), at_ms(BASE + 3_000))
            .unwrap();
        assert!(engine.pause(at_ms(BASE + 3_100)).is_none());
        assert_eq!(engine.main_status(), AppStatus::Running);
    }

    #[test]
    fn disable_keeps_row_and_reenable_restarts() {
        let mut engine = engine_with(vec![interval("water", 10.0)]);
        run(&mut engine, BASE, BASE + 4_000);
        engine
            .set_reminder_enabled("water", false, at_ms(BASE + 4_000))
            .unwrap();
        let row = engine.timer("water").unwrap();
        assert_eq!(row.end_time, None);

        run(&mut engine, BASE + 4_100, BASE + 20_000);
        engine
            .set_reminder_enabled("water", true, at_ms(BASE + 20_000))
            .unwrap();
        assert_eq!(engine.timer("water").unwrap().end_time, Some(BASE + 30_000));
    }

    #[test]
    fn reshaping_restarts_countdown() {
        let mut engine = engine_with(vec![interval("water", 10.0)]);
        run(&mut engine, BASE, BASE + 4_000);
        engine
            .upsert_reminder(interval("water", 20.0), at_ms(BASE + 4_000))
            .unwrap();
        assert_eq!(engine.timer("water").unwrap().end_time, Some(BASE + 24_000));
    }

    #[test]
    fn title_edit_keeps_deadline() {
        let mut engine = engine_with(vec![interval("water", 10.0)]);
        run(&mut engine, BASE, BASE + 4_000);
        let mut edited = interval("water", 10.0);
        if let ReminderDefinition::Interval(r) = &mut edited {
            r.title = "Hydrate".into();
        }
        engine.upsert_reminder(edited, at_ms(BASE + 4_000)).unwrap();
        assert_eq!(engine.timer("water").unwrap().end_time, Some(BASE + 10_000));
        assert_eq!(engine.reminder("water").unwrap().title(), "Hydrate");
    }

    #[test]
    fn enabling_bad_interval_is_rejected() {
        let mut bad = interval("water", 0.0);
        bad.set_enabled(false);
        let mut engine = engine_with(vec![bad]);
        let err = engine
            .set_reminder_enabled("water", true, at_ms(BASE))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidInterval { .. }));
        assert!(!engine.reminder("water").unwrap().enabled());
    }

    #[test]
    fn delete_drops_row_and_alert() {
        let mut engine = engine_with(vec![interval("water", 1.0)]);
        run(&mut engine, BASE, BASE + 1_000);
        assert!(engine.is_alert_active("water"));

        let outcome = engine.delete_reminder("water", at_ms(BASE + 1_100)).unwrap();
        assert!(outcome.definitions_changed);
        assert!(engine.timer("water").is_none());
        assert!(!engine.is_alert_active("water"));
        assert!(engine.delete_reminder("water", at_ms(BASE + 1_200)).is_err());
    }

    #[test]
    fn replace_rejects_duplicates_atomically() {
        let mut engine = engine_with(vec![interval("water", 10.0)]);
        let err = engine
            .replace_reminders(vec![interval("a", 1.0), interval("a", 2.0)], at_ms(BASE))
            .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateId("a".into()));
        assert!(engine.reminder("water").is_some());

        engine
            .replace_reminders(vec![interval("tea", 60.0)], at_ms(BASE))
            .unwrap();
        assert!(engine.reminder("water").is_none());
        assert!(engine.timer("water").is_none());
        assert!(engine.timer("tea").is_some());
    }

    #[test]
    fn replace_follows_store_order() {
        let mut engine = engine_with(vec![interval("water", 10.0), interval("tea", 20.0)]);
        run(&mut engine, BASE, BASE + 4_000);
        engine
            .replace_reminders(
                vec![interval("walk", 30.0), interval("tea", 20.0), interval("water", 10.0)],
                at_ms(BASE + 4_000),
            )
            .unwrap();
        let ids: Vec<&str> = engine.reminders().iter().map(|d| d.id()).collect();
        assert_eq!(ids, ["walk", "tea", "water"]);
        let status = engine.status();
        let rows: Vec<&str> = status.reminders.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(rows, ["walk", "tea", "water"]);
        // Unchanged schedules keep running.
        assert_eq!(engine.timer("water").unwrap().end_time, Some(BASE + 10_000));
    }

    #[test]
    fn overflowing_interval_is_left_unarmed() {
        let mut engine = engine_with(vec![interval("forever", 9.223371e15)]);
        assert!(engine.reminder("forever").unwrap().validate().is_ok());
        assert_eq!(engine.timer("forever").unwrap().end_time, None);

        let events = run(&mut engine, BASE, BASE + 2_000);
        assert_eq!(notified(&events, "forever"), 0);

        let setup = EngineSetup {
            main: main_config(9.223371e15),
            external_surface: true,
            ..EngineSetup::default()
        };
        let mut engine =
            ReminderEngine::new(setup, CalendarGate::new(HolidayCache::new()), at_ms(BASE));
        let events = run(&mut engine, BASE, BASE + 2_000);
        assert_eq!(notified(&events, MAIN_ID), 0);
        assert_eq!(engine.main_status(), AppStatus::Running);
        assert_eq!(engine.main_time_left(), 0);
    }

    #[test]
    fn apply_setup_merges_store_edits() {
        let mut engine = engine_with(vec![interval("water", 10.0)]);
        run(&mut engine, BASE, BASE + 4_000);

        let mut renamed = interval("water", 10.0);
        if let ReminderDefinition::Interval(r) = &mut renamed {
            r.title = "Hydrate".into();
        }
        let setup = EngineSetup {
            main: main_config(600.0),
            reminders: vec![renamed, interval("tea", 20.0)],
            external_surface: false,
            ..EngineSetup::default()
        };
        let outcome = engine.apply_setup(setup, at_ms(BASE + 4_000)).unwrap();
        assert!(outcome.definitions_changed);
        assert_eq!(engine.reminder("water").unwrap().title(), "Hydrate");
        assert_eq!(engine.timer("water").unwrap().end_time, Some(BASE + 10_000));
        assert_eq!(engine.timer("tea").unwrap().end_time, Some(BASE + 24_000));

        // No surface attached any more: the next alert chimes.
        let events = run(&mut engine, BASE + 4_100, BASE + 10_000);
        assert_eq!(notified(&events, "water"), 0);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Chime { id, .. } if id == "water")));
    }

    #[test]
    fn apply_setup_rejects_bad_policy_untouched() {
        let mut engine = engine_with(vec![interval("water", 10.0)]);
        let mut policy = CalendarPolicy::default();
        policy.active_hours.push(crate::calendar::ActiveHoursRange {
            start: "9am".into(),
            end: "17:00".into(),
        });
        let setup = EngineSetup {
            main: main_config(600.0),
            active_hours_enabled: true,
            policy,
            ..EngineSetup::default()
        };
        assert!(engine.apply_setup(setup, at_ms(BASE)).is_err());
        assert!(engine.reminder("water").is_some());
        assert!(!engine.active_hours_enabled());
    }

    #[test]
    fn stored_next_trigger_time_is_honoured() {
        let mut def = interval("water", 60.0);
        if let ReminderDefinition::Interval(r) = &mut def {
            r.next_trigger_time = Some(BASE + 15_000);
        }
        let engine = engine_with(vec![def]);
        let row = engine.timer("water").unwrap();
        assert_eq!(row.end_time, Some(BASE + 15_000));
        assert_eq!(row.time_left, 15);
    }

    #[test]
    fn status_projection() {
        let one_time = ReminderDefinition::OneTime(OneTimeReminder {
            id: "call".into(),
            title: "Call".into(),
            enabled: true,
            target_date_time: BASE + 90_000,
        });
        let engine = engine_with(vec![interval("water", 30.0), one_time]);
        let status = engine.status();
        assert_eq!(status.main.status, AppStatus::Running);
        assert_eq!(status.main.total_time, 600);

        let water = status.reminder("water").unwrap();
        assert_eq!(water.total_time, Some(30));
        assert_eq!(water.time_left, 30);

        let call = status.reminder("call").unwrap();
        assert_eq!(call.total_time, None);
        assert_eq!(call.time_left, 90);
        assert_eq!(call.target_date_time, Some(BASE + 90_000));
    }
}
