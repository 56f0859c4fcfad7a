//! # Breakbell Core Library
//!
//! This library provides the core logic for Breakbell, a break reminder
//! that keeps a built-in "stand up" reminder plus any number of custom
//! interval and one-time reminders on schedule across host sleep and
//! calendar rules. The `breakbell` CLI is a thin host over it.
//!
//! ## Architecture
//!
//! - **Reminder Engine**: A wall-clock-driven state machine that requires
//!   the caller to periodically invoke `tick()`
//! - **Calendar**: Work-mode, holiday and active-hours gating, with a
//!   process-wide holiday cache filled in the background
//! - **Alerts**: At most one outstanding alert per reminder, dismissed by
//!   id
//! - **Storage**: TOML-based configuration holding the reminder
//!   definitions
//!
//! ## Key Components
//!
//! - [`ReminderEngine`]: Core scheduling state machine
//! - [`CalendarGate`]: Active-moment evaluation
//! - [`HolidayCache`]: Off-day lookup by date
//! - [`Config`]: Application configuration management

pub mod alerts;
pub mod calendar;
pub mod error;
pub mod events;
pub mod reminder;
pub mod status;
pub mod storage;
pub mod timer;

pub use alerts::{AlertManager, AlertSource, NotificationSnapshot};
pub use calendar::{
    ActiveHoursRange, CalendarGate, CalendarPolicy, HolidayCache, HolidaySource, WorkMode,
};
pub use error::{ConfigError, CoreError, HolidayError, ValidationError};
pub use events::Event;
pub use reminder::{
    IntervalReminder, IntervalUnit, MainReminderConfig, OneTimeReminder, ReminderDefinition,
    ReminderKind, TimerState, TimerStore, MAIN_ID,
};
pub use status::{EngineStatus, MainStatus, ReminderStatus};
pub use storage::Config;
pub use timer::{AppStatus, EngineOutcome, EngineSetup, EngineTuning, ReminderEngine};
