mod definition;
mod timer_state;

pub use definition::{
    ceil_secs, period_ms, IntervalReminder, IntervalUnit, MainReminderConfig, OneTimeReminder,
    ReminderDefinition, ReminderKind, ScheduleShape, MAIN_ID,
};
pub use timer_state::{TimerState, TimerStore};
