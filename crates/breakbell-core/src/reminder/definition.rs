//! Reminder definitions as supplied by the settings store.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Id of the built-in break reminder.
pub const MAIN_ID: &str = "main";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Seconds,
    #[default]
    Minutes,
    Hours,
}

impl IntervalUnit {
    pub fn millis(self) -> i64 {
        match self {
            IntervalUnit::Seconds => 1_000,
            IntervalUnit::Minutes => 60_000,
            IntervalUnit::Hours => 3_600_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IntervalUnit::Seconds => "seconds",
            IntervalUnit::Minutes => "minutes",
            IntervalUnit::Hours => "hours",
        }
    }
}

/// Period in milliseconds, or `None` unless `value` is finite and positive.
///
/// Sub-millisecond periods are rejected too so rescheduling always
/// advances.
pub fn period_ms(value: f64, unit: IntervalUnit) -> Option<i64> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    let ms = (value * unit.millis() as f64).round();
    (ms >= 1.0 && ms < i64::MAX as f64).then_some(ms as i64)
}

/// Which kind of reminder an alert or status row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    Main,
    Interval,
    OneTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalReminder {
    pub id: String,
    pub title: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub interval_value: f64,
    #[serde(default)]
    pub interval_unit: IntervalUnit,
    /// Next scheduled fire time (epoch ms), kept current by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_trigger_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneTimeReminder {
    pub id: String,
    pub title: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Fire time (epoch ms).
    pub target_date_time: i64,
}

/// A user-defined reminder. The tag is the only discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReminderDefinition {
    Interval(IntervalReminder),
    OneTime(OneTimeReminder),
}

/// The parts of a definition that decide when it fires.
///
/// A change here means the derived timer state must be recomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduleShape {
    Interval { value: f64, unit: IntervalUnit },
    OneTime { target: i64 },
}

impl ReminderDefinition {
    pub fn id(&self) -> &str {
        match self {
            ReminderDefinition::Interval(r) => &r.id,
            ReminderDefinition::OneTime(r) => &r.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ReminderDefinition::Interval(r) => &r.title,
            ReminderDefinition::OneTime(r) => &r.title,
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            ReminderDefinition::Interval(r) => r.enabled,
            ReminderDefinition::OneTime(r) => r.enabled,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        match self {
            ReminderDefinition::Interval(r) => r.enabled = enabled,
            ReminderDefinition::OneTime(r) => r.enabled = enabled,
        }
    }

    pub fn kind(&self) -> ReminderKind {
        match self {
            ReminderDefinition::Interval(_) => ReminderKind::Interval,
            ReminderDefinition::OneTime(_) => ReminderKind::OneTime,
        }
    }

    /// Period for interval reminders; `None` for one-time or invalid ones.
    pub fn period_ms(&self) -> Option<i64> {
        match self {
            ReminderDefinition::Interval(r) => period_ms(r.interval_value, r.interval_unit),
            ReminderDefinition::OneTime(_) => None,
        }
    }

    pub fn target_date_time(&self) -> Option<i64> {
        match self {
            ReminderDefinition::OneTime(r) => Some(r.target_date_time),
            ReminderDefinition::Interval(_) => None,
        }
    }

    pub fn shape(&self) -> ScheduleShape {
        match self {
            ReminderDefinition::Interval(r) => ScheduleShape::Interval {
                value: r.interval_value,
                unit: r.interval_unit,
            },
            ReminderDefinition::OneTime(r) => ScheduleShape::OneTime {
                target: r.target_date_time,
            },
        }
    }

    /// Reject definitions the scheduler cannot run.
    ///
    /// A disabled interval reminder may carry a bad period; it has to be
    /// fixed before it is enabled.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let id = self.id();
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if id == MAIN_ID {
            return Err(ValidationError::ReservedId(id.to_string()));
        }
        if let ReminderDefinition::Interval(r) = self {
            if r.enabled && self.period_ms().is_none() {
                return Err(ValidationError::InvalidInterval {
                    id: r.id.clone(),
                    value: r.interval_value,
                });
            }
        }
        Ok(())
    }
}

/// Settings of the built-in break reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReminderConfig {
    /// Unset, empty or unparsable values mean "not configured".
    #[serde(default, deserialize_with = "lenient_number")]
    pub interval_value: Option<f64>,
    #[serde(default)]
    pub interval_unit: IntervalUnit,
    #[serde(default = "default_main_title")]
    pub title: String,
    #[serde(default)]
    pub message_lead: String,
    #[serde(default)]
    pub message_tail: String,
    /// Start counting as soon as the engine is created.
    #[serde(default = "default_true")]
    pub auto_start: bool,
}

impl Default for MainReminderConfig {
    fn default() -> Self {
        Self {
            interval_value: Some(45.0),
            interval_unit: IntervalUnit::Minutes,
            title: default_main_title(),
            message_lead: "Time to stand up".into(),
            message_tail: "and rest your eyes.".into(),
            auto_start: true,
        }
    }
}

impl MainReminderConfig {
    pub fn period_ms(&self) -> Option<i64> {
        self.interval_value.and_then(|v| period_ms(v, self.interval_unit))
    }

    /// Configured duration in whole seconds, 0 when not configured.
    pub fn total_secs(&self) -> u64 {
        self.period_ms().map(|ms| ceil_secs(ms) as u64).unwrap_or(0)
    }

    /// Both fragments, trimmed and joined by a space.
    pub fn message(&self) -> String {
        [self.message_lead.trim(), self.message_tail.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn has_message(&self) -> bool {
        !self.message().is_empty()
    }

    /// Allowed to count down and fire.
    pub fn can_fire(&self) -> bool {
        self.period_ms().is_some() && self.has_message()
    }
}

/// `ceil(ms / 1000)`, correct for negative values.
pub fn ceil_secs(ms: i64) -> i64 {
    -(ms.saturating_neg().div_euclid(1000))
}

fn default_true() -> bool {
    true
}

fn default_main_title() -> String {
    "Break time".into()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<NumberOrText>::deserialize(deserializer).unwrap_or(None);
    Ok(match raw {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().parse::<f64>().ok(),
        None => None,
    })
}
