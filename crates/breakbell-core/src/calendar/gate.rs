//! Calendar gate: decides whether a moment is an active work moment.
//!
//! Two gates must both hold:
//!
//! - **Day gate**: the work-mode rule for the weekday, vetoed by the
//!   holiday cache when `skip_holidays` is set.
//! - **Hours gate**: the time of day falls inside one of the active-hours
//!   ranges. An empty range list means no restriction.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use super::holidays::HolidayCache;
use crate::error::ValidationError;

/// Weekly policy deciding which days are eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkMode {
    #[default]
    Everyday,
    /// Alternating weeks: Saturday is a work day only on big weeks.
    BigSmall,
    Weekend,
}

/// A time-of-day window. `end <= start` crosses midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveHoursRange {
    /// "HH:MM"
    pub start: String,
    /// "HH:MM"
    pub end: String,
}

impl ActiveHoursRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Check both boundaries parse as `HH:MM`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for value in [&self.start, &self.end] {
            if minute_of_day(value).is_none() {
                return Err(ValidationError::InvalidTimeOfDay(value.clone()));
            }
        }
        Ok(())
    }

    /// Whether `minute` (0..1440) falls inside this range.
    ///
    /// Returns `false` for malformed boundaries.
    pub fn contains_minute(&self, minute: u32) -> bool {
        let (Some(start), Some(end)) = (minute_of_day(&self.start), minute_of_day(&self.end))
        else {
            return false;
        };
        if end <= start {
            minute >= start || minute < end
        } else {
            minute >= start && minute < end
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarPolicy {
    #[serde(default)]
    pub work_mode: WorkMode,
    #[serde(default)]
    pub is_big_week: bool,
    #[serde(default)]
    pub skip_holidays: bool,
    #[serde(default)]
    pub active_hours: Vec<ActiveHoursRange>,
}

impl Default for CalendarPolicy {
    fn default() -> Self {
        Self {
            work_mode: WorkMode::Everyday,
            is_big_week: false,
            skip_holidays: false,
            active_hours: Vec::new(),
        }
    }
}

impl CalendarPolicy {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.active_hours.iter().try_for_each(ActiveHoursRange::validate)
    }
}

/// Parse "HH:MM" into minutes since midnight.
pub fn minute_of_day(value: &str) -> Option<u32> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .ok()
        .map(|t| t.hour() * 60 + t.minute())
}

/// Whether `now` falls inside any of `ranges`. Empty means always.
pub fn is_within_active_hours(now: NaiveTime, ranges: &[ActiveHoursRange]) -> bool {
    if ranges.is_empty() {
        return true;
    }
    let minute = now.hour() * 60 + now.minute();
    ranges.iter().any(|r| r.contains_minute(minute))
}

/// Work-mode rule for a weekday, ignoring holidays and hours.
pub fn work_mode_allows(policy: &CalendarPolicy, weekday: Weekday) -> bool {
    match policy.work_mode {
        WorkMode::Everyday => true,
        WorkMode::Weekend => matches!(weekday, Weekday::Sat | Weekday::Sun),
        WorkMode::BigSmall => match weekday {
            Weekday::Sun => false,
            Weekday::Sat => policy.is_big_week,
            _ => true,
        },
    }
}

/// "YYYY-MM-DD" key used by the holiday cache.
pub fn date_key(now: &NaiveDateTime) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Evaluates a [`CalendarPolicy`] against the clock and the holiday cache.
#[derive(Debug, Clone)]
pub struct CalendarGate {
    holidays: HolidayCache,
}

impl Default for CalendarGate {
    fn default() -> Self {
        Self::new(HolidayCache::global().clone())
    }
}

impl CalendarGate {
    pub fn new(holidays: HolidayCache) -> Self {
        Self { holidays }
    }

    /// Evaluate the policy at a given local wall-clock time.
    ///
    /// When holidays are skipped and the year is not cached yet, a
    /// background refill is requested. Until it lands the day counts as
    /// a regular day.
    pub fn is_active_at(&self, policy: &CalendarPolicy, now: NaiveDateTime) -> bool {
        if policy.skip_holidays {
            self.holidays.ensure_year(now.year(), now.month());
            if self.holidays.is_off_day(&date_key(&now)) {
                return false;
            }
        }

        if !work_mode_allows(policy, now.weekday()) {
            return false;
        }

        is_within_active_hours(now.time(), &policy.active_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day(y: i32, mo: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn gate() -> CalendarGate {
        CalendarGate::new(HolidayCache::new())
    }

    #[test]
    fn split_day_ranges() {
        let ranges = vec![
            ActiveHoursRange::new("09:00", "12:00"),
            ActiveHoursRange::new("13:00", "18:00"),
        ];
        assert!(is_within_active_hours(at(10, 0), &ranges));
        assert!(!is_within_active_hours(at(12, 30), &ranges));
        assert!(is_within_active_hours(at(14, 0), &ranges));
        assert!(!is_within_active_hours(at(20, 0), &ranges));
    }

    #[test]
    fn range_end_is_exclusive() {
        let ranges = vec![ActiveHoursRange::new("09:00", "12:00")];
        assert!(is_within_active_hours(at(9, 0), &ranges));
        assert!(is_within_active_hours(at(11, 59), &ranges));
        assert!(!is_within_active_hours(at(12, 0), &ranges));
    }

    #[test]
    fn cross_midnight_range() {
        let ranges = vec![ActiveHoursRange::new("22:00", "06:00")];
        assert!(is_within_active_hours(at(23, 0), &ranges));
        assert!(is_within_active_hours(at(2, 0), &ranges));
        assert!(!is_within_active_hours(at(10, 0), &ranges));
    }

    #[test]
    fn empty_ranges_mean_always_active() {
        assert!(is_within_active_hours(at(3, 33), &[]));
    }

    #[test]
    fn malformed_range_never_matches() {
        let range = ActiveHoursRange::new("9am", "17:00");
        assert!(!range.contains_minute(600));
        assert_eq!(
            range.validate(),
            Err(ValidationError::InvalidTimeOfDay("9am".into()))
        );
    }

    #[test]
    fn big_small_week_saturday() {
        let mut policy = CalendarPolicy {
            work_mode: WorkMode::BigSmall,
            ..CalendarPolicy::default()
        };
        // 2024-06-01 is a Saturday, 2024-06-02 a Sunday.
        let sat = day(2024, 6, 1, 10);
        let sun = day(2024, 6, 2, 10);
        let mon = day(2024, 6, 3, 10);

        assert!(!gate().is_active_at(&policy, sat));
        assert!(!gate().is_active_at(&policy, sun));
        assert!(gate().is_active_at(&policy, mon));

        policy.is_big_week = true;
        assert!(gate().is_active_at(&policy, sat));
        assert!(!gate().is_active_at(&policy, sun));
    }

    #[test]
    fn weekend_mode_only_weekends() {
        let policy = CalendarPolicy {
            work_mode: WorkMode::Weekend,
            ..CalendarPolicy::default()
        };
        assert!(gate().is_active_at(&policy, day(2024, 6, 1, 10)));
        assert!(gate().is_active_at(&policy, day(2024, 6, 2, 10)));
        assert!(!gate().is_active_at(&policy, day(2024, 6, 4, 10)));
    }

    #[test]
    fn holiday_blocks_when_skipping() {
        let cache = HolidayCache::new();
        cache.merge_year(2024, ["2024-06-10".to_string()]);
        let gate = CalendarGate::new(cache);
        let mut policy = CalendarPolicy {
            skip_holidays: true,
            ..CalendarPolicy::default()
        };
        assert!(!gate.is_active_at(&policy, day(2024, 6, 10, 10)));
        assert!(gate.is_active_at(&policy, day(2024, 6, 11, 10)));

        policy.skip_holidays = false;
        assert!(gate.is_active_at(&policy, day(2024, 6, 10, 10)));
    }

    #[test]
    fn both_gates_must_hold() {
        let policy = CalendarPolicy {
            work_mode: WorkMode::BigSmall,
            active_hours: vec![ActiveHoursRange::new("09:00", "18:00")],
            ..CalendarPolicy::default()
        };
        assert!(gate().is_active_at(&policy, day(2024, 6, 3, 10)));
        assert!(!gate().is_active_at(&policy, day(2024, 6, 3, 20)));
        assert!(!gate().is_active_at(&policy, day(2024, 6, 2, 10)));
    }

    #[test]
    fn work_mode_serializes_kebab_case() {
        let json = serde_json::to_string(&WorkMode::BigSmall).unwrap();
        assert_eq!(json, "\"big-small\"");
    }
}
