//! Work calendar: which moments count as active.

pub mod gate;
pub mod holidays;

pub use gate::{
    is_within_active_hours, work_mode_allows, ActiveHoursRange, CalendarGate, CalendarPolicy,
    WorkMode,
};
pub use holidays::{HolidayCache, HolidaySource, DEFAULT_HOLIDAY_URL};
