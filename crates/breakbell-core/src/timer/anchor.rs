//! Anchor-based rescheduling for periodic timers.
//!
//! The next deadline is the previous deadline plus a whole number of
//! periods, never `now + period`. Waking up late therefore keeps the
//! reminder on its original phase instead of drifting by the sleep
//! length on every cycle.

/// Smallest `prev_end + k * period` (k >= 1) strictly greater than
/// `now + lead`.
///
/// Returns `None` for a non-positive period, which would never advance.
pub fn next_anchor(prev_end: i64, period: i64, now: i64, lead: i64) -> Option<i64> {
    if period <= 0 {
        return None;
    }
    let horizon = now.saturating_add(lead.max(0));
    let steps = if horizon < prev_end {
        1
    } else {
        // floor((horizon - prev_end) / period) + 1 periods lands past the horizon.
        (horizon - prev_end) / period + 1
    };
    prev_end.checked_add(steps.checked_mul(period)?)
}
