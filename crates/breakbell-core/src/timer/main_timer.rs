//! The built-in break reminder's countdown and status.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -(start)-> Running -(fires)-> AlertActive -(dismiss)-> Running | Waiting
//! Running -(pause)-> Paused -(resume)-> Running
//! Running | Idle <-(calendar gate)-> Waiting
//! ```
//!
//! The timer only tracks state. Deciding whether a due deadline alerts
//! or is skipped belongs to the engine.

use serde::{Deserialize, Serialize};

use crate::reminder::{ceil_secs, MainReminderConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppStatus {
    Idle,
    Running,
    Paused,
    /// Outside active hours; counting resumes when the gate opens.
    Waiting,
    /// Fired and not yet dismissed.
    AlertActive,
}

/// What a running main timer looks like at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// Not running, or configured but mute.
    Inert,
    Counting { remaining_secs: u64 },
    Due { end_time: i64, period_ms: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainTimer {
    status: AppStatus,
    time_left: u64,
    end_time: Option<i64>,
}

impl MainTimer {
    pub fn new(config: &MainReminderConfig) -> Self {
        Self {
            status: AppStatus::Idle,
            time_left: config.total_secs(),
            end_time: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> AppStatus {
        self.status
    }

    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    pub fn end_time(&self) -> Option<i64> {
        self.end_time
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Enter `Running` with a fresh countdown from `now_ms`.
    pub fn begin(&mut self, config: &MainReminderConfig, now_ms: i64) {
        self.status = AppStatus::Running;
        self.arm(config, now_ms);
    }

    /// Outside active hours: stop and show the full duration.
    pub fn enter_waiting(&mut self, config: &MainReminderConfig) {
        self.status = AppStatus::Waiting;
        self.end_time = None;
        self.time_left = config.total_secs();
    }

    pub fn pause(&mut self, now_ms: i64) -> bool {
        if self.status != AppStatus::Running {
            return false;
        }
        if let Some(end) = self.end_time.take() {
            self.time_left = ceil_secs(end.saturating_sub(now_ms)).max(0) as u64;
        }
        self.status = AppStatus::Paused;
        true
    }

    /// Continue from the time left at pause.
    pub fn resume(&mut self, config: &MainReminderConfig, now_ms: i64) -> bool {
        if self.status != AppStatus::Paused {
            return false;
        }
        self.status = AppStatus::Running;
        let end = (self.time_left as i64)
            .checked_mul(1000)
            .and_then(|left_ms| now_ms.checked_add(left_ms));
        match end {
            Some(end) if self.time_left > 0 && config.can_fire() => self.end_time = Some(end),
            _ => self.arm(config, now_ms),
        }
        true
    }

    pub fn fire(&mut self) {
        self.status = AppStatus::AlertActive;
        self.end_time = None;
        self.time_left = 0;
    }

    /// Move the deadline to an already computed anchor.
    pub fn reschedule(&mut self, next_end: i64, now_ms: i64) {
        self.end_time = Some(next_end);
        self.time_left = ceil_secs(next_end.saturating_sub(now_ms)).max(0) as u64;
    }

    /// Configuration changed: refresh the display and, when running,
    /// restart the countdown.
    pub fn reconfigure(&mut self, config: &MainReminderConfig, now_ms: i64) {
        match self.status {
            AppStatus::Running => self.arm(config, now_ms),
            AppStatus::Idle | AppStatus::Waiting => {
                self.end_time = None;
                self.time_left = config.total_secs();
            }
            AppStatus::Paused | AppStatus::AlertActive => {}
        }
    }

    /// Evaluate the countdown at `now_ms`.
    ///
    /// Without a valid interval the display is zero; with an interval but
    /// no message text it is pinned at the full duration. Neither counts.
    /// A period too long to add to the clock counts as no interval.
    pub fn countdown(&mut self, config: &MainReminderConfig, now_ms: i64) -> Countdown {
        if self.status != AppStatus::Running {
            return Countdown::Inert;
        }
        let Some(period_ms) = config.period_ms() else {
            self.end_time = None;
            self.time_left = 0;
            return Countdown::Inert;
        };
        if !config.has_message() {
            self.end_time = None;
            self.time_left = config.total_secs();
            return Countdown::Inert;
        }

        let end_time = match self.end_time {
            Some(end) => end,
            None => match now_ms.checked_add(period_ms) {
                Some(end) => *self.end_time.insert(end),
                None => {
                    self.time_left = 0;
                    return Countdown::Inert;
                }
            },
        };
        let remaining = ceil_secs(end_time.saturating_sub(now_ms));
        if remaining > 0 {
            let remaining_secs = remaining as u64;
            if self.time_left != remaining_secs {
                self.time_left = remaining_secs;
            }
            Countdown::Counting { remaining_secs }
        } else {
            Countdown::Due {
                end_time,
                period_ms,
            }
        }
    }

    fn arm(&mut self, config: &MainReminderConfig, now_ms: i64) {
        let period = config.period_ms().filter(|_| config.has_message());
        match period.map(|p| now_ms.checked_add(p)) {
            Some(Some(end)) => {
                self.end_time = Some(end);
                self.time_left = config.total_secs();
            }
            Some(None) => {
                self.end_time = None;
                self.time_left = 0;
            }
            None => {
                self.end_time = None;
                self.time_left = config.total_secs();
            }
        }
    }
}
