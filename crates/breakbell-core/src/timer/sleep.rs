//! Host suspension detection.
//!
//! Two independent signals, OR'd per tick:
//!
//! - the gap since the previous tick exceeds a threshold well above the
//!   poll period (the loop itself stalled), or
//! - an external resume signal arrived within the grace window.

#[derive(Debug, Clone)]
pub struct SleepDetector {
    gap_threshold_ms: i64,
    resume_grace_ms: i64,
    last_tick_ms: Option<i64>,
    resumed_at_ms: Option<i64>,
    last_gap_ms: Option<i64>,
}

impl SleepDetector {
    pub fn new(gap_threshold_ms: i64, resume_grace_ms: i64) -> Self {
        Self {
            gap_threshold_ms,
            resume_grace_ms,
            last_tick_ms: None,
            resumed_at_ms: None,
            last_gap_ms: None,
        }
    }

    /// Record a tick at `now_ms` and report whether the host possibly slept.
    pub fn observe(&mut self, now_ms: i64) -> bool {
        let gap = self.last_tick_ms.map(|last| now_ms.saturating_sub(last));
        self.last_tick_ms = Some(now_ms);
        self.last_gap_ms = gap;

        let stalled = gap.is_some_and(|g| g > self.gap_threshold_ms);

        let resumed = match self.resumed_at_ms {
            Some(at) if now_ms.saturating_sub(at) <= self.resume_grace_ms => true,
            Some(_) => {
                self.resumed_at_ms = None;
                false
            }
            None => false,
        };

        stalled || resumed
    }

    /// The power monitor reported a wake-up.
    pub fn record_resume(&mut self, now_ms: i64) {
        self.resumed_at_ms = Some(now_ms);
    }

    /// Gap measured by the most recent [`observe`](Self::observe).
    pub fn last_gap_ms(&self) -> Option<i64> {
        self.last_gap_ms
    }
}
