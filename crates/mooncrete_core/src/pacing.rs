//! Tick throttles and phase countdowns.
//!
//! The outside world posts ticks as fast as it likes, each carrying a
//! monotonic millisecond timestamp. [`TickGate`] decides whether enough time
//! has passed for a subsystem to step, and [`PhaseClock`] counts the
//! seconds left in a timed phase.

use serde::{Deserialize, Serialize};

/// Milliseconds in one countdown second.
pub const MS_PER_SECOND: u64 = 1000;

/// Minimum-interval throttle keyed off the tick clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickGate {
    last_open: u64,
}

impl TickGate {
    /// Create a gate that opens once `interval` has passed since time zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { last_open: 0 }
    }

    /// Open the gate if more than `interval_ms` passed since it last opened.
    pub fn try_open(&mut self, now_ms: u64, interval_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_open) > interval_ms {
            self.last_open = now_ms;
            true
        } else {
            false
        }
    }

    /// Restart the interval from `now_ms`.
    pub fn reset(&mut self, now_ms: u64) {
        self.last_open = now_ms;
    }
}

/// What a countdown advance produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// Less than a second passed, or the phase is untimed.
    Idle,
    /// A second passed; this many remain.
    Second(u32),
    /// The countdown reached zero.
    Expired,
}

/// Countdown of whole seconds left in the current phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseClock {
    stopwatch: u64,
    time_left: u32,
    timed: bool,
}

impl PhaseClock {
    /// Create an idle clock.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stopwatch: 0,
            time_left: 0,
            timed: false,
        }
    }

    /// Restart the countdown. `None` makes the clock idle.
    pub fn reset(&mut self, seconds: Option<u32>, now_ms: u64) {
        self.stopwatch = now_ms;
        self.time_left = seconds.unwrap_or(0);
        self.timed = seconds.is_some();
    }

    /// Seconds remaining.
    #[must_use]
    pub const fn time_left(&self) -> u32 {
        self.time_left
    }

    /// Whether the current phase is timed.
    #[must_use]
    pub const fn is_timed(&self) -> bool {
        self.timed
    }

    /// Count down one second if a full second elapsed.
    pub fn advance(&mut self, now_ms: u64) -> ClockTick {
        if !self.timed || now_ms.saturating_sub(self.stopwatch) < MS_PER_SECOND {
            return ClockTick::Idle;
        }
        self.stopwatch = now_ms;
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.timed = false;
            ClockTick::Expired
        } else {
            ClockTick::Second(self.time_left)
        }
    }
}
