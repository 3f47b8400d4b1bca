//! Gapless playback schedule
//!
//! Buffers are chained on a watermark: each one starts at
//! `max(now, watermark)` and pushes the watermark forward by its length.
//! Bursts that arrive faster than real time therefore play back-to-back in
//! arrival order.

use std::time::Duration;

/// Playback watermark bookkeeping.
///
/// Times are offsets on the output device clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackSchedule {
    watermark: Duration,
}

impl PlaybackSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a slot for a buffer of `length` and return its start time.
    pub fn schedule(&mut self, now: Duration, length: Duration) -> Duration {
        let start = now.max(self.watermark);
        self.watermark = start + length;
        start
    }

    /// End time of the last scheduled buffer
    pub fn watermark(&self) -> Duration {
        self.watermark
    }

    /// True once the clock has reached the end of everything scheduled
    pub fn is_drained(&self, now: Duration) -> bool {
        now >= self.watermark
    }

    /// Time left until the schedule drains
    pub fn remaining(&self, now: Duration) -> Duration {
        self.watermark.saturating_sub(now)
    }
}
