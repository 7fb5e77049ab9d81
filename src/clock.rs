//! Tick Clock
//!
//! Fresh timestamp samples at three resolutions, each truncated to `i32`.
//! Truncation wraps silently and the three resolutions are not kept
//! consistent with one another.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Tick source for compiled programs.
///
/// The microsecond and nanosecond ticks count from the moment this value was
/// created, so the epoch is per instance: two clocks made at different times
/// report different tick bases. Copies share their original's epoch. The
/// millisecond tick is wall-clock time and is the same for every instance.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Wall-clock milliseconds since the Unix epoch, truncated to 32 bits.
    pub fn ticks_ms(&self) -> i32 {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        millis as i32
    }

    /// Monotonic microseconds since this clock was created, truncated to 32 bits.
    pub fn ticks_us(&self) -> i32 {
        self.origin.elapsed().as_micros() as i32
    }

    /// Monotonic nanoseconds since this clock was created, truncated to 32 bits.
    ///
    /// Wraps roughly every 4.3 seconds.
    pub fn ticks_ns(&self) -> i32 {
        self.origin.elapsed().as_nanos() as i32
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
