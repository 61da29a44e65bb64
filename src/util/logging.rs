//! # Rate-Limited Logging
//!
//! A meter that keeps emitting corrupt telegrams would otherwise produce one
//! warning per telegram, several times a second, for days. `LogThrottle`
//! caps the number of messages per time window.

use std::time::Instant;

/// Throttling structure for rate-limiting log messages.
#[derive(Debug)]
pub struct LogThrottle {
    /// Time window for throttling (in milliseconds).
    window_ms: u64,
    /// Maximum messages allowed per window.
    cap: u32,
    /// Current message count in window.
    count: u32,
    /// Start time of current window.
    t0: Instant,
}

impl LogThrottle {
    /// Create new throttle with time window and message cap.
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window_ms,
            cap,
            count: 0,
            t0: Instant::now(),
        }
    }

    /// Check if logging is allowed (resets counter after window expires).
    pub fn allow(&mut self) -> bool {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.t0).as_millis() as u64;

        if elapsed_ms > self.window_ms {
            self.t0 = now;
            self.count = 0;
        }

        self.count += 1;
        self.count <= self.cap
    }

    /// Reset the throttle (start a new window immediately).
    pub fn reset(&mut self) {
        self.t0 = Instant::now();
        self.count = 0;
    }
}
