//! Digital input debouncer
//!
//! Samples an input at a fixed interval and reports a level only after it
//! has read identically N times in a row. Runs once at startup to sample
//! the mode-select button, so blocking until convergence is acceptable.

use embedded_hal_async::delay::DelayNs;

use crate::config::{DEBOUNCE_INTERVAL_MS, DEBOUNCE_MIN_STABLE};
use crate::traits::{DigitalInput, Level};

/// Debouncer for a single digital input
///
/// There is no upper time bound and no error path: a floating or stuck
/// input delays convergence, it never fails.
pub struct Debouncer<I, D> {
    input: I,
    delay: D,
    min_stable: u16,
}

impl<I: DigitalInput, D: DelayNs> Debouncer<I, D> {
    /// Create a debouncer with the default stable-count threshold
    pub fn new(input: I, delay: D) -> Self {
        Self::with_threshold(input, delay, DEBOUNCE_MIN_STABLE)
    }

    /// Create a debouncer with a custom stable-count threshold
    pub fn with_threshold(input: I, delay: D, min_stable: u16) -> Self {
        Self {
            input,
            delay,
            min_stable,
        }
    }

    /// Sample until the input has held one level for the threshold count,
    /// then return that level
    pub async fn read_stable_level(&mut self) -> Level {
        let mut stable_count: u16 = 0;
        let mut last: Option<Level> = None;

        loop {
            let level = self.input.level();

            match last {
                Some(prev) if prev == level => {
                    stable_count += 1;
                    if stable_count >= self.min_stable {
                        return level;
                    }
                }
                _ => stable_count = 0,
            }

            last = Some(level);
            self.delay.delay_ms(DEBOUNCE_INTERVAL_MS).await;
        }
    }

    /// Release the wrapped input
    pub fn release(self) -> I {
        self.input
    }
}
