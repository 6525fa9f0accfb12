//! Host time adapters.
//!
//! - [`StdClock`]: monotonic microseconds from `std::time::Instant`.
//! - [`StdDelay`]: `embedded_hal::delay::DelayNs` via `thread::sleep`.
//!
//! Sub-millisecond sleeps on a desktop OS overshoot by tens of
//! microseconds; the stepper deadline loop tolerates that because it
//! re-reads the clock before every step.

use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

use crate::app::ports::MonotonicClock;

#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    start: Instant,
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl MonotonicClock for StdClock {
    fn now_us(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}
