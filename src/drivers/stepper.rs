//! Unipolar stepper driver (ULN2003 + 28BYJ-48), half-step sequencing.
//!
//! Walks the four coil pins of one axis through an 8-row half-step table.
//! Forward and backward motion read the same table in opposite index
//! order; there is no separate reverse table.
//!
//! ## Ownership contract
//!
//! A [`StepSequencer`] owns its GPIO port and its [`CoilPins`] by value.
//! Exactly one axis worker holds each sequencer, so no two contexts ever
//! write to the same coil pins.
//!
//! ## Timing
//!
//! The inter-step wait goes through an `embedded_hal::delay::DelayNs`, and
//! elapsed time is read from a [`MonotonicClock`]. Both are injected so the
//! deadline loop can be driven by a simulated clock in tests.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::app::ports::{GpioPort, Level, MonotonicClock, PinMode};
use crate::error::ActuatorError;
use crate::pins::CoilPins;

/// Half-step commutation order, one row per coil pattern (IN1..IN4).
pub const HALF_STEP_TABLE: [[u8; 4]; 8] = [
    [1, 0, 0, 0],
    [1, 1, 0, 0],
    [0, 1, 0, 0],
    [0, 1, 1, 0],
    [0, 0, 1, 0],
    [0, 0, 1, 1],
    [0, 0, 0, 1],
    [1, 0, 0, 1],
];

/// Number of rows in [`HALF_STEP_TABLE`].
pub const PHASES: u8 = HALF_STEP_TABLE.len() as u8;

/// A zero inter-step delay is promoted to this floor.
const MIN_STEP_DELAY: Duration = Duration::from_micros(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Increasing table index, positive step count.
    Forward,
    /// Decreasing table index, negative step count.
    Backward,
}

impl Direction {
    /// Direction selected by the sign of a controller output.
    pub fn from_sign(value: f32) -> Self {
        if value < 0.0 {
            Self::Backward
        } else {
            Self::Forward
        }
    }
}

pub struct StepSequencer<G, D, C> {
    gpio: G,
    delay: D,
    clock: C,
    pins: CoilPins,
    position: u8,
    step_count: i64,
    driving: bool,
}

impl<G, D, C> StepSequencer<G, D, C>
where
    G: GpioPort,
    D: DelayNs,
    C: MonotonicClock,
{
    pub fn new(gpio: G, delay: D, clock: C, pins: CoilPins) -> Self {
        Self {
            gpio,
            delay,
            clock,
            pins,
            position: 0,
            step_count: 0,
            driving: false,
        }
    }

    /// Advance one half-step and energize the coils of the new row.
    pub fn step(&mut self, direction: Direction) -> Result<(), ActuatorError> {
        let (position, delta) = match direction {
            Direction::Forward => ((self.position + 1) % PHASES, 1),
            Direction::Backward => ((self.position + PHASES - 1) % PHASES, -1),
        };
        self.write_row(position)?;
        self.position = position;
        self.step_count += delta;
        Ok(())
    }

    /// Take exactly `steps` half-steps, waiting `step_delay` between them.
    ///
    /// Returns the elapsed wall-clock time in milliseconds. Negative step
    /// counts are rejected before any pin is touched.
    pub fn rotate_by_steps(
        &mut self,
        steps: i32,
        step_delay: Duration,
        direction: Direction,
    ) -> Result<u64, ActuatorError> {
        if steps < 0 {
            return Err(ActuatorError::InvalidStepCount(steps));
        }
        let start_us = self.clock.now_us();
        let delay_ns = delay_ns(step_delay);

        for i in 0..steps {
            self.step(direction)?;
            if i + 1 < steps {
                self.delay.delay_ns(delay_ns);
            }
        }

        Ok(self.clock.now_us().saturating_sub(start_us) / 1000)
    }

    /// Step repeatedly until `duration` has elapsed; returns the step count.
    ///
    /// The deadline is checked before every step, so the final step can
    /// overshoot by at most one `step_delay`.
    pub fn rotate_for_duration(
        &mut self,
        duration: Duration,
        step_delay: Duration,
        direction: Direction,
    ) -> Result<u32, ActuatorError> {
        if duration.is_zero() {
            return Ok(0);
        }
        let start_us = self.clock.now_us();
        let window_us = duration.as_micros() as u64;
        let delay_ns = delay_ns(step_delay);
        let mut steps = 0u32;

        while self.clock.now_us().saturating_sub(start_us) < window_us {
            self.step(direction)?;
            steps += 1;
            self.delay.delay_ns(delay_ns);
        }

        debug!("stepper {}: {} steps {:?}", self.pins, steps, direction);
        Ok(steps)
    }

    /// Put the coil pins in output mode and re-assert the current row.
    pub fn start_drive(&mut self) -> Result<(), ActuatorError> {
        for pin in self.pins.as_array() {
            self.gpio.set_mode(pin, PinMode::Output)?;
        }
        self.write_row(self.position)?;
        self.driving = true;
        Ok(())
    }

    /// Release the coils (pins to high-impedance input). Always safe.
    pub fn stop_drive(&mut self) -> Result<(), ActuatorError> {
        self.driving = false;
        let mut result = Ok(());
        for pin in self.pins.as_array() {
            if let Err(e) = self.gpio.set_mode(pin, PinMode::Input) {
                result = Err(e);
            }
        }
        result
    }

    pub fn reset_count(&mut self) {
        self.step_count = 0;
    }

    /// Signed cumulative step count since construction or the last reset.
    pub fn count(&self) -> i64 {
        self.step_count
    }

    /// Current row index into [`HALF_STEP_TABLE`], always in `0..8`.
    pub fn position(&self) -> u8 {
        self.position
    }

    pub fn is_driving(&self) -> bool {
        self.driving
    }

    pub fn pins(&self) -> CoilPins {
        self.pins
    }

    // ── Internal ──────────────────────────────────────────────

    fn write_row(&mut self, position: u8) -> Result<(), ActuatorError> {
        let row = HALF_STEP_TABLE[position as usize];
        for (pin, bit) in self.pins.as_array().into_iter().zip(row) {
            let level = if bit == 1 { Level::High } else { Level::Low };
            self.gpio.set_level(pin, level)?;
        }
        Ok(())
    }
}

fn delay_ns(step_delay: Duration) -> u32 {
    let d = step_delay.max(MIN_STEP_DELAY);
    u32::try_from(d.as_nanos()).unwrap_or(u32::MAX)
}
