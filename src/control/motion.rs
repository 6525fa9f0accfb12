//! Error → motion translation.
//!
//! Turns a centring error (AutoTrack) or a jog button (Manual) into a
//! [`MotionCommand`] for one axis.
//!
//! ## Sign convention
//!
//! Error is `centre - 0.5` on each axis, image coordinates (y grows
//! downward). A positive controller output maps to [`Direction::Forward`]:
//! face right of centre turns the pan axis forward, face below centre turns
//! the tilt axis forward. Jogs follow the same convention: `right` and
//! `down` are forward, `left` and `up` backward.
//!
//! ## Speed
//!
//! Inter-step delay is inversely proportional to |output| and clamped to
//! the configured bounds. Outputs below the floor produce no command, which
//! also keeps the inversion away from zero.

use core::time::Duration;

use crate::app::mode::Button;
use crate::config::SystemConfig;
use crate::drivers::stepper::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal (X), left/right.
    Pan,
    /// Vertical (Y), up/down.
    Tilt,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::Pan, Axis::Tilt];

    pub fn name(self) -> &'static str {
        match self {
            Self::Pan => "pan",
            Self::Tilt => "tilt",
        }
    }
}

/// One rotation intent for an axis worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionCommand {
    pub direction: Direction,
    /// Wait between half-steps.
    pub step_delay: Duration,
    /// How long to keep stepping.
    pub duration: Duration,
}

/// Rounding slack for errors computed as `centre - 0.5` in f32.
const DEAD_ZONE_SLACK: f32 = f32::EPSILON * 4.0;

/// Force errors inside `[-epsilon, epsilon]` to exactly zero.
///
/// The bound is inclusive up to f32 rounding: `0.55 - 0.5` lands a few ulps
/// above `0.05` and still counts as inside.
pub fn apply_dead_zone(error: f32, epsilon: f32) -> f32 {
    if error.abs() <= epsilon + DEAD_ZONE_SLACK { 0.0 } else { error }
}

/// Axis and direction driven by a jog button.
pub fn jog_target(button: Button) -> (Axis, Direction) {
    match button {
        Button::Up => (Axis::Tilt, Direction::Backward),
        Button::Down => (Axis::Tilt, Direction::Forward),
        Button::Left => (Axis::Pan, Direction::Backward),
        Button::Right => (Axis::Pan, Direction::Forward),
    }
}

/// Speed and duration limits derived from [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    output_floor: f32,
    step_delay_scale_us: f32,
    min_step_delay_us: u32,
    max_step_delay_us: u32,
    max_motion: Duration,
    jog_duration: Duration,
    jog_step_delay: Duration,
}

impl MotionProfile {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            output_floor: config.output_floor,
            step_delay_scale_us: config.step_delay_scale_us as f32,
            min_step_delay_us: config.min_step_delay_us,
            max_step_delay_us: config.max_step_delay_us,
            max_motion: Duration::from_millis(u64::from(config.max_motion_ms)),
            jog_duration: Duration::from_millis(u64::from(config.manual_duration_ms)),
            jog_step_delay: Duration::from_micros(u64::from(config.manual_step_delay_us)),
        }
    }

    /// Translate a PID output; `None` when the output is too small to act on.
    pub fn translate(&self, output: f32) -> Option<MotionCommand> {
        if !output.is_finite() {
            return None;
        }
        let magnitude = output.abs();
        if magnitude < self.output_floor {
            return None;
        }

        let delay_us = (self.step_delay_scale_us / magnitude)
            .clamp(self.min_step_delay_us as f32, self.max_step_delay_us as f32);

        Some(MotionCommand {
            direction: Direction::from_sign(output),
            step_delay: Duration::from_micros(delay_us.round() as u64),
            duration: self.max_motion,
        })
    }

    /// Fixed-speed, fixed-length jog for a manual button edge.
    pub fn jog(&self, direction: Direction) -> MotionCommand {
        MotionCommand {
            direction,
            step_delay: self.jog_step_delay,
            duration: self.jog_duration,
        }
    }
}
