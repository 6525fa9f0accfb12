//! PID controller for one tracking axis
//!
//! Discrete proportional-integral-derivative controller fed once per
//! AutoTrack tick with the normalized centring error. The sample period is
//! folded into the gains, so the update is:
//!
//! ```text
//! integral   += error
//! derivative  = error - prev_error
//! output      = kp*error + ki*integral + kd*derivative
//! ```
//!
//! The output is not clamped here; the motion translation saturates it.

use crate::config::PidGains;

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    integral: f32,
    prev_error: f32,
    integral_limit: Option<f32>,
}

impl PidController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            kp: gains.kp,
            ki: gains.ki,
            kd: gains.kd,
            integral: 0.0,
            prev_error: 0.0,
            integral_limit: None,
        }
    }

    /// Bound the accumulated integral to `[-limit, limit]` (anti-windup).
    pub fn with_integral_limit(mut self, limit: Option<f32>) -> Self {
        self.integral_limit = limit.map(f32::abs);
        self
    }

    /// Feed one error sample and return the controller output.
    pub fn compute(&mut self, error: f32) -> f32 {
        self.integral += error;
        if let Some(limit) = self.integral_limit {
            self.integral = self.integral.clamp(-limit, limit);
        }

        let derivative = error - self.prev_error;
        self.prev_error = error;

        self.kp * error + self.ki * self.integral + self.kd * derivative
    }

    /// Current accumulated integral.
    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Reset controller state (re-home).
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }
}
