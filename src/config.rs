//! System configuration parameters
//!
//! All tunable parameters for the FaceTrack rig. The three PID gains have no
//! defaults: they must come from the external key=value source or startup
//! fails. Everything else has a default that optional keys may override.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// PID gains shared by both axes, loaded once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

/// Core timing and tuning configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Timing ---
    /// Control loop tick period (milliseconds)
    pub tick_interval_ms: u32,
    /// Frame capture period (milliseconds)
    pub capture_period_ms: u32,
    /// Telemetry report interval (control ticks)
    pub telemetry_interval_ticks: u32,

    // --- Camera ---
    /// Raw BGR frame width (pixels)
    pub frame_width: u32,
    /// Raw BGR frame height (pixels)
    pub frame_height: u32,
    /// Detections scoring below this are ignored (0-1)
    pub min_detection_score: f32,

    // --- Tracking ---
    /// Horizontal dead zone around the centre (normalized units)
    pub dead_zone_x: f32,
    /// Vertical dead zone around the centre (normalized units)
    pub dead_zone_y: f32,
    /// PID outputs with smaller magnitude produce no motion
    pub output_floor: f32,
    /// Clamp on the accumulated PID integral; `None` leaves it unbounded
    pub integral_limit: Option<f32>,

    // --- Motion ---
    /// Inter-step delay at |output| = 1 (microseconds); scales as 1/|output|
    pub step_delay_scale_us: u32,
    /// Fastest allowed inter-step delay (microseconds)
    pub min_step_delay_us: u32,
    /// Slowest allowed inter-step delay (microseconds)
    pub max_step_delay_us: u32,
    /// Longest rotation dispatched per AutoTrack tick (milliseconds)
    pub max_motion_ms: u32,

    // --- Manual jog ---
    /// Rotation length for one button edge (milliseconds)
    pub manual_duration_ms: u32,
    /// Inter-step delay for manual jogs (microseconds)
    pub manual_step_delay_us: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            tick_interval_ms: 200,       // 5 Hz
            capture_period_ms: 200,      // 5 Hz
            telemetry_interval_ticks: 50, // every 10 s

            // Camera
            frame_width: 320,
            frame_height: 240,
            min_detection_score: 0.8,

            // Tracking
            dead_zone_x: 0.05,
            dead_zone_y: 0.05,
            output_floor: 0.01,
            integral_limit: Some(50.0),

            // Motion
            step_delay_scale_us: 150,
            min_step_delay_us: 800,
            max_step_delay_us: 5000,
            max_motion_ms: 150,

            // Manual jog
            manual_duration_ms: 150,
            manual_step_delay_us: 1200,
        }
    }
}

impl SystemConfig {
    /// Byte length of one raw BGR frame.
    pub fn frame_len(&self) -> usize {
        self.frame_width as usize * self.frame_height as usize * 3
    }

    /// Reject values that would make the control loop misbehave.
    ///
    /// Rotations must finish inside one tick so the axis queues never
    /// accumulate stale commands.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 || self.capture_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("periods must be non-zero"));
        }
        if self.max_motion_ms >= self.tick_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "max_motion_ms must be below tick_interval_ms",
            ));
        }
        if self.manual_duration_ms >= self.tick_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "manual_duration_ms must be below tick_interval_ms",
            ));
        }
        if self.min_step_delay_us == 0 || self.min_step_delay_us > self.max_step_delay_us {
            return Err(ConfigError::ValidationFailed(
                "step delay bounds must satisfy 0 < min <= max",
            ));
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ConfigError::ValidationFailed("frame dimensions must be non-zero"));
        }
        if !(0.0..0.5).contains(&self.dead_zone_x) || !(0.0..0.5).contains(&self.dead_zone_y) {
            return Err(ConfigError::ValidationFailed("dead zones must be in [0, 0.5)"));
        }
        if self.output_floor.is_nan() || self.output_floor <= 0.0 {
            return Err(ConfigError::ValidationFailed("output_floor must be positive"));
        }
        if !(0.0..=1.0).contains(&self.min_detection_score) {
            return Err(ConfigError::ValidationFailed(
                "min_detection_score must be in [0, 1]",
            ));
        }
        if let Some(limit) = self.integral_limit {
            if limit.is_nan() || limit <= 0.0 {
                return Err(ConfigError::ValidationFailed("integral_limit must be positive"));
            }
        }
        Ok(())
    }
}

/// Everything loaded at startup: gains plus tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub gains: PidGains,
    pub system: SystemConfig,
}

impl TrackerConfig {
    /// Build the configuration from `key=value` pairs.
    ///
    /// `kp`, `ki` and `kd` are required. Optional keys override the
    /// matching [`SystemConfig`] field; `integral_limit=none` disables the
    /// clamp. Unknown keys are logged and ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut kp = None;
        let mut ki = None;
        let mut kd = None;
        let mut sys = SystemConfig::default();

        for (key, value) in pairs {
            let value = value.as_ref().trim();
            match key.as_ref().trim() {
                "kp" => kp = Some(parse_gain("kp", value)?),
                "ki" => ki = Some(parse_gain("ki", value)?),
                "kd" => kd = Some(parse_gain("kd", value)?),
                "tick_interval_ms" => sys.tick_interval_ms = parse("tick_interval_ms", value)?,
                "capture_period_ms" => sys.capture_period_ms = parse("capture_period_ms", value)?,
                "telemetry_interval_ticks" => {
                    sys.telemetry_interval_ticks = parse("telemetry_interval_ticks", value)?;
                }
                "frame_width" => sys.frame_width = parse("frame_width", value)?,
                "frame_height" => sys.frame_height = parse("frame_height", value)?,
                "min_detection_score" => {
                    sys.min_detection_score = parse("min_detection_score", value)?;
                }
                "dead_zone_x" => sys.dead_zone_x = parse("dead_zone_x", value)?,
                "dead_zone_y" => sys.dead_zone_y = parse("dead_zone_y", value)?,
                "output_floor" => sys.output_floor = parse("output_floor", value)?,
                "integral_limit" => {
                    sys.integral_limit = if value.eq_ignore_ascii_case("none") {
                        None
                    } else {
                        Some(parse("integral_limit", value)?)
                    };
                }
                "step_delay_scale_us" => {
                    sys.step_delay_scale_us = parse("step_delay_scale_us", value)?;
                }
                "min_step_delay_us" => sys.min_step_delay_us = parse("min_step_delay_us", value)?,
                "max_step_delay_us" => sys.max_step_delay_us = parse("max_step_delay_us", value)?,
                "max_motion_ms" => sys.max_motion_ms = parse("max_motion_ms", value)?,
                "manual_duration_ms" => sys.manual_duration_ms = parse("manual_duration_ms", value)?,
                "manual_step_delay_us" => {
                    sys.manual_step_delay_us = parse("manual_step_delay_us", value)?;
                }
                other => warn!("Config: ignoring unknown key '{}'", other),
            }
        }

        let gains = PidGains {
            kp: kp.ok_or(ConfigError::MissingKey("kp"))?,
            ki: ki.ok_or(ConfigError::MissingKey("ki"))?,
            kd: kd.ok_or(ConfigError::MissingKey("kd"))?,
        };
        sys.validate()?;

        Ok(Self { gains, system: sys })
    }
}

fn parse<T: core::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Malformed(key))
}

fn parse_gain(key: &'static str, value: &str) -> Result<f32, ConfigError> {
    let gain: f32 = parse(key, value)?;
    if gain.is_finite() {
        Ok(gain)
    } else {
        Err(ConfigError::Malformed(key))
    }
}
