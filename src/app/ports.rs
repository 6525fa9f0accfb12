//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlArbiter / StepSequencer (domain)
//! ```
//!
//! Driven adapters (GPIO, clock, camera, detector, event sinks, config
//! source) implement these traits. The domain consumes them via generics,
//! so the control core never touches hardware directly.

use crate::app::events::AppEvent;
use crate::app::mailbox::Frame;
use crate::config::TrackerConfig;
use crate::control::motion::{Axis, MotionCommand};
use crate::error::{ActuatorError, ConfigError, DispatchError, SourceError};
use crate::pins::PinId;

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain → coil pins)
// ───────────────────────────────────────────────────────────────

/// Logic level of an output pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Pin direction. `Input` leaves the pin high-impedance, which de-energizes
/// a ULN2003 channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Output,
    Input,
}

/// The two pin operations the stepper driver needs.
pub trait GpioPort {
    /// Drive `pin` to `level`. Only meaningful while the pin is an output.
    fn set_level(&mut self, pin: PinId, level: Level) -> Result<(), ActuatorError>;

    /// Switch `pin` between output and high-impedance input.
    fn set_mode(&mut self, pin: PinId, mode: PinMode) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic microsecond clock used for rotation deadlines.
pub trait MonotonicClock {
    fn now_us(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Camera and detector ports (external collaborators)
// ───────────────────────────────────────────────────────────────

/// Delivers one raw BGR frame of the configured dimensions per call.
pub trait FrameSource {
    fn fetch(&mut self) -> Result<Frame, SourceError>;
}

/// Axis-aligned detection box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// Detector confidence in [0, 1].
    pub score: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).abs()
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}

/// Upper bound on boxes reported for a single frame.
pub const MAX_DETECTIONS: usize = 16;

/// Fixed-capacity detection list for one frame.
pub type Detections = heapless::Vec<BoundingBox, MAX_DETECTIONS>;

/// Face detector: frame in, zero or more boxes out.
pub trait FaceDetector {
    fn detect(&mut self, frame: &Frame) -> Detections;
}

// ───────────────────────────────────────────────────────────────
// Motion sink (domain → axis workers)
// ───────────────────────────────────────────────────────────────

/// Non-blocking hand-off of motion intents to the per-axis workers.
///
/// Implementations must never wait for the rotation to complete. A full
/// queue is reported as [`DispatchError::Busy`] and the command is dropped.
pub trait MotionSink {
    fn try_dispatch(&self, axis: Axis, command: MotionCommand) -> Result<(), DispatchError>;

    /// Net half-steps the axis has taken since start, for telemetry.
    fn step_count(&self, axis: Axis) -> i64;
}

impl<T: MotionSink + ?Sized> MotionSink for std::sync::Arc<T> {
    fn try_dispatch(&self, axis: Axis, command: MotionCommand) -> Result<(), DispatchError> {
        (**self).try_dispatch(axis, command)
    }

    fn step_count(&self, axis: Axis) -> i64 {
        (**self).step_count(axis)
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port. Adapters
/// decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads the startup configuration.
///
/// Implementations must fail on missing or malformed gains rather than
/// substituting zero.
pub trait ConfigPort {
    fn load(&self) -> Result<TrackerConfig, ConfigError>;
}
