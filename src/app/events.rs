//! Outbound application events.
//!
//! The [`ControlArbiter`](super::arbiter::ControlArbiter) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on the
//! other side decide what to do with them: log to the console, push to
//! the control plane, etc.

use crate::app::mode::Mode;
use crate::control::motion::{Axis, MotionCommand};

/// Structured events emitted by the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The control loop has started (carries the initial mode).
    Started(Mode),

    /// The mode observed by the control loop changed between ticks.
    ModeChanged { from: Mode, to: Mode },

    /// A rotation was queued for an axis.
    Dispatched { axis: Axis, command: MotionCommand },

    /// The axis was busy; the command was dropped for this tick.
    DispatchDropped { axis: Axis },

    /// A fresh detection reported no face.
    FaceLost,

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// The control loop exited.
    Stopped,
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub mode: Mode,
    pub ticks: u64,
    pub pan_steps: i64,
    pub tilt_steps: i64,
    pub dispatched: u64,
    pub dropped: u64,
    /// Last face centre seen, normalized.
    pub last_face: Option<(f32, f32)>,
}
