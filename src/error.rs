//! Unified error types for the FaceTrack firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! startup path and the task loops uniform. All variants are `Copy` so they
//! can be passed through the control loop and logged without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A stepper or GPIO command failed.
    Actuator(ActuatorError),
    /// Configuration is missing, malformed, or out of range.
    Config(ConfigError),
    /// The camera frame source failed.
    Source(SourceError),
    /// A motion command could not be handed to an axis worker.
    Dispatch(DispatchError),
    /// A task, channel, or other runtime resource could not be created.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Source(e) => write!(f, "frame source: {e}"),
            Self::Dispatch(e) => write!(f, "dispatch: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// Writing a logic level to a coil pin failed.
    GpioWriteFailed,
    /// Switching a coil pin between output and input failed.
    GpioModeFailed,
    /// The pin is not owned by the adapter that was asked to drive it.
    UnknownPin(u8),
    /// A rotation was requested with a negative step count.
    InvalidStepCount(i32),
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::GpioModeFailed => write!(f, "GPIO mode change failed"),
            Self::UnknownPin(pin) => write!(f, "pin {pin} not owned by this adapter"),
            Self::InvalidStepCount(n) => write!(f, "invalid step count {n}"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Startup configuration failures. Each one is fatal: the process must not
/// run the control loop with undefined gains or inconsistent timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The key=value source could not be opened or read.
    Unreadable,
    /// A line of the source is not a `key=value` pair.
    Syntax,
    /// A required key is absent.
    MissingKey(&'static str),
    /// A key is present but its value does not parse.
    Malformed(&'static str),
    /// A value parsed but is outside its allowed range.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable => write!(f, "config source unreadable"),
            Self::Syntax => write!(f, "config source is not key=value"),
            Self::MissingKey(key) => write!(f, "missing required key '{key}'"),
            Self::Malformed(key) => write!(f, "malformed value for '{key}'"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Frame source errors
// ---------------------------------------------------------------------------

/// Transient acquisition failures. The capture task logs these and skips
/// the tick; they never propagate past the task loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceError {
    /// The transport did not deliver a frame this tick.
    FetchFailed,
    /// The delivered frame does not have the configured byte length.
    WrongSize { expected: usize, got: usize },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchFailed => write!(f, "frame fetch failed"),
            Self::WrongSize { expected, got } => {
                write!(f, "frame is {got} bytes, expected {expected}")
            }
        }
    }
}

impl From<SourceError> for Error {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

// ---------------------------------------------------------------------------
// Dispatch errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The axis already has a command in flight and one pending.
    Busy,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "axis busy"),
        }
    }
}

impl From<DispatchError> for Error {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
