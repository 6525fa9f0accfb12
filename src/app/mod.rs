//! Application core: control logic and task plumbing, no pin I/O.
//!
//! The arbiter, the capture/detection tasks and the shared state they
//! exchange live here. All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod arbiter;
pub mod commands;
pub mod events;
pub mod mailbox;
pub mod mode;
pub mod pipeline;
pub mod ports;
