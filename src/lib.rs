//! FaceTrack pan/tilt controller library.
//!
//! Exposes the control core, the stepper drivers and the host adapters
//! for the binary and for integration testing. Everything that touches a
//! pin goes through [`app::ports::GpioPort`], so the whole loop runs on a
//! desktop against [`adapters::hardware::SimGpio`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod pins;
