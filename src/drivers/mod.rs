//! Stepper drivers, per-axis workers, and task spawning.

pub mod axis;
pub mod stepper;
pub mod task_pin;
