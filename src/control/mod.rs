//! Closed-loop control: PID per axis and the output → motion translation.

pub mod motion;
pub mod pid;
