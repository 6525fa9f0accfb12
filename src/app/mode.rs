//! Shared operating-mode registry.
//!
//! Written by the command-ingestion task, read by the control loop. Every
//! field is an independent atomic:
//!
//! | Field     | Writer            | Reader / clearer        |
//! |-----------|-------------------|-------------------------|
//! | `mode`    | command ingestion | control loop            |
//! | `edges`   | command ingestion | control loop (swap)     |
//! | `running` | ingestion / main  | every task loop         |
//!
//! Fields are atomic individually, not as a group. The control loop only
//! needs one consistent field at a time (mode, then the edges of one axis
//! pair), so no group snapshot lock is taken. [`ModeRegistry::snapshot`]
//! exists for telemetry, where a slightly torn view is harmless.
//!
//! Edges are consumed only in Manual. Presses left over from another mode
//! are dropped by [`ModeRegistry::set_mode`] when it switches into Manual.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use log::info;
use serde::{Deserialize, Serialize};

use super::commands::RemoteCommand;

/// Operating mode of the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Mode {
    Idle = 0,
    AutoTrack = 1,
    Manual = 2,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Idle, Mode::AutoTrack, Mode::Manual];

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::AutoTrack,
            2 => Self::Manual,
            _ => Self::Idle,
        }
    }
}

/// Manual jog buttons. Up/down share the tilt axis, left/right the pan axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Button {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Button {
    pub const ALL: [Button; 4] = [Button::Up, Button::Down, Button::Left, Button::Right];
}

/// Point-in-time copy of the registry, field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSnapshot {
    pub mode: Mode,
    pub edges: [bool; 4],
    pub running: bool,
}

pub struct ModeRegistry {
    mode: AtomicU8,
    edges: [AtomicBool; 4],
    running: AtomicBool,
}

impl ModeRegistry {
    /// Starts in [`Mode::Idle`], running, no pending edges.
    pub const fn new() -> Self {
        Self {
            mode: AtomicU8::new(Mode::Idle as u8),
            edges: [
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
            ],
            running: AtomicBool::new(true),
        }
    }

    pub fn mode(&self) -> Mode {
        Mode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Set the mode; returns the previous one.
    ///
    /// Entering [`Mode::Manual`] drops latches pressed in another mode.
    /// The clear happens on the writer's side, before any press that
    /// follows the mode change can be stored.
    pub fn set_mode(&self, mode: Mode) -> Mode {
        let prev = Mode::from_u8(self.mode.swap(mode as u8, Ordering::AcqRel));
        if mode == Mode::Manual && prev != Mode::Manual {
            self.clear_edges();
        }
        prev
    }

    /// Set or clear one button latch.
    pub fn set_edge(&self, button: Button, pressed: bool) {
        self.edges[button as usize].store(pressed, Ordering::Release);
    }

    /// Consume one latch: returns whether it was set and clears it.
    pub fn take_edge(&self, button: Button) -> bool {
        self.edges[button as usize].swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self, button: Button) -> bool {
        self.edges[button as usize].load(Ordering::Acquire)
    }

    pub fn clear_edges(&self) {
        for edge in &self.edges {
            edge.store(false, Ordering::Release);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask every task to finish its current tick and exit.
    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn snapshot(&self) -> ModeSnapshot {
        ModeSnapshot {
            mode: self.mode(),
            edges: Button::ALL.map(|b| self.is_pending(b)),
            running: self.is_running(),
        }
    }

    /// Apply one command from the control plane.
    pub fn apply(&self, command: &RemoteCommand) {
        match *command {
            RemoteCommand::SetMode { mode } => {
                let prev = self.set_mode(mode);
                if prev != mode {
                    info!("Mode: {:?} -> {:?}", prev, mode);
                }
            }
            RemoteCommand::Button { button, pressed } => self.set_edge(button, pressed),
            RemoteCommand::Shutdown => {
                info!("Shutdown requested");
                self.request_shutdown();
            }
        }
    }
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
