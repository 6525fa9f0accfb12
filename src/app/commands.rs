//! Inbound commands from the control plane.
//!
//! The HTTP layer (or the stdin reader in host runs) delivers these already
//! parsed; [`ModeRegistry::apply`](super::mode::ModeRegistry::apply) turns
//! them into registry updates. The wire form is one JSON object per
//! command, tagged by `cmd`:
//!
//! ```text
//! {"cmd":"set_mode","mode":"auto_track"}
//! {"cmd":"button","button":"left","pressed":true}
//! {"cmd":"shutdown"}
//! ```

use serde::{Deserialize, Serialize};

use super::mode::{Button, Mode};

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum RemoteCommand {
    /// Switch operating mode. Takes effect on the next control tick.
    SetMode { mode: Mode },

    /// Set or clear a manual jog latch.
    Button { button: Button, pressed: bool },

    /// Stop every task after its current tick.
    Shutdown,
}

impl RemoteCommand {
    /// Parse one JSON command line.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
