//! Simulated coil GPIO for host runs and tests.
//!
//! [`SimGpio`] implements [`GpioPort`] against an in-memory pin table.
//! Clones share the same table, so a test can hand one clone to a
//! sequencer and keep another to inspect levels afterwards.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::app::ports::{GpioPort, Level, PinMode};
use crate::error::ActuatorError;
use crate::pins::{CoilPins, PinId};

#[derive(Debug, Default)]
struct PinTable {
    levels: HashMap<PinId, Level>,
    modes: HashMap<PinId, PinMode>,
    writes: usize,
    fail_writes: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SimGpio {
    state: Arc<Mutex<PinTable>>,
}

impl SimGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current levels of `pins` as 0/1, in coil order. Unwritten pins read 0.
    pub fn levels(&self, pins: &CoilPins) -> [u8; 4] {
        let table = self.table();
        pins.as_array()
            .map(|pin| u8::from(table.levels.get(&pin) == Some(&Level::High)))
    }

    /// Number of `set_level` calls so far. Mode changes are not counted.
    pub fn write_count(&self) -> usize {
        self.table().writes
    }

    pub fn all_in_mode(&self, pins: &CoilPins, mode: PinMode) -> bool {
        let table = self.table();
        pins.as_array()
            .iter()
            .all(|pin| table.modes.get(pin) == Some(&mode))
    }

    /// Make every subsequent `set_level` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.table().fail_writes = fail;
    }

    fn table(&self) -> MutexGuard<'_, PinTable> {
        // A panicking test thread must not hide the table from the others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl GpioPort for SimGpio {
    fn set_level(&mut self, pin: PinId, level: Level) -> Result<(), ActuatorError> {
        let mut table = self.table();
        if table.fail_writes {
            return Err(ActuatorError::GpioWriteFailed);
        }
        table.writes += 1;
        table.levels.insert(pin, level);
        Ok(())
    }

    fn set_mode(&mut self, pin: PinId, mode: PinMode) -> Result<(), ActuatorError> {
        let mut table = self.table();
        if mode == PinMode::Input {
            table.levels.insert(pin, Level::Low);
        }
        table.modes.insert(pin, mode);
        Ok(())
    }
}
