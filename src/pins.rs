//! GPIO pin assignments for the pan/tilt rig.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers. Numbers are wiringPi logical pin identifiers.
//!
//! Each axis is a 28BYJ-48 style unipolar stepper behind a ULN2003 driver:
//! four coil inputs, ordered so that walking the half-step table forward
//! turns the shaft monotonically in one direction.

use core::fmt;

use crate::error::ConfigError;

/// Logical pin identifier as understood by the GPIO port.
pub type PinId = u8;

// ---------------------------------------------------------------------------
// Pan axis (X)
// ---------------------------------------------------------------------------

/// Coil inputs IN1..IN4 of the pan driver board.
pub const PAN_COIL_PINS: [PinId; 4] = [3, 4, 6, 9];

// ---------------------------------------------------------------------------
// Tilt axis (Y)
// ---------------------------------------------------------------------------

/// Coil inputs IN1..IN4 of the tilt driver board.
pub const TILT_COIL_PINS: [PinId; 4] = [10, 13, 15, 16];

/// The four coil pins of one axis.
///
/// Construction checks that the four identifiers are distinct; the pan and
/// tilt sets are checked against each other with [`CoilPins::overlaps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoilPins([PinId; 4]);

impl CoilPins {
    pub fn new(pins: [PinId; 4]) -> Result<Self, ConfigError> {
        for (i, a) in pins.iter().enumerate() {
            if pins[i + 1..].contains(a) {
                return Err(ConfigError::ValidationFailed(
                    "coil pins of one axis must be distinct",
                ));
            }
        }
        Ok(Self(pins))
    }

    pub fn pan() -> Self {
        Self(PAN_COIL_PINS)
    }

    pub fn tilt() -> Self {
        Self(TILT_COIL_PINS)
    }

    pub fn as_array(&self) -> [PinId; 4] {
        self.0
    }

    /// True if any pin is shared with `other`.
    pub fn overlaps(&self, other: &CoilPins) -> bool {
        self.0.iter().any(|p| other.0.contains(p))
    }
}

impl fmt::Display for CoilPins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "[{a}, {b}, {c}, {d}]")
    }
}
