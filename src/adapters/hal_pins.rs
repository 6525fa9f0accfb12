//! `embedded-hal` output pins behind the [`GpioPort`] trait.
//!
//! [`OutputPinBank`] maps pin numbers onto any `OutputPin` implementation,
//! so a board HAL can drive the coils without the stepper knowing about it.
//! Plain push-pull outputs cannot float, so `PinMode::Input` is rendered as
//! driving the pin low, which de-energizes the ULN2003 channel the same way.

use embedded_hal::digital::OutputPin;

use crate::app::ports::{GpioPort, Level, PinMode};
use crate::error::ActuatorError;
use crate::pins::PinId;

pub struct OutputPinBank<P> {
    pins: Vec<(PinId, P)>,
}

impl<P: OutputPin> OutputPinBank<P> {
    pub fn new(pins: impl IntoIterator<Item = (PinId, P)>) -> Self {
        Self {
            pins: pins.into_iter().collect(),
        }
    }

    fn pin(&mut self, id: PinId) -> Result<&mut P, ActuatorError> {
        self.pins
            .iter_mut()
            .find(|(p, _)| *p == id)
            .map(|(_, pin)| pin)
            .ok_or(ActuatorError::UnknownPin(id))
    }
}

impl<P: OutputPin> GpioPort for OutputPinBank<P> {
    fn set_level(&mut self, pin: PinId, level: Level) -> Result<(), ActuatorError> {
        let pin = self.pin(pin)?;
        let written = match level {
            Level::High => pin.set_high(),
            Level::Low => pin.set_low(),
        };
        written.map_err(|_| ActuatorError::GpioWriteFailed)
    }

    fn set_mode(&mut self, pin: PinId, mode: PinMode) -> Result<(), ActuatorError> {
        let pin = self.pin(pin)?;
        match mode {
            PinMode::Output => Ok(()),
            PinMode::Input => pin.set_low().map_err(|_| ActuatorError::GpioModeFailed),
        }
    }
}
