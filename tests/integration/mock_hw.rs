//! Mock hardware adapters for integration tests.
//!
//! Records every GPIO, dispatch and event call so tests can assert on the
//! full history without touching real pins. The fake clock only moves when
//! something delays on it, which makes rotation timing exact.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use embedded_hal::delay::DelayNs;
use facetrack::app::events::AppEvent;
use facetrack::app::ports::{EventSink, GpioPort, Level, MonotonicClock, MotionSink, PinMode};
use facetrack::config::{PidGains, SystemConfig, TrackerConfig};
use facetrack::control::motion::{Axis, MotionCommand};
use facetrack::error::{ActuatorError, DispatchError};
use facetrack::pins::{CoilPins, PinId};

// ── GPIO call record ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioCall {
    Level(PinId, Level),
    Mode(PinId, PinMode),
}

#[derive(Clone, Default)]
pub struct RecordingGpio {
    pub calls: Arc<Mutex<Vec<GpioCall>>>,
}

#[allow(dead_code)]
impl RecordingGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<GpioCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Coil rows written so far, one `[u8; 4]` per four level writes.
    pub fn rows(&self, pins: &CoilPins) -> Vec<[u8; 4]> {
        let levels: Vec<(PinId, Level)> = self
            .history()
            .into_iter()
            .filter_map(|c| match c {
                GpioCall::Level(p, l) if pins.as_array().contains(&p) => Some((p, l)),
                _ => None,
            })
            .collect();

        levels
            .chunks_exact(4)
            .map(|chunk| {
                let mut row = [0u8; 4];
                for (slot, pin) in pins.as_array().iter().enumerate() {
                    if let Some((_, l)) = chunk.iter().find(|(p, _)| p == pin) {
                        row[slot] = u8::from(*l == Level::High);
                    }
                }
                row
            })
            .collect()
    }

    /// Pins that ever received a level write.
    pub fn written_pins(&self) -> Vec<PinId> {
        let mut pins: Vec<PinId> = self
            .history()
            .into_iter()
            .filter_map(|c| match c {
                GpioCall::Level(p, _) => Some(p),
                GpioCall::Mode(..) => None,
            })
            .collect();
        pins.sort_unstable();
        pins.dedup();
        pins
    }
}

impl GpioPort for RecordingGpio {
    fn set_level(&mut self, pin: PinId, level: Level) -> Result<(), ActuatorError> {
        self.calls.lock().unwrap().push(GpioCall::Level(pin, level));
        Ok(())
    }

    fn set_mode(&mut self, pin: PinId, mode: PinMode) -> Result<(), ActuatorError> {
        self.calls.lock().unwrap().push(GpioCall::Mode(pin, mode));
        Ok(())
    }
}

// ── Fake time ─────────────────────────────────────────────────

/// Clock and delay on one shared timeline, microsecond resolution.
#[derive(Clone, Default)]
pub struct FakeTime(pub Arc<AtomicU64>);

#[allow(dead_code)]
impl FakeTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_us(&self, us: u64) {
        self.0.fetch_add(us, Ordering::SeqCst);
    }
}

impl MonotonicClock for FakeTime {
    fn now_us(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

impl DelayNs for FakeTime {
    fn delay_ns(&mut self, ns: u32) {
        self.advance_us(u64::from(ns.div_ceil(1000)));
    }
}

// ── Motion sink ───────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingMotion {
    pub sent: Mutex<Vec<(Axis, MotionCommand)>>,
    pub pan_busy: AtomicBool,
    pub tilt_busy: AtomicBool,
}

#[allow(dead_code)]
impl RecordingMotion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(Axis, MotionCommand)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_busy(&self, axis: Axis, busy: bool) {
        match axis {
            Axis::Pan => self.pan_busy.store(busy, Ordering::SeqCst),
            Axis::Tilt => self.tilt_busy.store(busy, Ordering::SeqCst),
        }
    }
}

impl MotionSink for RecordingMotion {
    fn try_dispatch(&self, axis: Axis, command: MotionCommand) -> Result<(), DispatchError> {
        let busy = match axis {
            Axis::Pan => &self.pan_busy,
            Axis::Tilt => &self.tilt_busy,
        };
        if busy.load(Ordering::SeqCst) {
            return Err(DispatchError::Busy);
        }
        self.sent.lock().unwrap().push((axis, command));
        Ok(())
    }

    fn step_count(&self, _axis: Axis) -> i64 {
        0
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Config ────────────────────────────────────────────────────

#[allow(dead_code)]
pub fn config(kp: f32, ki: f32, kd: f32) -> TrackerConfig {
    TrackerConfig {
        gains: PidGains { kp, ki, kd },
        system: SystemConfig::default(),
    }
}
