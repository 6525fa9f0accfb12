//! Control arbiter: the control loop state machine.
//!
//! [`ControlArbiter`] decides, once per tick, which command stream drives
//! the motors. It owns one PID controller per axis and produces motion
//! intents for the axis workers through the [`MotionSink`] port; it never
//! touches a pin and never waits for a rotation to finish.
//!
//! ```text
//!  ModeRegistry ──▶ ┌────────────────────────┐ ──▶ MotionSink (axis queues)
//!                   │     ControlArbiter      │
//! TrackingState ──▶ │  dead zone · PID · jog  │ ──▶ EventSink
//!                   └────────────────────────┘
//! ```
//!
//! | Mode      | Per tick                                                    |
//! |-----------|-------------------------------------------------------------|
//! | Idle      | nothing dispatched; stale detections dropped                |
//! | AutoTrack | take fresh detection → dead zone → PID → translate → queue  |
//! | Manual    | one jog edge per axis pair (up>down, left>right) → queue    |
//!
//! The mode is owned by the command plane; a change made mid-tick is seen
//! on the next tick. Entering AutoTrack re-homes both PID controllers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::config::TrackerConfig;
use crate::control::motion::{Axis, MotionCommand, MotionProfile, apply_dead_zone, jog_target};
use crate::control::pid::PidController;

use super::events::{AppEvent, TelemetryData};
use super::mailbox::{Detection, TrackingState};
use super::mode::{Button, Mode, ModeRegistry};
use super::ports::{EventSink, MotionSink};

/// Jog buttons grouped by axis, highest priority first.
const JOG_PAIRS: [(Button, Button); 2] = [(Button::Up, Button::Down), (Button::Left, Button::Right)];

pub struct ControlArbiter<M> {
    registry: Arc<ModeRegistry>,
    tracking: Arc<TrackingState>,
    motion: M,
    pan_pid: PidController,
    tilt_pid: PidController,
    profile: MotionProfile,
    dead_zone: (f32, f32),
    tick_interval: Duration,
    telemetry_every: u32,
    last_mode: Mode,
    ticks: u64,
    dispatched: u64,
    dropped: u64,
    last_face: Option<(f32, f32)>,
}

impl<M: MotionSink> ControlArbiter<M> {
    pub fn new(
        config: &TrackerConfig,
        registry: Arc<ModeRegistry>,
        tracking: Arc<TrackingState>,
        motion: M,
    ) -> Self {
        let sys = &config.system;
        let pid = PidController::new(config.gains).with_integral_limit(sys.integral_limit);
        let last_mode = registry.mode();

        Self {
            registry,
            tracking,
            motion,
            pan_pid: pid.clone(),
            tilt_pid: pid,
            profile: MotionProfile::new(sys),
            dead_zone: (sys.dead_zone_x, sys.dead_zone_y),
            tick_interval: Duration::from_millis(u64::from(sys.tick_interval_ms)),
            telemetry_every: sys.telemetry_interval_ticks,
            last_mode,
            ticks: 0,
            dispatched: 0,
            dropped: 0,
            last_face: None,
        }
    }

    // ── Loop ──────────────────────────────────────────────────

    /// Tick at the configured period until the registry stops running.
    ///
    /// Rotations already queued may still complete after this returns.
    pub fn run(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started(self.last_mode));
        info!(
            "Control loop started in {:?} ({} ms tick)",
            self.last_mode,
            self.tick_interval.as_millis()
        );

        while self.registry.is_running() {
            let started = Instant::now();
            self.tick(sink);
            std::thread::sleep(self.tick_interval.saturating_sub(started.elapsed()));
        }

        sink.emit(&AppEvent::Stopped);
        info!("Control loop stopped after {} ticks", self.ticks);
    }

    /// Run one control cycle: read mode → act for that mode → telemetry.
    pub fn tick(&mut self, sink: &mut impl EventSink) {
        self.ticks += 1;

        let mode = self.registry.mode();
        if mode != self.last_mode {
            sink.emit(&AppEvent::ModeChanged {
                from: self.last_mode,
                to: mode,
            });
            if mode == Mode::AutoTrack {
                self.rehome();
            }
            self.last_mode = mode;
        }

        match mode {
            Mode::Idle => self.discard_detection(),
            Mode::AutoTrack => self.track(sink),
            Mode::Manual => {
                self.discard_detection();
                self.jog(sink);
            }
        }

        if self.telemetry_every > 0 && self.ticks % u64::from(self.telemetry_every) == 0 {
            sink.emit(&AppEvent::Telemetry(self.telemetry()));
        }
    }

    /// Reset both PID controllers.
    pub fn rehome(&mut self) {
        self.pan_pid.reset();
        self.tilt_pid.reset();
        debug!("PID controllers re-homed");
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn telemetry(&self) -> TelemetryData {
        TelemetryData {
            mode: self.last_mode,
            ticks: self.ticks,
            pan_steps: self.motion.step_count(Axis::Pan),
            tilt_steps: self.motion.step_count(Axis::Tilt),
            dispatched: self.dispatched,
            dropped: self.dropped,
            last_face: self.last_face,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn motion(&self) -> &M {
        &self.motion
    }

    // ── Internal ──────────────────────────────────────────────

    fn track(&mut self, sink: &mut impl EventSink) {
        let Some(detection) = self.tracking.take() else {
            return;
        };

        let (x, y) = match detection {
            Detection::Face { x, y } => (x, y),
            Detection::NoFace => {
                sink.emit(&AppEvent::FaceLost);
                return;
            }
        };
        self.last_face = Some((x, y));

        let pan_error = apply_dead_zone(x - 0.5, self.dead_zone.0);
        let tilt_error = apply_dead_zone(y - 0.5, self.dead_zone.1);
        let pan_out = self.pan_pid.compute(pan_error);
        let tilt_out = self.tilt_pid.compute(tilt_error);

        for (axis, output) in [(Axis::Pan, pan_out), (Axis::Tilt, tilt_out)] {
            if let Some(command) = self.profile.translate(output) {
                self.dispatch(axis, command, sink);
            }
        }
    }

    fn jog(&mut self, sink: &mut impl EventSink) {
        for (first, second) in JOG_PAIRS {
            let pressed = if self.registry.take_edge(first) {
                Some(first)
            } else if self.registry.take_edge(second) {
                Some(second)
            } else {
                None
            };

            if let Some(button) = pressed {
                let (axis, direction) = jog_target(button);
                debug!("Jog {:?} -> {} {:?}", button, axis.name(), direction);
                self.dispatch(axis, self.profile.jog(direction), sink);
            }
        }
    }

    fn discard_detection(&mut self) {
        if let Some(Detection::Face { x, y }) = self.tracking.take() {
            self.last_face = Some((x, y));
        }
    }

    fn dispatch(&mut self, axis: Axis, command: MotionCommand, sink: &mut impl EventSink) {
        match self.motion.try_dispatch(axis, command) {
            Ok(()) => {
                self.dispatched += 1;
                sink.emit(&AppEvent::Dispatched { axis, command });
            }
            Err(e) => {
                self.dropped += 1;
                debug!("{} dispatch dropped: {}", axis.name(), e);
                sink.emit(&AppEvent::DispatchDropped { axis });
            }
        }
    }
}
