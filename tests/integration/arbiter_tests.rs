//! Integration tests for the ModeRegistry → ControlArbiter → MotionSink chain.
//!
//! Detections and commands go in through the same shared state the real
//! tasks use; dispatches are captured by a recording motion sink.

use std::sync::Arc;
use std::time::Duration;

use super::mock_hw::{RecordingMotion, RecordingSink, config};

use facetrack::app::arbiter::ControlArbiter;
use facetrack::app::commands::RemoteCommand;
use facetrack::app::events::AppEvent;
use facetrack::app::mailbox::{Detection, TrackingState};
use facetrack::app::mode::{Button, Mode, ModeRegistry};
use facetrack::config::TrackerConfig;
use facetrack::control::motion::Axis;
use facetrack::drivers::stepper::Direction;

struct Rig {
    arbiter: ControlArbiter<Arc<RecordingMotion>>,
    registry: Arc<ModeRegistry>,
    tracking: Arc<TrackingState>,
    motion: Arc<RecordingMotion>,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: &TrackerConfig) -> Self {
        let registry = Arc::new(ModeRegistry::new());
        let tracking = Arc::new(TrackingState::new());
        let motion = Arc::new(RecordingMotion::new());
        let arbiter = ControlArbiter::new(config, registry.clone(), tracking.clone(), motion.clone());
        Self {
            arbiter,
            registry,
            tracking,
            motion,
            sink: RecordingSink::new(),
        }
    }

    fn face(&mut self, x: f32, y: f32) {
        self.tracking.publish(Detection::Face { x, y });
        self.arbiter.tick(&mut self.sink);
    }

    fn command(&self, cmd: RemoteCommand) {
        self.registry.apply(&cmd);
    }
}

fn no_dead_zone(kp: f32, ki: f32, kd: f32) -> TrackerConfig {
    let mut cfg = config(kp, ki, kd);
    cfg.system.dead_zone_x = 0.0;
    cfg.system.dead_zone_y = 0.0;
    cfg
}

// ── Mode switching ────────────────────────────────────────────

#[test]
fn switch_to_idle_stops_dispatch_within_one_tick() {
    let mut rig = Rig::new(&config(1.0, 0.0, 0.0));
    rig.command(RemoteCommand::SetMode {
        mode: Mode::AutoTrack,
    });
    rig.face(0.9, 0.9);
    let before = rig.motion.sent().len();
    assert!(before > 0, "off-centre face must produce motion");

    rig.command(RemoteCommand::SetMode { mode: Mode::Idle });
    for _ in 0..5 {
        rig.face(0.9, 0.9);
    }
    assert_eq!(rig.motion.sent().len(), before);
}

#[test]
fn every_transition_is_reported_once() {
    let mut rig = Rig::new(&config(1.0, 0.0, 0.0));
    let mut expected = 0;
    let mut current = Mode::Idle;
    for from in Mode::ALL {
        for to in Mode::ALL {
            for mode in [from, to] {
                rig.registry.set_mode(mode);
                rig.arbiter.tick(&mut rig.sink);
                if mode != current {
                    expected += 1;
                    current = mode;
                }
            }
        }
    }
    let changes = rig
        .sink
        .count(|e| matches!(e, AppEvent::ModeChanged { .. }));
    assert_eq!(changes, expected);
}

// ── AutoTrack ─────────────────────────────────────────────────

#[test]
fn pid_outputs_drive_pan_direction_and_speed() {
    let mut rig = Rig::new(&no_dead_zone(1.5, 0.0025, 0.0025));
    rig.registry.set_mode(Mode::AutoTrack);

    // errors 0.1, 0.1, -0.05 → outputs 0.1505, 0.1505, -0.075
    for x in [0.6, 0.6, 0.45] {
        rig.face(x, 0.5);
    }

    let sent = rig.motion.sent();
    assert_eq!(sent.len(), 3, "centred tilt never moves");
    assert!(sent.iter().all(|(axis, _)| *axis == Axis::Pan));

    let dirs: Vec<Direction> = sent.iter().map(|(_, c)| c.direction).collect();
    assert_eq!(dirs, [Direction::Forward, Direction::Forward, Direction::Backward]);
    assert_eq!(sent[0].1.step_delay, Duration::from_micros(997));
    assert_eq!(sent[2].1.step_delay, Duration::from_micros(2000));
}

#[test]
fn dead_zone_holds_position() {
    let mut rig = Rig::new(&config(1.0, 0.0, 0.0));
    rig.registry.set_mode(Mode::AutoTrack);
    for (x, y) in [(0.5, 0.5), (0.53, 0.48), (0.46, 0.54)] {
        rig.face(x, y);
    }
    assert!(rig.motion.sent().is_empty());
}

#[test]
fn reentering_autotrack_rehomes_pid() {
    // Pure integral: a wound-up controller saturates at the minimum delay,
    // a fresh one does not.
    let cfg = no_dead_zone(0.0, 1.0, 0.0);

    let mut fresh = Rig::new(&cfg);
    fresh.registry.set_mode(Mode::AutoTrack);
    fresh.face(0.6, 0.5);
    let fresh_cmd = fresh.motion.sent()[0].1;

    let mut rig = Rig::new(&cfg);
    rig.registry.set_mode(Mode::AutoTrack);
    for _ in 0..10 {
        rig.face(0.9, 0.5);
    }
    rig.registry.set_mode(Mode::Idle);
    rig.arbiter.tick(&mut rig.sink);
    rig.registry.set_mode(Mode::AutoTrack);
    rig.face(0.6, 0.5);

    assert_eq!(fresh_cmd.step_delay, Duration::from_micros(1500));
    assert_eq!(rig.motion.sent().last().map(|(_, c)| *c), Some(fresh_cmd));
}

#[test]
fn stale_detection_is_not_replayed() {
    let mut rig = Rig::new(&config(1.0, 0.0, 0.0));
    rig.registry.set_mode(Mode::AutoTrack);
    rig.face(0.9, 0.5);
    for _ in 0..3 {
        rig.arbiter.tick(&mut rig.sink);
    }
    assert_eq!(rig.motion.sent().len(), 1);
}

// ── Manual ────────────────────────────────────────────────────

#[test]
fn manual_jog_is_fixed_length_and_speed() {
    let cfg = config(1.0, 0.0, 0.0);
    let mut rig = Rig::new(&cfg);
    rig.command(RemoteCommand::SetMode { mode: Mode::Manual });
    rig.command(RemoteCommand::Button {
        button: Button::Right,
        pressed: true,
    });
    rig.arbiter.tick(&mut rig.sink);

    let sent = rig.motion.sent();
    assert_eq!(sent.len(), 1);
    let (axis, cmd) = sent[0];
    assert_eq!(axis, Axis::Pan);
    assert_eq!(cmd.direction, Direction::Forward);
    assert_eq!(
        cmd.duration,
        Duration::from_millis(u64::from(cfg.system.manual_duration_ms))
    );
    assert_eq!(
        cmd.step_delay,
        Duration::from_micros(u64::from(cfg.system.manual_step_delay_us))
    );
}

#[test]
fn manual_ignores_detections() {
    let mut rig = Rig::new(&config(1.0, 0.0, 0.0));
    rig.registry.set_mode(Mode::Manual);
    rig.face(0.95, 0.05);
    assert!(rig.motion.sent().is_empty());
}

#[test]
fn busy_axis_drops_and_recovers_next_tick() {
    let mut rig = Rig::new(&config(1.0, 0.0, 0.0));
    rig.registry.set_mode(Mode::Manual);
    rig.motion.set_busy(Axis::Tilt, true);
    rig.registry.set_edge(Button::Up, true);
    rig.registry.set_edge(Button::Left, true);
    rig.arbiter.tick(&mut rig.sink);

    assert_eq!(rig.arbiter.dropped(), 1);
    assert_eq!(rig.motion.sent().len(), 1, "pan still moves");

    rig.motion.set_busy(Axis::Tilt, false);
    rig.registry.set_edge(Button::Up, true);
    rig.arbiter.tick(&mut rig.sink);
    assert_eq!(rig.motion.sent().last().map(|(a, _)| *a), Some(Axis::Tilt));
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_every_n_ticks() {
    let mut cfg = config(1.0, 0.0, 0.0);
    cfg.system.telemetry_interval_ticks = 3;
    let mut rig = Rig::new(&cfg);
    rig.registry.set_mode(Mode::AutoTrack);
    rig.face(0.7, 0.5);
    for _ in 0..5 {
        rig.arbiter.tick(&mut rig.sink);
    }

    let telem: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Telemetry(t) => Some(*t),
            _ => None,
        })
        .collect();
    assert_eq!(telem.len(), 2);
    assert_eq!(telem[0].ticks, 3);
    assert_eq!(telem[0].dispatched, 1);
    assert_eq!(telem[0].last_face, Some((0.7, 0.5)));
}

#[test]
fn run_exits_when_shutdown_requested() {
    let mut cfg = config(1.0, 0.0, 0.0);
    cfg.system.tick_interval_ms = 5;
    cfg.system.max_motion_ms = 2;
    cfg.system.manual_duration_ms = 2;
    let mut rig = Rig::new(&cfg);

    let registry = rig.registry.clone();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(30));
        registry.apply(&RemoteCommand::Shutdown);
    });
    rig.arbiter.run(&mut rig.sink);
    stopper.join().unwrap();

    assert!(matches!(rig.sink.events.first(), Some(AppEvent::Started(Mode::Idle))));
    assert_eq!(rig.sink.events.last(), Some(&AppEvent::Stopped));
    assert!(rig.arbiter.ticks() >= 1);
}
