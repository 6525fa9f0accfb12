//! End-to-end: simulated camera → detection → arbiter → axis workers → GPIO.
//!
//! Every task runs on its own thread exactly as in the binary, with the
//! simulated pins and a fake stepper clock so rotations finish instantly.

use std::sync::Arc;
use std::time::Duration;

use super::mock_hw::{FakeTime, RecordingSink, config};

use facetrack::adapters::hardware::SimGpio;
use facetrack::adapters::sim_camera::{SimCamera, ThresholdDetector};
use facetrack::adapters::stdin_commands::CommandReader;
use facetrack::app::arbiter::ControlArbiter;
use facetrack::app::events::AppEvent;
use facetrack::app::mailbox::{Detection, Frame, FrameChannel, TrackingState};
use facetrack::app::mode::{Mode, ModeRegistry};
use facetrack::app::pipeline::{CaptureTask, DetectTask};
use facetrack::app::ports::PinMode;
use facetrack::control::motion::Axis;
use facetrack::drivers::axis::{AxisPair, AxisWorker};
use facetrack::drivers::stepper::StepSequencer;
use facetrack::pins::CoilPins;

#[test]
fn capture_and_detect_hand_off_latest_frame() {
    let registry = Arc::new(ModeRegistry::new());
    let frames = Arc::new(FrameChannel::new());
    let tracking = Arc::new(TrackingState::new());

    let mut capture = CaptureTask::new(
        SimCamera::new(64, 48),
        frames.clone(),
        registry.clone(),
        Duration::ZERO,
    );
    let mut detect = DetectTask::new(
        ThresholdDetector::default(),
        frames.clone(),
        tracking.clone(),
        registry,
        0.8,
    )
    .with_poll(Duration::from_millis(5));

    // Two captures before one detection: the first frame is overwritten.
    assert!(capture.capture_once());
    assert!(capture.capture_once());
    assert!(detect.detect_once());
    assert!(!detect.detect_once(), "only one frame was pending");

    let cam = SimCamera::new(64, 48);
    let (ox, oy) = cam.target_origin(2);
    let side = 8.0;
    let want_x = (ox as f32 + side / 2.0) / 64.0;
    let want_y = (oy as f32 + side / 2.0) / 48.0;
    match tracking.take() {
        Some(Detection::Face { x, y }) => {
            assert!((x - want_x).abs() < 1e-4, "x {x} vs {want_x}");
            assert!((y - want_y).abs() < 1e-4, "y {y} vs {want_y}");
        }
        other => panic!("expected a face, got {other:?}"),
    }
}

#[test]
fn concurrent_frames_arrive_whole_and_in_order() {
    const LAST: u64 = 2_000;
    const W: u32 = 32;
    const H: u32 = 24;

    fn fill(seq: u64) -> u8 {
        (seq % 251) as u8
    }

    let frames = Arc::new(FrameChannel::new());

    let producer = {
        let frames = frames.clone();
        std::thread::spawn(move || {
            for seq in 1..=LAST {
                let data = vec![fill(seq); (W * H * 3) as usize];
                frames.publish(Frame::new(seq, W, H, data).unwrap());
            }
        })
    };

    let consumer = {
        let frames = frames.clone();
        std::thread::spawn(move || {
            let mut last_seq = 0;
            let mut taken = 0u64;
            while last_seq < LAST {
                let Some(frame) = frames.take() else {
                    std::thread::yield_now();
                    continue;
                };
                assert!(frame.seq() > last_seq, "{} after {}", frame.seq(), last_seq);
                let want = fill(frame.seq());
                assert!(
                    frame.bytes().iter().all(|&b| b == want),
                    "frame {} mixes contents",
                    frame.seq()
                );
                last_seq = frame.seq();
                taken += 1;
            }
            taken
        })
    };

    producer.join().unwrap();
    let taken = consumer.join().unwrap();
    assert!((1..=LAST).contains(&taken));
    assert!(!frames.is_ready());
}

#[test]
fn full_loop_tracks_and_releases_on_shutdown() {
    let mut cfg = config(0.8, 0.0, 0.1);
    cfg.system.tick_interval_ms = 20;
    cfg.system.max_motion_ms = 10;
    cfg.system.manual_duration_ms = 10;
    cfg.system.frame_width = 80;
    cfg.system.frame_height = 60;

    let registry = Arc::new(ModeRegistry::new());
    let frames = Arc::new(FrameChannel::new());
    let tracking = Arc::new(TrackingState::new());
    let axes = AxisPair::new();
    let gpio = SimGpio::new();

    let commands = "{\"cmd\":\"set_mode\",\"mode\":\"auto_track\"}\n";
    CommandReader::new(commands.as_bytes(), registry.clone()).run();
    assert_eq!(registry.mode(), Mode::AutoTrack);

    let mut handles = Vec::new();
    for (axis, pins) in [(Axis::Pan, CoilPins::pan()), (Axis::Tilt, CoilPins::tilt())] {
        let time = FakeTime::new();
        let seq = StepSequencer::new(gpio.clone(), time.clone(), time, pins);
        let worker = AxisWorker::new(axes.link(axis).clone(), seq, registry.clone())
            .with_poll(Duration::from_millis(5));
        handles.push(std::thread::spawn(move || worker.run()));
    }

    let capture = CaptureTask::new(
        SimCamera::new(80, 60).with_period(40),
        frames.clone(),
        registry.clone(),
        Duration::from_millis(10),
    );
    handles.push(std::thread::spawn(move || capture.run()));

    let detect = DetectTask::new(
        ThresholdDetector::default(),
        frames,
        tracking.clone(),
        registry.clone(),
        cfg.system.min_detection_score,
    )
    .with_poll(Duration::from_millis(5));
    handles.push(std::thread::spawn(move || detect.run()));

    let stopper = {
        let registry = registry.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(400));
            registry.request_shutdown();
        })
    };

    let mut arbiter = ControlArbiter::new(&cfg, registry, tracking, axes.clone());
    let mut sink = RecordingSink::new();
    arbiter.run(&mut sink);

    stopper.join().unwrap();
    for h in handles {
        h.join().unwrap();
    }

    let dispatched = sink.count(|e| matches!(e, AppEvent::Dispatched { .. }));
    assert!(dispatched > 0, "an off-centre target must be chased");
    assert!(axes.pan.step_count() != 0 || axes.tilt.step_count() != 0);
    assert!(gpio.all_in_mode(&CoilPins::pan(), PinMode::Input));
    assert!(gpio.all_in_mode(&CoilPins::tilt(), PinMode::Input));
}
