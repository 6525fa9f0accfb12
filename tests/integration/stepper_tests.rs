//! Integration tests for StepSequencer and AxisWorker against a recording GPIO.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::mock_hw::{FakeTime, GpioCall, RecordingGpio};

use facetrack::app::mode::ModeRegistry;
use facetrack::app::ports::{MotionSink, PinMode};
use facetrack::control::motion::{Axis, MotionCommand};
use facetrack::drivers::axis::{AxisPair, AxisWorker};
use facetrack::drivers::stepper::{Direction, HALF_STEP_TABLE, StepSequencer};
use facetrack::error::DispatchError;
use facetrack::pins::CoilPins;

type Seq = StepSequencer<RecordingGpio, FakeTime, FakeTime>;

fn sequencer(gpio: &RecordingGpio, pins: CoilPins) -> Seq {
    let time = FakeTime::new();
    StepSequencer::new(gpio.clone(), time.clone(), time, pins)
}

fn row_index(row: [u8; 4]) -> usize {
    HALF_STEP_TABLE
        .iter()
        .position(|r| *r == row)
        .unwrap_or_else(|| panic!("{row:?} is not a half-step row"))
}

#[test]
fn ten_forward_steps_land_on_row_two() {
    let gpio = RecordingGpio::new();
    let mut seq = sequencer(&gpio, CoilPins::pan());
    seq.rotate_by_steps(10, Duration::from_micros(900), Direction::Forward)
        .unwrap();

    assert_eq!(seq.position(), 2);
    assert_eq!(seq.count(), 10);
    let rows = gpio.rows(&CoilPins::pan());
    assert_eq!(rows.len(), 10);
    assert_eq!(*rows.last().unwrap(), HALF_STEP_TABLE[2]);
}

#[test]
fn backward_walks_table_in_reverse() {
    let gpio = RecordingGpio::new();
    let mut seq = sequencer(&gpio, CoilPins::tilt());
    seq.rotate_by_steps(8, Duration::from_micros(900), Direction::Backward)
        .unwrap();

    let order: Vec<usize> = gpio
        .rows(&CoilPins::tilt())
        .into_iter()
        .map(row_index)
        .collect();
    assert_eq!(order, [7, 6, 5, 4, 3, 2, 1, 0]);
}

#[test]
fn rotation_touches_only_own_pins() {
    let gpio = RecordingGpio::new();
    let mut seq = sequencer(&gpio, CoilPins::tilt());
    seq.start_drive().unwrap();
    seq.rotate_for_duration(
        Duration::from_millis(5),
        Duration::from_micros(800),
        Direction::Forward,
    )
    .unwrap();
    seq.stop_drive().unwrap();

    assert_eq!(gpio.written_pins(), CoilPins::tilt().as_array().to_vec());
    let releases = gpio
        .history()
        .into_iter()
        .filter(|c| matches!(c, GpioCall::Mode(_, PinMode::Input)))
        .count();
    assert_eq!(releases, 4);
}

#[test]
fn workers_serialize_each_axis() {
    let gpio = RecordingGpio::new();
    let registry = Arc::new(ModeRegistry::new());
    let axes = AxisPair::new();

    let mut handles = Vec::new();
    for (axis, pins) in [(Axis::Pan, CoilPins::pan()), (Axis::Tilt, CoilPins::tilt())] {
        let worker = AxisWorker::new(
            axes.link(axis).clone(),
            sequencer(&gpio, pins),
            registry.clone(),
        )
        .with_poll(Duration::from_millis(2));
        handles.push(std::thread::spawn(move || worker.run()));
    }

    let cmd = MotionCommand {
        direction: Direction::Forward,
        step_delay: Duration::from_micros(1000),
        duration: Duration::from_millis(6),
    };

    let mut accepted = 0;
    let deadline = Instant::now() + Duration::from_secs(2);
    while accepted < 6 && Instant::now() < deadline {
        for axis in Axis::ALL {
            match axes.try_dispatch(axis, cmd) {
                Ok(()) => accepted += 1,
                Err(DispatchError::Busy) => {}
            }
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    while (axes.pan.is_busy() || axes.tilt.is_busy()) && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(1));
    }
    registry.request_shutdown();
    for h in handles {
        h.join().unwrap();
    }

    assert!(accepted >= 6);
    assert_eq!(
        axes.step_count(Axis::Pan) + axes.step_count(Axis::Tilt),
        i64::from(accepted) * 6
    );

    // Every recorded row is a table row and consecutive rows are adjacent:
    // no interleaving from overlapping rotations.
    for pins in [CoilPins::pan(), CoilPins::tilt()] {
        let order: Vec<usize> = gpio.rows(&pins).into_iter().map(row_index).collect();
        for pair in order.windows(2) {
            assert!(
                pair[1] == pair[0] || pair[1] == (pair[0] + 1) % 8,
                "non-adjacent rows {pair:?}"
            );
        }
    }
}
