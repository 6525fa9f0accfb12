//! FaceTrack: Main Entry Point
//!
//! Hexagonal architecture, one thread per task.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimCamera      ThresholdDetector   KeyValueConfig  StdClock   │
//! │  (FrameSource)  (FaceDetector)      (ConfigPort)    StdDelay   │
//! │  SimGpio        LogEventSink        CommandReader (stdin)      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  capture ─▶ FrameChannel ─▶ detect ─▶ TrackingState            │
//! │                                            │                   │
//! │  ModeRegistry ─────────────────▶ ControlArbiter (main thread)  │
//! │                                   │            │               │
//! │                             pan worker    tilt worker          │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};

use facetrack::adapters::hardware::SimGpio;
use facetrack::adapters::key_value::KeyValueConfig;
use facetrack::adapters::log_sink::LogEventSink;
use facetrack::adapters::sim_camera::{SimCamera, ThresholdDetector};
use facetrack::adapters::stdin_commands::CommandReader;
use facetrack::adapters::time::{StdClock, StdDelay};
use facetrack::app::arbiter::ControlArbiter;
use facetrack::app::mailbox::{FrameChannel, TrackingState};
use facetrack::app::mode::{Mode, ModeRegistry};
use facetrack::app::pipeline::{CaptureTask, DetectTask};
use facetrack::app::ports::ConfigPort;
use facetrack::control::motion::Axis;
use facetrack::drivers::axis::{AxisPair, AxisWorker};
use facetrack::drivers::stepper::StepSequencer;
use facetrack::drivers::task_pin::spawn_task;
use facetrack::error::Error;
use facetrack::pins::CoilPins;

// ── Task stack sizes (KiB) ────────────────────────────────────
const AXIS_STACK_KB: usize = 64;
const CAPTURE_STACK_KB: usize = 256;
const DETECT_STACK_KB: usize = 256;
const INGEST_STACK_KB: usize = 64;

#[derive(Debug, Parser)]
#[command(version, about = "Pan/tilt face tracker")]
struct Args {
    /// key=value configuration file (kp, ki, kd required).
    #[arg(short, long, env = "FACETRACK_CONFIG", default_value = "facetrack.conf")]
    config: PathBuf,

    /// Mode to start in: idle, auto_track or manual.
    #[arg(long, default_value = "idle", value_parser = parse_mode)]
    mode: Mode,

    /// Stop every task when stdin closes.
    #[arg(long)]
    exit_on_eof: bool,

    /// Frames per sweep of the simulated target.
    #[arg(long, default_value_t = 100)]
    sim_period: u64,
}

fn parse_mode(raw: &str) -> Result<Mode, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_owned()))
        .map_err(|_| format!("unknown mode '{raw}'"))
}

const BANNER_WIDTH: usize = 38;

/// Boxed start-up title, padded to a fixed inner width.
fn banner(version: &str) -> [String; 3] {
    let rule = "═".repeat(BANNER_WIDTH);
    let title = format!("  FaceTrack v{version}");
    [
        format!("╔{rule}╗"),
        format!("║{title:<width$}║", width = BANNER_WIDTH),
        format!("╚{rule}╝"),
    ]
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Logging + CLI ──────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    for line in banner(env!("CARGO_PKG_VERSION")) {
        info!("{}", line);
    }

    // ── 2. Configuration (fatal on error) ─────────────────────
    let config = KeyValueConfig::new(&args.config)
        .load()
        .map_err(Error::from)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let sys = config.system.clone();

    let pan_pins = CoilPins::pan();
    let tilt_pins = CoilPins::tilt();
    if pan_pins.overlaps(&tilt_pins) {
        bail!("pan pins {} overlap tilt pins {}", pan_pins, tilt_pins);
    }

    // ── 3. Shared state ───────────────────────────────────────
    let registry = Arc::new(ModeRegistry::new());
    registry.set_mode(args.mode);
    let frames = Arc::new(FrameChannel::new());
    let tracking = Arc::new(TrackingState::new());
    let axes = AxisPair::new();
    let gpio = SimGpio::new();

    // ── 4. Tasks ──────────────────────────────────────────────
    let mut handles: Vec<JoinHandle<()>> = Vec::new();

    for (axis, pins, name) in [
        (Axis::Pan, pan_pins, "axis-pan"),
        (Axis::Tilt, tilt_pins, "axis-tilt"),
    ] {
        let sequencer = StepSequencer::new(gpio.clone(), StdDelay, StdClock::new(), pins);
        let worker = AxisWorker::new(axes.link(axis).clone(), sequencer, registry.clone());
        handles.push(spawn_task(name, AXIS_STACK_KB, move || worker.run())?);
    }

    let camera = SimCamera::new(sys.frame_width, sys.frame_height).with_period(args.sim_period);
    let capture = CaptureTask::new(
        camera,
        frames.clone(),
        registry.clone(),
        Duration::from_millis(u64::from(sys.capture_period_ms)),
    )
    .with_expected_len(sys.frame_len());
    handles.push(spawn_task("capture", CAPTURE_STACK_KB, move || capture.run())?);

    let detect = DetectTask::new(
        ThresholdDetector::default(),
        frames,
        tracking.clone(),
        registry.clone(),
        sys.min_detection_score,
    );
    handles.push(spawn_task("detect", DETECT_STACK_KB, move || detect.run())?);

    // Blocks on stdin, so it is never joined.
    let ingest_registry = registry.clone();
    let exit_on_eof = args.exit_on_eof;
    spawn_task("ingest", INGEST_STACK_KB, move || {
        let applied = CommandReader::new(std::io::stdin().lock(), ingest_registry)
            .shutdown_on_eof(exit_on_eof)
            .run();
        info!("Ingestion finished ({} commands)", applied);
    })?;

    // ── 5. Control loop (main thread) ─────────────────────────
    let mut arbiter = ControlArbiter::new(&config, registry, tracking, axes);
    arbiter.run(&mut LogEventSink::new());

    for handle in handles {
        let name = handle.thread().name().unwrap_or("?").to_owned();
        if handle.join().is_err() {
            warn!("Task '{}' panicked", name);
        }
    }

    info!("Shutdown complete");
    Ok(())
}
