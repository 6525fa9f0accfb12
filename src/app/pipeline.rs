//! Capture and detection tasks.
//!
//! ```text
//! FrameSource ──▶ CaptureTask ──▶ FrameChannel ──▶ DetectTask ──▶ TrackingState
//!                 (every capture_period)           (on publish)
//! ```
//!
//! Neither task ever blocks the control loop. A fetch error skips one
//! capture period; a slow detector loses frames to overwrite.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::mailbox::{Detection, FrameChannel, TrackingState};
use super::mode::ModeRegistry;
use super::ports::{BoundingBox, FaceDetector, FrameSource};
use crate::error::SourceError;

/// Pick the widest box scoring at least `min_score` and normalize its
/// centre by the frame size. `NoFace` when nothing qualifies.
pub fn locate_face(boxes: &[BoundingBox], width: u32, height: u32, min_score: f32) -> Detection {
    if width == 0 || height == 0 {
        return Detection::NoFace;
    }

    let best = boxes
        .iter()
        .filter(|b| b.score >= min_score)
        .max_by(|a, b| a.width().total_cmp(&b.width()));

    match best {
        Some(b) => {
            let (cx, cy) = b.center();
            Detection::Face {
                x: (cx / width as f32).clamp(0.0, 1.0),
                y: (cy / height as f32).clamp(0.0, 1.0),
            }
        }
        None => Detection::NoFace,
    }
}

// ───────────────────────────────────────────────────────────────
// Capture
// ───────────────────────────────────────────────────────────────

pub struct CaptureTask<S> {
    source: S,
    frames: Arc<FrameChannel>,
    registry: Arc<ModeRegistry>,
    period: Duration,
    expected_len: Option<usize>,
    failures: u64,
}

impl<S: FrameSource> CaptureTask<S> {
    pub fn new(
        source: S,
        frames: Arc<FrameChannel>,
        registry: Arc<ModeRegistry>,
        period: Duration,
    ) -> Self {
        Self {
            source,
            frames,
            registry,
            period,
            expected_len: None,
            failures: 0,
        }
    }

    /// Reject frames whose byte length differs from `len`.
    pub fn with_expected_len(mut self, len: usize) -> Self {
        self.expected_len = Some(len);
        self
    }

    pub fn run(mut self) {
        info!("Capture task started ({} ms period)", self.period.as_millis());
        while self.registry.is_running() {
            let started = Instant::now();
            self.capture_once();
            std::thread::sleep(self.period.saturating_sub(started.elapsed()));
        }
        info!("Capture task stopped ({} failed fetches)", self.failures);
    }

    /// Fetch one frame and publish it. Returns `false` if the fetch failed.
    pub fn capture_once(&mut self) -> bool {
        let fetched = self.source.fetch().and_then(|frame| match self.expected_len {
            Some(expected) if frame.bytes().len() != expected => Err(SourceError::WrongSize {
                expected,
                got: frame.bytes().len(),
            }),
            _ => Ok(frame),
        });

        match fetched {
            Ok(frame) => {
                self.frames.publish(frame);
                true
            }
            Err(e) => {
                self.failures += 1;
                warn!("Frame fetch failed: {}", e);
                false
            }
        }
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}

// ───────────────────────────────────────────────────────────────
// Detection
// ───────────────────────────────────────────────────────────────

pub struct DetectTask<F> {
    detector: F,
    frames: Arc<FrameChannel>,
    tracking: Arc<TrackingState>,
    registry: Arc<ModeRegistry>,
    min_score: f32,
    poll: Duration,
}

impl<F: FaceDetector> DetectTask<F> {
    pub fn new(
        detector: F,
        frames: Arc<FrameChannel>,
        tracking: Arc<TrackingState>,
        registry: Arc<ModeRegistry>,
        min_score: f32,
    ) -> Self {
        Self {
            detector,
            frames,
            tracking,
            registry,
            min_score,
            poll: Duration::from_millis(100),
        }
    }

    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    pub fn run(mut self) {
        info!("Detection task started (min score {:.2})", self.min_score);
        while self.registry.is_running() {
            self.detect_once();
        }
        info!("Detection task stopped");
    }

    /// Wait up to one poll interval for a frame and publish a detection
    /// for it. Returns `true` when a frame was processed.
    pub fn detect_once(&mut self) -> bool {
        let Some(frame) = self.frames.wait_timeout(self.poll) else {
            return false;
        };

        let boxes = self.detector.detect(&frame);
        let detection = locate_face(&boxes, frame.width(), frame.height(), self.min_score);
        debug!(
            "frame {}: {} boxes -> {:?}",
            frame.seq(),
            boxes.len(),
            detection
        );
        self.tracking.publish(detection);
        true
    }
}
