//! Simulated camera and detector for host runs.
//!
//! [`SimCamera`] renders a bright square drifting across a dark frame;
//! [`ThresholdDetector`] reports the bounding box of every pixel brighter
//! than its threshold. Together they stand in for the camera transport and
//! the face model so the binary exercises the whole loop on a desktop.

use crate::app::mailbox::Frame;
use crate::app::ports::{BoundingBox, Detections, FaceDetector, FrameSource};
use crate::error::SourceError;

const BACKGROUND: u8 = 16;
const TARGET: u8 = 240;

pub struct SimCamera {
    width: u32,
    height: u32,
    side: u32,
    seq: u64,
    /// Frames per full sweep of the path.
    period: u64,
}

impl SimCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            side: (width.min(height) / 6).max(1),
            seq: 0,
            period: 100,
        }
    }

    pub fn with_period(mut self, frames: u64) -> Self {
        self.period = frames.max(1);
        self
    }

    /// Top-left corner of the square in frame `seq`.
    pub fn target_origin(&self, seq: u64) -> (u32, u32) {
        let span_x = self.width.saturating_sub(self.side);
        let span_y = self.height.saturating_sub(self.side);
        let phase = (seq % self.period) as f32 / self.period as f32 * core::f32::consts::TAU;
        let x = (phase.cos() * 0.5 + 0.5) * span_x as f32;
        let y = ((phase * 2.0).sin() * 0.5 + 0.5) * span_y as f32;
        (x.round() as u32, y.round() as u32)
    }
}

impl FrameSource for SimCamera {
    fn fetch(&mut self) -> Result<Frame, SourceError> {
        self.seq += 1;
        let (ox, oy) = self.target_origin(self.seq);
        let mut data = vec![BACKGROUND; self.width as usize * self.height as usize * 3];

        for y in oy..(oy + self.side).min(self.height) {
            let row = y as usize * self.width as usize;
            for x in ox..(ox + self.side).min(self.width) {
                let i = (row + x as usize) * 3;
                data[i..i + 3].fill(TARGET);
            }
        }
        Frame::new(self.seq, self.width, self.height, data)
    }
}

/// Bounding box of bright pixels, scored by how filled the box is.
pub struct ThresholdDetector {
    threshold: u8,
}

impl ThresholdDetector {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }
}

impl Default for ThresholdDetector {
    fn default() -> Self {
        Self::new(128)
    }
}

impl FaceDetector for ThresholdDetector {
    fn detect(&mut self, frame: &Frame) -> Detections {
        let mut out = Detections::new();
        let (mut x1, mut y1, mut x2, mut y2) = (u32::MAX, u32::MAX, 0, 0);
        let mut hits = 0u32;

        for y in 0..frame.height() {
            for x in 0..frame.width() {
                let [b, g, r] = frame.pixel(x, y);
                let luma = (u16::from(b) + u16::from(g) + u16::from(r)) / 3;
                if luma >= u16::from(self.threshold) {
                    hits += 1;
                    x1 = x1.min(x);
                    y1 = y1.min(y);
                    x2 = x2.max(x + 1);
                    y2 = y2.max(y + 1);
                }
            }
        }

        if hits > 0 {
            let area = (x2 - x1) * (y2 - y1);
            let _ = out.push(BoundingBox {
                x1: x1 as f32,
                y1: y1 as f32,
                x2: x2 as f32,
                y2: y2 as f32,
                score: hits as f32 / area as f32,
            });
        }
        out
    }
}
