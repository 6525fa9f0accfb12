//! Single-slot, latest-value-wins mailboxes between tasks.
//!
//! Uses an `embassy-sync` [`Signal`] as the slot: publishing replaces any
//! unread value, taking clears the ready flag. The value moves in and out
//! whole under a critical section, so a reader never observes a mix of two
//! publications.
//!
//! ```text
//! ┌──────────────┐  Frame   ┌──────────────┐ Detection ┌──────────────┐
//! │ Capture task │─────────▶│ Detect task  │──────────▶│ Control loop │
//! └──────────────┘  (slot)  └──────────────┘  (slot)   └──────────────┘
//! ```
//!
//! There is no queue behind either slot: a slow consumer loses the older
//! values, which is the wanted behaviour (freshness over completeness).

use core::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future::block_on;

use crate::error::SourceError;

// ───────────────────────────────────────────────────────────────
// Generic slot
// ───────────────────────────────────────────────────────────────

/// One-slot mailbox with overwrite-on-publish semantics.
pub struct Mailbox<T: Send> {
    slot: Signal<CriticalSectionRawMutex, T>,
}

impl<T: Send> Mailbox<T> {
    pub const fn new() -> Self {
        Self {
            slot: Signal::new(),
        }
    }

    /// Store `value`, silently replacing any unread one.
    pub fn publish(&self, value: T) {
        self.slot.signal(value);
    }

    /// Take the pending value, clearing the ready flag. Never blocks.
    pub fn take(&self) -> Option<T> {
        self.slot.try_take()
    }

    /// Whether a value is waiting.
    pub fn is_ready(&self) -> bool {
        self.slot.signaled()
    }

    /// Block until a value is published or `timeout` passes.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<T> {
        let timeout = embassy_time::Duration::from_micros(timeout.as_micros() as u64);
        block_on(embassy_time::with_timeout(timeout, self.slot.wait())).ok()
    }
}

impl<T: Send> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Frames
// ───────────────────────────────────────────────────────────────

/// One raw BGR frame (width × height × 3 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    seq: u64,
    width: u32,
    height: u32,
    data: Box<[u8]>,
}

impl Frame {
    /// Wrap raw bytes, checking the length against the dimensions.
    pub fn new(seq: u64, width: u32, height: u32, data: Vec<u8>) -> Result<Self, SourceError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(SourceError::WrongSize {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            seq,
            width,
            height,
            data: data.into_boxed_slice(),
        })
    }

    /// Producer-assigned sequence number.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// BGR triple at pixel (`x`, `y`).
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

/// Capture → detection hand-off.
pub type FrameChannel = Mailbox<Frame>;

// ───────────────────────────────────────────────────────────────
// Tracking state
// ───────────────────────────────────────────────────────────────

/// Result of running the detector on one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Detection {
    /// Face centre, normalized to [0, 1] on both axes.
    Face { x: f32, y: f32 },
    /// The detector found nothing above threshold.
    NoFace,
}

/// Detection → control loop hand-off. A pending value is the "valid" flag;
/// the arbiter clears it by taking.
pub type TrackingState = Mailbox<Detection>;
