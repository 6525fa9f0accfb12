//! Per-axis motion worker.
//!
//! Each axis has exactly one [`AxisWorker`] thread, which is the only owner
//! of that axis's [`StepSequencer`] and therefore of its coil pins. The
//! control loop reaches it through an [`AxisLink`]:
//!
//! ```text
//! ControlArbiter ──try_dispatch──▶ AxisLink (Channel<_, 1> + in-flight flag)
//!                                      │
//!                                      ▼
//!                                 AxisWorker ──▶ StepSequencer ──▶ GPIO
//! ```
//!
//! A link accepts one command at a time. From dispatch until the worker
//! finishes the rotation the link is *in flight*, and further dispatches
//! fail with [`DispatchError::Busy`] instead of queueing behind it. Pin
//! writes for one axis are therefore strictly serialized.

use core::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use core::time::Duration;
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embedded_hal::delay::DelayNs;
use futures_lite::future::block_on;
use log::{debug, info, warn};

use crate::app::mode::ModeRegistry;
use crate::app::ports::{GpioPort, MonotonicClock, MotionSink};
use crate::control::motion::{Axis, MotionCommand};
use crate::error::DispatchError;

use super::stepper::StepSequencer;

/// How long a worker waits for a command before re-checking `running`.
pub const DEFAULT_POLL: Duration = Duration::from_millis(50);

type CommandQueue = Channel<CriticalSectionRawMutex, MotionCommand, 1>;

/// Shared end of one axis: command slot plus published step count.
pub struct AxisLink {
    axis: Axis,
    queue: CommandQueue,
    in_flight: AtomicBool,
    steps: AtomicI64,
}

impl AxisLink {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            queue: Channel::new(),
            in_flight: AtomicBool::new(false),
            steps: AtomicI64::new(0),
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Hand a command to the worker without waiting. Fails while a previous
    /// command is queued or still rotating.
    pub fn try_dispatch(&self, command: MotionCommand) -> Result<(), DispatchError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DispatchError::Busy);
        }
        if self.queue.try_send(command).is_err() {
            self.in_flight.store(false, Ordering::Release);
            return Err(DispatchError::Busy);
        }
        Ok(())
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Signed step count last published by the worker.
    pub fn step_count(&self) -> i64 {
        self.steps.load(Ordering::Relaxed)
    }

    fn receive(&self, timeout: Duration) -> Option<MotionCommand> {
        let timeout = embassy_time::Duration::from_micros(timeout.as_micros() as u64);
        block_on(embassy_time::with_timeout(timeout, self.queue.receive())).ok()
    }

    fn finish(&self, steps: i64) {
        self.steps.store(steps, Ordering::Relaxed);
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Both axis links, as seen by the control loop.
#[derive(Clone)]
pub struct AxisPair {
    pub pan: Arc<AxisLink>,
    pub tilt: Arc<AxisLink>,
}

impl AxisPair {
    pub fn new() -> Self {
        Self {
            pan: Arc::new(AxisLink::new(Axis::Pan)),
            tilt: Arc::new(AxisLink::new(Axis::Tilt)),
        }
    }

    pub fn link(&self, axis: Axis) -> &Arc<AxisLink> {
        match axis {
            Axis::Pan => &self.pan,
            Axis::Tilt => &self.tilt,
        }
    }
}

impl Default for AxisPair {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionSink for AxisPair {
    fn try_dispatch(&self, axis: Axis, command: MotionCommand) -> Result<(), DispatchError> {
        self.link(axis).try_dispatch(command)
    }

    fn step_count(&self, axis: Axis) -> i64 {
        self.link(axis).step_count()
    }
}

pub struct AxisWorker<G, D, C> {
    link: Arc<AxisLink>,
    sequencer: StepSequencer<G, D, C>,
    registry: Arc<ModeRegistry>,
    poll: Duration,
}

impl<G, D, C> AxisWorker<G, D, C>
where
    G: GpioPort,
    D: DelayNs,
    C: MonotonicClock,
{
    pub fn new(
        link: Arc<AxisLink>,
        sequencer: StepSequencer<G, D, C>,
        registry: Arc<ModeRegistry>,
    ) -> Self {
        Self {
            link,
            sequencer,
            registry,
            poll: DEFAULT_POLL,
        }
    }

    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    /// Serve commands until the registry stops running, then release the
    /// coils. A rotation in progress always runs to its deadline.
    pub fn run(mut self) {
        let name = self.link.axis().name();
        info!("{} worker started on pins {}", name, self.sequencer.pins());

        while self.registry.is_running() {
            self.serve_one();
        }

        self.release();
        info!("{} worker stopped at {} steps", name, self.sequencer.count());
    }

    /// Wait up to one poll interval for a command and execute it.
    /// Returns `true` when a command was executed.
    pub fn serve_one(&mut self) -> bool {
        let Some(command) = self.link.receive(self.poll) else {
            return false;
        };
        self.execute(command);
        if self.link.queue.is_empty() {
            self.release();
        }
        true
    }

    pub fn sequencer(&self) -> &StepSequencer<G, D, C> {
        &self.sequencer
    }

    // ── Internal ──────────────────────────────────────────────

    fn execute(&mut self, command: MotionCommand) {
        let name = self.link.axis().name();
        let result = self.sequencer.start_drive().and_then(|()| {
            self.sequencer
                .rotate_for_duration(command.duration, command.step_delay, command.direction)
        });

        match result {
            Ok(steps) => debug!("{} rotated {} steps {:?}", name, steps, command.direction),
            Err(e) => {
                warn!("{} rotation failed: {}", name, e);
                self.release();
            }
        }
        self.link.finish(self.sequencer.count());
    }

    fn release(&mut self) {
        if let Err(e) = self.sequencer.stop_drive() {
            warn!("{} coil release failed: {}", self.link.axis().name(), e);
        }
    }
}
