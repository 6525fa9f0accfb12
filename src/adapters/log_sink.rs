//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade. Per-dispatch events are noisy at a 5 Hz tick, so they
//! go out at debug level; everything else is info.

use log::{debug, info};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                let face = t
                    .last_face
                    .map(|(x, y)| format!("({x:.2},{y:.2})"))
                    .unwrap_or_else(|| "-".into());
                info!(
                    "TELEM | mode={:?} | ticks={} | pan={} tilt={} | sent={} dropped={} | face={}",
                    t.mode, t.ticks, t.pan_steps, t.tilt_steps, t.dispatched, t.dropped, face,
                );
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE | {:?} -> {:?}", from, to);
            }
            AppEvent::Dispatched { axis, command } => {
                debug!(
                    "MOVE | {} {:?} delay={}us for {}ms",
                    axis.name(),
                    command.direction,
                    command.step_delay.as_micros(),
                    command.duration.as_millis()
                );
            }
            AppEvent::DispatchDropped { axis } => {
                debug!("MOVE | {} busy, dropped", axis.name());
            }
            AppEvent::FaceLost => {
                debug!("FACE | none");
            }
            AppEvent::Started(mode) => {
                info!("START | initial_mode={:?}", mode);
            }
            AppEvent::Stopped => {
                info!("STOP");
            }
        }
    }
}
