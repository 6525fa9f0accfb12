//! Line-oriented command ingestion.
//!
//! Reads one JSON [`RemoteCommand`] per line and applies it to the shared
//! [`ModeRegistry`]. On the host binary this is wired to stdin and stands
//! in for the HTTP control plane. Bad lines are logged and skipped.

use std::io::BufRead;
use std::sync::Arc;

use log::{info, warn};

use crate::app::commands::RemoteCommand;
use crate::app::mode::ModeRegistry;

pub struct CommandReader<R> {
    reader: R,
    registry: Arc<ModeRegistry>,
    shutdown_on_eof: bool,
}

impl<R: BufRead> CommandReader<R> {
    pub fn new(reader: R, registry: Arc<ModeRegistry>) -> Self {
        Self {
            reader,
            registry,
            shutdown_on_eof: false,
        }
    }

    /// Request shutdown when the input closes.
    pub fn shutdown_on_eof(mut self, enabled: bool) -> Self {
        self.shutdown_on_eof = enabled;
        self
    }

    /// Apply commands until end of input, a read error, or shutdown.
    /// Returns the number of commands applied.
    pub fn run(mut self) -> usize {
        let mut applied = 0;
        let mut line = String::new();

        while self.registry.is_running() {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    info!("Command input closed");
                    if self.shutdown_on_eof {
                        self.registry.request_shutdown();
                    }
                    break;
                }
                Ok(_) => {
                    if self.handle_line(&line) {
                        applied += 1;
                    }
                }
                Err(e) => {
                    warn!("Command input failed: {}", e);
                    break;
                }
            }
        }
        applied
    }

    fn handle_line(&self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return false;
        }
        match RemoteCommand::parse(line) {
            Ok(command) => {
                self.registry.apply(&command);
                true
            }
            Err(e) => {
                warn!("Ignoring command {:?}: {}", line, e);
                false
            }
        }
    }
}
