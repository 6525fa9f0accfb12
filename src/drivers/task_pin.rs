//! Named task spawning.
//!
//! Every long-running loop (capture, detection, control, ingestion, axis
//! workers) gets its own OS thread with an explicit name and stack size.
//! Spawn failure is a resource-acquisition error and is reported rather
//! than panicking, so startup can fail cleanly.

use std::thread::JoinHandle;

use crate::error::{Error, Result};

/// Spawn `f` on a named thread with `stack_kb` KiB of stack.
pub fn spawn_task(
    name: &'static str,
    stack_kb: usize,
    f: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>> {
    log::info!("Spawning '{}' (stack={}KB)", name, stack_kb);

    std::thread::Builder::new()
        .name(name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
        .map_err(|e| {
            log::error!("Task '{}' failed to spawn: {}", name, e);
            Error::Init("task spawn failed")
        })
}
