//! Runtime process supervision.
//!
//! At most one runtime instance is tracked at a time. Each successful
//! build cycle replaces the tracked handle: the previous process gets a
//! termination signal and the replacement is spawned without waiting for
//! the old one to die. Exits are observed later, non-blocking, via
//! [`ProcessSupervisor::reap`].

use crate::error::PipelineError;
use crate::{debug, log};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Child, Command};

/// Ownership record for one live runtime process.
struct SupervisedProcess {
    child: Child,
    generation: u64,
}

/// Owns the single cross-cycle process handle.
#[derive(Default)]
pub struct ProcessSupervisor {
    current: Option<SupervisedProcess>,
    /// Killed-but-unreaped children; waited on opportunistically.
    graveyard: Vec<Child>,
    next_generation: u64,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a replacement runtime, terminating any tracked instance first.
    ///
    /// Termination is requested, not waited upon; the new process starts
    /// immediately. Returns the new handle's generation.
    pub fn launch(&mut self, program: &Path, args: &[OsString]) -> Result<u64, PipelineError> {
        self.terminate_current();

        let child = Command::new(program)
            .args(args)
            .spawn()
            .map_err(|e| PipelineError::LaunchFailed(program.to_path_buf(), e))?;

        self.next_generation += 1;
        let generation = self.next_generation;
        debug!("pico8"; "spawned pid {} (generation {})", child.id(), generation);
        self.current = Some(SupervisedProcess { child, generation });
        Ok(generation)
    }

    /// Request termination of the tracked instance, if any.
    ///
    /// The handle moves to the graveyard so its exit can still be reaped;
    /// bookkeeping for "current" is cleared right away.
    pub fn terminate_current(&mut self) {
        if let Some(proc) = self.current.take() {
            log!("pico8"; "killing old pid {}", proc.child.id());
            let mut child = proc.child;
            child.kill().ok();
            self.graveyard.push(child);
        }
    }

    /// Non-blocking exit collection.
    ///
    /// Exit notifications only update bookkeeping; the tracked handle is
    /// cleared only when the generation recorded at observation time still
    /// matches, so a reap can never clobber a newer launch.
    pub fn reap(&mut self) {
        if let Some(observed) = self.current.as_ref().map(|p| p.generation) {
            let status = self
                .current
                .as_mut()
                .and_then(|p| p.child.try_wait().ok().flatten());
            if let Some(status) = status
                && self.current.as_ref().is_some_and(|p| p.generation == observed)
            {
                match status.code() {
                    Some(0) | None => debug!("pico8"; "process exited"),
                    Some(code) => log!("pico8"; "process exited with code {code}"),
                }
                self.current = None;
            }
        }

        self.graveyard
            .retain_mut(|child| !matches!(child.try_wait(), Ok(Some(_))));
    }

    /// Whether a runtime instance is currently tracked.
    pub fn has_current(&self) -> bool {
        self.current.is_some()
    }

    /// Generation of the tracked instance, if any.
    pub fn current_generation(&self) -> Option<u64> {
        self.current.as_ref().map(|p| p.generation)
    }
}

// ============================================================================
// Tests
// ============================================================================
