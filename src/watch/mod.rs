//! Watch orchestration.
//!
//! Two independent watch registrations feed one single-threaded event loop:
//!
//! - **source**: every `*.ts` under the workspace → full cycle
//!   (compile → post-process → pack → launch);
//! - **output**: the compiled `outFile` and the sprite sheet, watched
//!   directly → short cycle (skip the compile step).
//!
//! The split lets asset-only or output-only edits bypass compilation.
//! Per-cycle failures are logged and the loop keeps observing; the loop
//! itself runs until the host process is killed.

mod debouncer;

use crate::pipeline::{BuildPipeline, CycleKind};
use crate::process::ProcessSupervisor;
use crate::{debug, log, logger};
use anyhow::{Context, Result};
use debouncer::Debouncer;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};

/// One filesystem change, already classified by its watch registration.
///
/// The path is carried for logging only; within a tier every change
/// triggers the same downstream action (no content diffing).
pub struct WatchEvent {
    pub kind: CycleKind,
    pub path: PathBuf,
}

/// The watch-build-launch loop for one working directory.
pub struct WatchOrchestrator {
    pipeline: BuildPipeline,
    supervisor: ProcessSupervisor,
    rx: Receiver<WatchEvent>,
    // Watcher handles must be kept alive for the lifetime of the loop.
    _source_watcher: RecommendedWatcher,
    _output_watcher: RecommendedWatcher,
}

impl WatchOrchestrator {
    /// Attach both watch registrations. Events start buffering in the
    /// channel immediately, before the initial build runs.
    pub fn new(pipeline: BuildPipeline, out_file: PathBuf, spritesheet: PathBuf) -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        let source_watcher = source_registration(&pipeline.workdir, tx.clone())?;
        let output_watcher = output_registration(&[out_file, spritesheet], tx)?;

        Ok(Self {
            pipeline,
            supervisor: ProcessSupervisor::new(),
            rx,
            _source_watcher: source_watcher,
            _output_watcher: output_watcher,
        })
    }

    /// Run until the host process is killed. The initial full build runs
    /// once watching is attached (so edits during it are not lost).
    pub fn run(mut self) -> Result<()> {
        log!("watch"; "watching {} (Ctrl-C to quit)", self.pipeline.workdir.display());

        let mut debouncer = Debouncer::new();
        self.execute(CycleKind::Full);
        // Arm the cooldown so the initial compile's own output write is not
        // taken for a user edit.
        debouncer.cycle_finished();

        loop {
            match self.rx.recv_timeout(debouncer.sleep_duration()) {
                Ok(event) => {
                    debug!("watch"; "change: {}", event.path.display());
                    debouncer.add(event.kind);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if let Some(kind) = debouncer.take_if_ready() {
                        self.execute(kind);
                        debouncer.cycle_finished();
                    }
                }
                // Both watchers dropped; cannot happen while self is alive,
                // but ends the loop cleanly if it ever does.
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }
    }

    /// Run one cycle with failure isolation: errors are reported and the
    /// watch registrations stay active for the next change event.
    fn execute(&mut self, kind: CycleKind) {
        match self.pipeline.run_cycle(kind, &mut self.supervisor) {
            Ok(()) => logger::status_success(match kind {
                CycleKind::Full => "rebuilt (full)",
                CycleKind::SkipCompile => "rebuilt (no compile)",
            }),
            Err(e) => logger::status_error(&format!("{} failed", e.step()), &e.to_string()),
        }
    }
}

// ============================================================================
// Watch registrations
// ============================================================================

/// Source tier: the whole workspace, recursive, `*.ts` files only.
fn source_registration(workdir: &Path, tx: Sender<WatchEvent>) -> Result<RecommendedWatcher> {
    let mut watcher =
        notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
            Ok(event) if is_relevant(&event) => {
                for path in &event.paths {
                    if is_source_path(path) {
                        let _ = tx.send(WatchEvent {
                            kind: CycleKind::Full,
                            path: path.clone(),
                        });
                    }
                }
            }
            Ok(_) => {}
            Err(e) => log!("watch"; "notify error: {e}"),
        })?;
    watcher
        .watch(workdir, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", workdir.display()))?;
    Ok(watcher)
}

/// Output tier: exact target files, matched against their parent dirs.
///
/// The targets may not exist yet (first build), so their parents are
/// watched non-recursively and events are filtered to exact paths.
fn output_registration(targets: &[PathBuf], tx: Sender<WatchEvent>) -> Result<RecommendedWatcher> {
    let watched = targets.to_vec();
    let mut watcher =
        notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
            Ok(event) if is_relevant(&event) => {
                for path in &event.paths {
                    if watched.iter().any(|t| path == t) {
                        let _ = tx.send(WatchEvent {
                            kind: CycleKind::SkipCompile,
                            path: path.clone(),
                        });
                    }
                }
            }
            Ok(_) => {}
            Err(e) => log!("watch"; "notify error: {e}"),
        })?;

    let mut parents: Vec<&Path> = targets.iter().filter_map(|t| t.parent()).collect();
    parents.sort_unstable();
    parents.dedup();
    for parent in parents {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
        watcher
            .watch(parent, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", parent.display()))?;
    }
    Ok(watcher)
}

// ============================================================================
// Event classification
// ============================================================================

/// Content-bearing events only; metadata churn (mtime/chmod) is noise
/// that can cause endless rebuild loops.
fn is_relevant(event: &notify::Event) -> bool {
    use notify::EventKind;
    match event.kind {
        EventKind::Create(_) => true,
        EventKind::Modify(modify) => !matches!(modify, notify::event::ModifyKind::Metadata(_)),
        _ => false,
    }
}

/// TypeScript source file, excluding editor artifacts.
fn is_source_path(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "ts") && !is_temp_file(path)
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

// ============================================================================
// Tests
// ============================================================================
