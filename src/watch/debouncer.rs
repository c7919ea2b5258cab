use crate::pipeline::CycleKind;
use std::time::{Duration, Instant};

pub(super) const DEBOUNCE_MS: u64 = 300;
pub(super) const REBUILD_COOLDOWN_MS: u64 = 800;

/// Pure debouncer: timing and cycle-kind merging only.
///
/// Events within the debounce window coalesce into one pending cycle; a
/// full-rebuild request always dominates a skip-compile one. A cooldown
/// after each completed cycle swallows the output-tier echo produced by
/// our own compile/write (the compiler writing `outFile` is itself a
/// change on the output watch).
pub(super) struct Debouncer {
    pending: Option<CycleKind>,
    last_event: Option<Instant>,
    last_cycle: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            pending: None,
            last_event: None,
            last_cycle: None,
        }
    }

    /// Merge a change event into the pending cycle.
    pub(super) fn add(&mut self, kind: CycleKind) {
        // Echo guard: an output-only change right after a completed cycle
        // is our own artifact write, not a user edit.
        if kind == CycleKind::SkipCompile
            && let Some(last) = self.last_cycle
            && last.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS)
        {
            return;
        }

        self.pending = Some(match (self.pending, kind) {
            (Some(CycleKind::Full), _) | (_, CycleKind::Full) => CycleKind::Full,
            _ => CycleKind::SkipCompile,
        });
        self.last_event = Some(Instant::now());
    }

    /// Take the pending cycle if the debounce window has elapsed.
    pub(super) fn take_if_ready(&mut self) -> Option<CycleKind> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        self.pending.take()
    }

    /// Arm the echo-suppression cooldown; called after a cycle completes.
    pub(super) fn cycle_finished(&mut self) {
        self.last_cycle = Some(Instant::now());
    }

    fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };
        if last_event.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
            return false;
        }
        self.pending.is_some()
    }

    /// Precise sleep duration until the next possible ready time.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        Duration::from_millis(DEBOUNCE_MS)
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}
