//! Console output for the pipeline.
//!
//! Two layers:
//! - `log!`/`debug!` print one line with a colored step prefix
//!   (`[compile]`, `[pico8]`, ...); `debug!` is gated on `--verbose`.
//! - a global [`WatchStatus`] block shows the outcome of the latest build
//!   cycle, overwriting the previous outcome so the terminal shows one
//!   status per rebuild instead of an ever-growing scroll.

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::LazyLock,
    sync::atomic::{AtomicBool, Ordering},
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally (from the `--verbose` CLI flag).
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Log a message with a colored step prefix.
///
/// ```ignore
/// log!("compile"; "compiling TypeScript in {}", dir.display());
/// ```
#[macro_export]
macro_rules! log {
    ($step:expr; $($arg:tt)*) => {{
        $crate::logger::log($step, &format!($($arg)*))
    }};
}

/// Like `log!`, but only under `--verbose`.
#[macro_export]
macro_rules! debug {
    ($step:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($step, &format!($($arg)*))
        }
    }};
}

pub fn log(step: &str, message: &str) {
    let tag = format!("[{step}]");
    // Step prefixes get stable colors so the pipeline stages are easy to
    // tell apart while the watch loop scrolls.
    let prefix = match step {
        "watch" => tag.bright_green().bold().to_string(),
        "pico8" => tag.bright_blue().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        _ => tag.bright_yellow().bold().to_string(),
    };

    let mut out = stdout().lock();
    execute!(out, Clear(ClearType::UntilNewLine)).ok();
    writeln!(out, "{prefix} {message}").ok();
    out.flush().ok();
}

// ============================================================================
// Watch status block
// ============================================================================

/// Cycle-outcome display that overwrites its previous output.
pub struct WatchStatus {
    /// Height of the block printed last time, so it can be cleared.
    last_lines: usize,
}

static WATCH_STATUS: LazyLock<Mutex<WatchStatus>> =
    LazyLock::new(|| Mutex::new(WatchStatus { last_lines: 0 }));

impl WatchStatus {
    fn emit(&mut self, glyph: String, body: &str) {
        let mut out = stdout().lock();

        if self.last_lines > 0 {
            #[allow(clippy::cast_possible_truncation)]
            execute!(out, cursor::MoveUp(self.last_lines as u16)).ok();
            execute!(out, Clear(ClearType::FromCursorDown)).ok();
        }

        let stamp = format!("[{}]", clock()).dimmed().to_string();
        writeln!(out, "{stamp} {glyph} {body}").ok();
        out.flush().ok();

        self.last_lines = body.lines().count().max(1);
    }
}

/// Report a finished cycle.
pub fn status_success(message: &str) {
    WATCH_STATUS.lock().emit("✓".green().to_string(), message);
}

/// Report a failed cycle, with the error detail on following lines.
pub fn status_error(summary: &str, detail: &str) {
    let body = if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{detail}")
    };
    WATCH_STATUS.lock().emit("✗".red().to_string(), &body);
}

/// Wall-clock HH:MM:SS (UTC).
fn clock() -> String {
    use std::time::SystemTime;
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{:02}:{:02}:{:02}", (secs / 3600) % 24, (secs / 60) % 60, secs % 60)
}

// ============================================================================
// Tests
// ============================================================================
