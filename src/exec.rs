//! External command execution.
//!
//! Provides a Builder-based API for running external tools, either blocking
//! (compiler) or fire-and-continue (cartridge packer).
//!
//! # Examples
//!
//! ```ignore
//! use crate::exec::Cmd;
//!
//! // Blocking, captures output
//! let output = Cmd::new("tsc").cwd(workdir).run()?;
//!
//! // Fire-and-continue: spawn and move on
//! let child = Cmd::new("jspicl-cli")
//!     .args(["--input", "build/compressed.js"])
//!     .cwd(workdir)
//!     .spawn()?;
//! ```

use std::{
    ffi::{OsStr, OsString},
    io,
    path::{Path, PathBuf},
    process::{Child, Command, Output, Stdio},
};

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Create from a command array (e.g., `["tsc"]` or `["npx", "tsc"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        let args: Vec<_> = iter.map(|s| s.as_ref().to_owned()).collect();
        Self {
            program,
            args,
            ..Default::default()
        }
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if !arg.is_empty() {
                self.args.push(arg.to_owned());
            }
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Get the program name for error messages.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Execute the command, blocking until it exits, capturing output.
    ///
    /// The exit status is NOT checked here; callers inspect
    /// `output.status` and map failures to their own error type.
    pub fn run(self) -> io::Result<Output> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd.output()
    }

    /// Spawn the command detached (fire-and-continue).
    ///
    /// Stdout/stderr are inherited so the tool's own narration stays
    /// visible; the caller decides whether to ever wait on the child.
    pub fn spawn(self) -> io::Result<Child> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd.spawn()
    }
}

/// Format diagnostic output for a failed command.
///
/// Joins stderr and stdout (the TypeScript compiler reports errors on
/// stdout) into one trimmed block.
pub fn format_failure(name: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let mut msg = format!("command `{name}` failed with {}", output.status);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        msg.push('\n');
        msg.push_str(stderr);
    }
    let stdout = stdout.trim();
    if !stdout.is_empty() {
        msg.push('\n');
        msg.push_str(stdout);
    }
    msg
}

// ============================================================================
// Tests
// ============================================================================
