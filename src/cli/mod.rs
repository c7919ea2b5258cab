//! CLI surface: argument definitions and the two subcommands.

mod args;
pub mod init;
pub mod run;

pub use args::{Cli, Commands};
