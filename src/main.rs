//! tspico8 - a TypeScript build pipeline for PICO-8 cartridges.

#![allow(dead_code)]

mod cli;
mod config;
mod embed;
mod error;
mod exec;
mod logger;
mod minify;
mod pico8;
mod pipeline;
mod process;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    match &cli.command {
        Commands::Init { dir, yes } => {
            let target = dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(cli::init::DEFAULT_WORKSPACE));
            cli::init::init_workspace(&target, *yes)
        }
        Commands::Run { dir, wait_pack } => {
            let dir = dir.as_deref().unwrap_or(Path::new("."));
            cli::run::run_watch(dir, *wait_pack)
        }
    }
}
