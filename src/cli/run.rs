//! The `run` subcommand: startup validation and watch-loop entry.

use crate::config::{PipelineConfig, ProjectConfig};
use crate::pipeline::{BuildPipeline, absolute_workdir};
use crate::watch::WatchOrchestrator;
use crate::{config, debug, log};
use anyhow::{Context, Result, bail};
use std::path::Path;

pub fn run_watch(dir: &Path, wait_pack: bool) -> Result<()> {
    let workdir = absolute_workdir(dir)?;

    // Both config documents must load before watching starts; inside the
    // loop they are re-read per cycle and failures stay non-fatal.
    let project = ProjectConfig::load(&workdir)
        .with_context(|| format!("invalid workspace at {}", workdir.display()))?;
    let pipeline_config = PipelineConfig::load(&workdir)?;
    validate_tools()?;

    let mut pipeline = BuildPipeline::new(workdir.clone());
    pipeline.wait_pack = wait_pack;

    let out_file = project.out_file(&workdir);
    let spritesheet = config::spritesheet_path(&workdir);
    debug!("watch"; "output tier: {} and {}", out_file.display(), spritesheet.display());
    if pipeline_config.compression.compress || pipeline_config.compression.mangle {
        debug!("build"; "compression enabled");
    }

    WatchOrchestrator::new(pipeline, out_file, spritesheet)?.run()
}

/// The compiler is required; the packer is only warned about so compile
/// and post-process iteration still works without it.
fn validate_tools() -> Result<()> {
    if which::which("tsc").is_err() {
        bail!("tsc not found in PATH; install it with `npm install -g typescript`");
    }
    if which::which("jspicl-cli").is_err() {
        log!("pack"; "jspicl-cli not found in PATH; packing will fail until it is installed");
    }
    Ok(())
}
