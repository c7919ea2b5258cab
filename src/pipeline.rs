//! One build cycle: compile → post-process → pack → launch.
//!
//! A cycle is triggered by the watch loop (or once at startup) and runs its
//! steps in strict sequence. The first failing step aborts the remainder of
//! the cycle; the watch loop logs the error and keeps observing.

use crate::config::{self, PipelineConfig, ProjectConfig};
use crate::error::PipelineError;
use crate::exec::{Cmd, format_failure};
use crate::process::ProcessSupervisor;
use crate::{debug, log, minify, pico8};
use std::fs;
use std::path::{Path, PathBuf};

/// What a change event asks of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    /// Source change: full recompile and rebuild.
    Full,
    /// Compiled-output or asset change: rebuild without recompiling.
    SkipCompile,
}

/// The fixed step sequence for one working directory.
pub struct BuildPipeline {
    pub workdir: PathBuf,
    /// Compiler invocation (program plus leading args).
    pub compiler: Vec<String>,
    /// Cartridge packer invocation.
    pub packer: Vec<String>,
    /// Await the packer and surface its failures instead of detaching it.
    ///
    /// Off by default: the packer is fire-and-continue, so the launch step
    /// may start the runtime before the cartridge is fully written. That
    /// race is part of the observed workflow; `run --wait-pack` closes it.
    pub wait_pack: bool,
}

impl BuildPipeline {
    pub fn new(workdir: PathBuf) -> Self {
        Self {
            workdir,
            compiler: vec!["tsc".into()],
            packer: vec!["jspicl-cli".into()],
            wait_pack: false,
        }
    }

    /// Run one cycle. Configs are re-loaded each time so edits to either
    /// document take effect on the next change event.
    pub fn run_cycle(
        &self,
        kind: CycleKind,
        supervisor: &mut ProcessSupervisor,
    ) -> Result<(), PipelineError> {
        supervisor.reap();

        let project = ProjectConfig::load(&self.workdir)?;
        let pipeline = PipelineConfig::load(&self.workdir)?;

        if kind == CycleKind::Full {
            self.compile()?;
        }
        self.post_process(&project, &pipeline)?;
        self.pack(&pipeline)?;
        self.launch(&pipeline, supervisor)?;
        Ok(())
    }

    /// Blocking compiler run; non-zero exit aborts the cycle.
    fn compile(&self) -> Result<(), PipelineError> {
        log!("compile"; "compiling TypeScript");
        let cmd = Cmd::from_slice(&self.compiler).cwd(&self.workdir);
        let name = cmd.program_name();
        let output = cmd
            .run()
            .map_err(|e| PipelineError::Io(PathBuf::from(name.clone()), e))?;
        if !output.status.success() {
            return Err(PipelineError::CompileFailed {
                status: output.status,
                output: format_failure(&name, &output),
            });
        }
        Ok(())
    }

    /// Read the compiler's output, transform it, write the game file.
    fn post_process(
        &self,
        project: &ProjectConfig,
        pipeline: &PipelineConfig,
    ) -> Result<(), PipelineError> {
        log!("build"; "building game file");
        let out_file = project.out_file(&self.workdir);
        let source =
            fs::read_to_string(&out_file).map_err(|e| PipelineError::Io(out_file.clone(), e))?;

        let code = minify::post_process(&source, pipeline)?;

        let target = pipeline.compressed_file(&self.workdir);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PipelineError::Io(parent.to_path_buf(), e))?;
        }
        fs::write(&target, &code).map_err(|e| PipelineError::Io(target.clone(), e))?;
        debug!("build"; "wrote {} ({} bytes)", target.display(), code.len());
        Ok(())
    }

    /// Hand the game file to the cartridge packer.
    fn pack(&self, pipeline: &PipelineConfig) -> Result<(), PipelineError> {
        let input = pipeline.compressed_file(&self.workdir);
        let cartridge = config::cartridge_path(&self.workdir);
        let sprites = config::spritesheet_path(&self.workdir);

        let cmd = Cmd::from_slice(&self.packer)
            .arg("--input")
            .arg(&input)
            .arg("--output")
            .arg(&cartridge)
            .arg("--spritesheetImagePath")
            .arg(&sprites)
            .arg("--cartridgePath")
            .arg(&cartridge)
            .cwd(&self.workdir);
        let name = cmd.program_name();
        log!("pack"; "packing {}", cartridge.display());

        if self.wait_pack {
            let output = cmd
                .run()
                .map_err(|e| PipelineError::PackFailed(e.to_string()))?;
            if !output.status.success() {
                return Err(PipelineError::PackFailed(format_failure(&name, &output)));
            }
        } else {
            cmd.spawn()
                .map_err(|e| PipelineError::PackFailed(e.to_string()))?;
        }
        Ok(())
    }

    /// Replace the supervised runtime instance, if a runtime resolves.
    ///
    /// No resolvable runtime is not an error; the cycle just ends after
    /// packing.
    fn launch(
        &self,
        pipeline: &PipelineConfig,
        supervisor: &mut ProcessSupervisor,
    ) -> Result<(), PipelineError> {
        let Some(runtime) = pico8::resolve_runtime(&pipeline.pico8) else {
            debug!("pico8"; "no runtime executable found; skipping launch");
            return Ok(());
        };

        let cartridge = config::cartridge_path(&self.workdir);
        supervisor.launch(&runtime, &pico8::launch_args(&cartridge))?;
        log!("pico8"; "new build... relaunch!");
        Ok(())
    }
}

/// Absolute form of the working directory argument.
pub fn absolute_workdir(dir: &Path) -> Result<PathBuf, PipelineError> {
    std::path::absolute(dir).map_err(|e| PipelineError::Io(dir.to_path_buf(), e))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// A workspace with valid configs and a pre-built compiler output.
    fn workspace(compress: bool) -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("tsconfig.json"),
            r#"{"compilerOptions": {"outFile": "build/out.js"}}"#,
        )
        .unwrap();
        fs::write(
            tmp.path().join("tspico8.json"),
            format!(
                r#"{{
                    "compression": {{
                        "compress": {compress},
                        "mangle": false,
                        "compressedFile": "build/out.min.js"
                    }},
                    "pico8": {{"executable": "/bad/path"}}
                }}"#
            ),
        )
        .unwrap();
        fs::create_dir_all(tmp.path().join("build")).unwrap();
        fs::write(
            tmp.path().join("build/out.js"),
            "\"use strict\";\nfunction f(){return 1}",
        )
        .unwrap();
        tmp
    }

    /// Pipeline with stand-in commands: a no-op compiler and packer.
    fn pipeline(workdir: &Path) -> BuildPipeline {
        let mut pipeline = BuildPipeline::new(workdir.to_path_buf());
        pipeline.compiler = vec!["true".into()];
        pipeline.packer = vec!["true".into()];
        pipeline
    }

    #[test]
    fn test_full_cycle_end_to_end() {
        let tmp = workspace(true);
        let mut sup = ProcessSupervisor::new();

        pipeline(tmp.path())
            .run_cycle(CycleKind::Full, &mut sup)
            .unwrap();

        let out = fs::read_to_string(tmp.path().join("build/out.min.js")).unwrap();
        assert!(!out.contains("use strict"));
        assert!(out.contains("function f("));
        assert!(!out.ends_with(';'));
        // `/bad/path` does not resolve, so no launch happened
        assert!(!sup.has_current());
    }

    #[test]
    fn test_compile_failure_aborts_cycle() {
        let tmp = workspace(false);
        let mut sup = ProcessSupervisor::new();
        let mut failing = pipeline(tmp.path());
        failing.compiler = vec!["false".into()];

        let err = failing.run_cycle(CycleKind::Full, &mut sup).unwrap_err();
        assert!(matches!(err, PipelineError::CompileFailed { .. }));
        // Later steps never ran
        assert!(!tmp.path().join("build/out.min.js").exists());

        // The same workspace still builds on the next (successful) cycle
        pipeline(tmp.path())
            .run_cycle(CycleKind::Full, &mut sup)
            .unwrap();
        assert!(tmp.path().join("build/out.min.js").exists());
    }

    #[test]
    fn test_skip_compile_never_invokes_compiler() {
        let tmp = workspace(false);
        let mut sup = ProcessSupervisor::new();
        let mut p = pipeline(tmp.path());
        // Would fail the cycle if it were ever run
        p.compiler = vec!["false".into()];

        p.run_cycle(CycleKind::SkipCompile, &mut sup).unwrap();
        assert!(tmp.path().join("build/out.min.js").exists());
    }

    #[test]
    fn test_compile_output_feeds_post_process() {
        let tmp = workspace(false);
        let mut sup = ProcessSupervisor::new();
        let mut p = pipeline(tmp.path());
        // The compiler overwrites the pre-seeded output; post-process must
        // see the compiler's version (compile runs strictly first).
        p.compiler = vec![
            "sh".into(),
            "-c".into(),
            "echo 'let fromCompiler = 1' > build/out.js".into(),
        ];

        p.run_cycle(CycleKind::Full, &mut sup).unwrap();
        let out = fs::read_to_string(tmp.path().join("build/out.min.js")).unwrap();
        assert!(out.contains("fromCompiler"));
    }

    #[test]
    fn test_missing_config_fails_cycle() {
        let tmp = TempDir::new().unwrap();
        let mut sup = ProcessSupervisor::new();
        let err = pipeline(tmp.path())
            .run_cycle(CycleKind::Full, &mut sup)
            .unwrap_err();
        assert!(matches!(err, PipelineError::ConfigNotFound(_)));
    }

    #[test]
    fn test_pack_failure_detached_by_default() {
        let tmp = workspace(false);
        let mut sup = ProcessSupervisor::new();
        let mut p = pipeline(tmp.path());
        p.packer = vec!["false".into()];

        // Fire-and-continue swallows the packer's exit status
        p.run_cycle(CycleKind::SkipCompile, &mut sup).unwrap();
    }

    #[test]
    fn test_pack_failure_surfaced_with_wait_pack() {
        let tmp = workspace(false);
        let mut sup = ProcessSupervisor::new();
        let mut p = pipeline(tmp.path());
        p.packer = vec!["false".into()];
        p.wait_pack = true;

        let err = p.run_cycle(CycleKind::SkipCompile, &mut sup).unwrap_err();
        assert!(matches!(err, PipelineError::PackFailed(_)));
    }

    #[test]
    fn test_unresolvable_runtime_completes_without_launch() {
        // Spec'd end-to-end scenario: compress on, mangle off, bad runtime
        let tmp = workspace(true);
        let mut sup = ProcessSupervisor::new();

        pipeline(tmp.path())
            .run_cycle(CycleKind::SkipCompile, &mut sup)
            .unwrap();
        assert!(!sup.has_current());
    }
}
