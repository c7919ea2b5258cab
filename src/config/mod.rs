//! Workspace configuration for `tsconfig.json` and `tspico8.json`.
//!
//! Two JSON documents live in the working directory:
//!
//! | File            | Purpose                                            |
//! |-----------------|----------------------------------------------------|
//! | `tsconfig.json` | TypeScript compiler settings; we read `outFile`    |
//! | `tspico8.json`  | Pipeline settings: compression, runtime executable |
//!
//! All relative paths in either document resolve against the working
//! directory. Configs are re-loaded at the top of every build cycle so
//! edits take effect without restarting the watcher.

use crate::error::PipelineError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// TypeScript project config file name.
pub const PROJECT_CONFIG_FILE: &str = "tsconfig.json";
/// Pipeline config file name.
pub const PIPELINE_CONFIG_FILE: &str = "tspico8.json";
/// Cartridge produced by the packer (fixed relative path).
pub const CARTRIDGE_FILE: &str = "game.p8";
/// Sprite sheet consumed by the packer (fixed relative path).
pub const SPRITESHEET_FILE: &str = "spritesheet.png";

// ============================================================================
// Project config (tsconfig.json)
// ============================================================================

/// The slice of `tsconfig.json` the pipeline cares about.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub compiler_options: CompilerOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Single-file compiler output, relative to the working directory.
    pub out_file: PathBuf,
}

impl ProjectConfig {
    pub fn load(workdir: &Path) -> Result<Self, PipelineError> {
        load_json(&workdir.join(PROJECT_CONFIG_FILE))
    }

    /// Absolute path of the compiler's emitted file.
    pub fn out_file(&self, workdir: &Path) -> PathBuf {
        workdir.join(&self.compiler_options.out_file)
    }
}

// ============================================================================
// Pipeline config (tspico8.json)
// ============================================================================

/// Root structure of `tspico8.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub pico8: Pico8Config,
    pub compression: CompressionConfig,
    /// Extra compressor options; recognized keys are mapped onto the
    /// minifier, unrecognized ones are accepted and ignored.
    pub compress_options: CompressOptions,
    /// Extra mangler options, same policy as `compress_options`.
    pub mangle_options: MangleOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Pico8Config {
    /// Runtime executable, used only when the per-platform default
    /// location does not exist.
    pub executable: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressionConfig {
    /// Post-processed output, relative to the working directory.
    pub compressed_file: PathBuf,
    /// Indentation width (spaces) for non-compressed output.
    pub indent_level: usize,
    /// Apply whitespace/structure compression.
    pub compress: bool,
    /// Apply identifier mangling.
    pub mangle: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            compressed_file: PathBuf::from("build/compressed.js"),
            indent_level: 1,
            compress: false,
            mangle: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressOptions {
    pub drop_console: bool,
    pub drop_debugger: bool,
    /// Pass-through bag; tolerated for config compatibility.
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MangleOptions {
    pub toplevel: bool,
    /// Pass-through bag; tolerated for config compatibility.
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

impl PipelineConfig {
    pub fn load(workdir: &Path) -> Result<Self, PipelineError> {
        load_json(&workdir.join(PIPELINE_CONFIG_FILE))
    }

    /// Absolute path of the post-processed output file.
    pub fn compressed_file(&self, workdir: &Path) -> PathBuf {
        workdir.join(&self.compression.compressed_file)
    }
}

/// Absolute path of the cartridge file.
pub fn cartridge_path(workdir: &Path) -> PathBuf {
    workdir.join(CARTRIDGE_FILE)
}

/// Absolute path of the sprite sheet.
pub fn spritesheet_path(workdir: &Path) -> PathBuf {
    workdir.join(SPRITESHEET_FILE)
}

// ============================================================================
// Loading
// ============================================================================

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::ConfigNotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|e| PipelineError::Io(path.to_path_buf(), e))?;
    serde_json::from_str(&text).map_err(|e| PipelineError::ConfigMalformed(path.to_path_buf(), e))
}

// ============================================================================
// Tests
// ============================================================================
