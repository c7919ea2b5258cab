//! Pipeline error taxonomy.
//!
//! Every failure a build cycle can hit maps to one variant; the watch loop
//! reports the variant's step prefix and message without tearing down.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("config file {0} is malformed: {1}")]
    ConfigMalformed(PathBuf, #[source] serde_json::Error),

    #[error("compiler exited with {status}\n{output}")]
    CompileFailed { status: ExitStatus, output: String },

    #[error("post-processing failed: {0}")]
    PostProcessFailed(String),

    #[error("cartridge packing failed: {0}")]
    PackFailed(String),

    #[error("failed to launch {0}: {1}")]
    LaunchFailed(PathBuf, #[source] io::Error),

    #[error("io error on {0}: {1}")]
    Io(PathBuf, #[source] io::Error),
}

impl PipelineError {
    /// Log prefix of the pipeline step this error belongs to.
    pub fn step(&self) -> &'static str {
        match self {
            Self::ConfigNotFound(_) | Self::ConfigMalformed(..) => "config",
            Self::CompileFailed { .. } => "compile",
            Self::PostProcessFailed(_) => "build",
            Self::PackFailed(_) => "pack",
            Self::LaunchFailed(..) => "pico8",
            Self::Io(..) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_prefixes() {
        assert_eq!(
            PipelineError::ConfigNotFound(PathBuf::from("tspico8.json")).step(),
            "config"
        );
        assert_eq!(
            PipelineError::PostProcessFailed("bad parse".into()).step(),
            "build"
        );
        assert_eq!(PipelineError::PackFailed("exit 1".into()).step(), "pack");
        assert_eq!(
            PipelineError::LaunchFailed(
                PathBuf::from("/bin/pico8"),
                io::Error::from(io::ErrorKind::NotFound)
            )
            .step(),
            "pico8"
        );
    }

    #[test]
    fn test_display_includes_path() {
        let err = PipelineError::ConfigNotFound(PathBuf::from("/work/tsconfig.json"));
        assert!(err.to_string().contains("/work/tsconfig.json"));
    }
}
