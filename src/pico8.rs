//! PICO-8 runtime location and launch arguments.
//!
//! The default install location is a compile-time table keyed by target OS,
//! consulted before the config-supplied `pico8.executable` path. When
//! neither exists the build cycle completes without launching.

use crate::config::Pico8Config;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Default PICO-8 install location for the target OS (compile-time).
///
/// Empty on platforms without a conventional install path.
pub const DEFAULT_RUNTIME_PATH: &str = {
    #[cfg(target_os = "windows")]
    {
        r"C:\Program Files (x86)\PICO-8\pico8.exe"
    }

    #[cfg(target_os = "macos")]
    {
        "/Applications/PICO-8.app/Contents/MacOS/pico8"
    }

    #[cfg(target_os = "linux")]
    {
        "~/pico-8/pico8"
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        ""
    }
};

/// Locate the runtime executable, or `None` if it cannot be found.
///
/// The platform default wins over the configured path when both exist.
pub fn resolve_runtime(config: &Pico8Config) -> Option<PathBuf> {
    let default = expand(Path::new(DEFAULT_RUNTIME_PATH));
    resolve_with_default(&default, config)
}

fn resolve_with_default(default: &Path, config: &Pico8Config) -> Option<PathBuf> {
    if !default.as_os_str().is_empty() && default.exists() {
        return Some(default.to_path_buf());
    }

    let configured = config.executable.as_deref()?;
    if configured.as_os_str().is_empty() {
        return None;
    }
    let configured = expand(configured);
    configured.exists().then_some(configured)
}

/// Expand a leading tilde (the Linux default lives under `~`).
fn expand(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(text.as_ref()).as_ref())
}

/// Arguments for launching the runtime against a cartridge.
///
/// Sound is disabled so rebuild cycles stay quiet; the cartridge path is
/// passed as a plain argument (no shell, so no quoting).
pub fn launch_args(cartridge: &Path) -> Vec<OsString> {
    vec![
        OsString::from("-sound"),
        OsString::from("0"),
        OsString::from("-run"),
        cartridge.as_os_str().to_owned(),
    ]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_wins_when_present() {
        let tmp = TempDir::new().unwrap();
        let default = tmp.path().join("pico8");
        std::fs::write(&default, "").unwrap();

        let config = Pico8Config {
            executable: Some(PathBuf::from("/nonexistent/pico8")),
        };
        assert_eq!(resolve_with_default(&default, &config), Some(default));
    }

    #[test]
    fn test_falls_back_to_configured_path() {
        let tmp = TempDir::new().unwrap();
        let configured = tmp.path().join("pico8");
        std::fs::write(&configured, "").unwrap();

        let config = Pico8Config {
            executable: Some(configured.clone()),
        };
        let missing_default = tmp.path().join("missing");
        assert_eq!(
            resolve_with_default(&missing_default, &config),
            Some(configured)
        );
    }

    #[test]
    fn test_unresolvable_runtime_is_none() {
        let tmp = TempDir::new().unwrap();
        let missing_default = tmp.path().join("missing");

        let config = Pico8Config {
            executable: Some(PathBuf::from("/bad/path")),
        };
        assert_eq!(resolve_with_default(&missing_default, &config), None);

        // Empty string in config counts as unset
        let config = Pico8Config {
            executable: Some(PathBuf::new()),
        };
        assert_eq!(resolve_with_default(&missing_default, &config), None);
    }

    #[test]
    fn test_launch_args_shape() {
        let args = launch_args(Path::new("/work/game.p8"));
        assert_eq!(args.len(), 4);
        assert_eq!(args[0], "-sound");
        assert_eq!(args[1], "0");
        assert_eq!(args[2], "-run");
        assert_eq!(args[3], "/work/game.p8");
    }
}
