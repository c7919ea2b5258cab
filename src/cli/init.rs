//! Workspace scaffolding.
//!
//! Copies the embedded template files into a target directory after a
//! confirmation prompt. Existing files are never touched; declining the
//! prompt is a clean no-op, not an error.

use crate::embed::SCAFFOLD_FILES;
use crate::log;
use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Directory used when `init` is given no argument.
pub const DEFAULT_WORKSPACE: &str = "p8workspace";

pub fn init_workspace(target: &Path, assume_yes: bool) -> Result<()> {
    log!("init"; "the following files will be copied to {}:", target.display());
    for file in SCAFFOLD_FILES {
        log!("init"; "  {}", file.name);
    }

    if !assume_yes && !prompt_proceed()? {
        log!("init"; "nothing copied");
        return Ok(());
    }

    let copied = copy_scaffold(target)?;
    log!("init"; "copied {copied} file(s); edit {} before running", crate::config::PIPELINE_CONFIG_FILE);
    Ok(())
}

/// Prompt user to confirm the copy
fn prompt_proceed() -> Result<bool> {
    eprint!("Proceed to copy? [y/N] ");
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

/// Write the scaffold into `target`, skipping files that already exist.
/// Returns the number of files written.
fn copy_scaffold(target: &Path) -> Result<usize> {
    fs::create_dir_all(target)
        .with_context(|| format!("failed to create {}", target.display()))?;

    let mut copied = 0;
    for file in SCAFFOLD_FILES {
        let dest = target.join(file.name);
        if dest.exists() {
            log!("init"; "skipping {} (already exists)", file.name);
            continue;
        }
        fs::write(&dest, file.contents)
            .with_context(|| format!("failed to write {}", dest.display()))?;
        copied += 1;
    }
    Ok(copied)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_creates_all_files() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("ws");

        let copied = copy_scaffold(&target).unwrap();
        assert_eq!(copied, SCAFFOLD_FILES.len());
        for file in SCAFFOLD_FILES {
            assert!(target.join(file.name).exists(), "missing {}", file.name);
        }
    }

    #[test]
    fn test_existing_files_left_untouched() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().to_path_buf();
        let custom = "// my edited game\n";
        fs::write(target.join("main.ts"), custom).unwrap();

        let copied = copy_scaffold(&target).unwrap();
        assert_eq!(copied, SCAFFOLD_FILES.len() - 1);
        assert_eq!(fs::read_to_string(target.join("main.ts")).unwrap(), custom);
    }

    #[test]
    fn test_rerun_copies_nothing() {
        let tmp = TempDir::new().unwrap();
        copy_scaffold(tmp.path()).unwrap();
        assert_eq!(copy_scaffold(tmp.path()).unwrap(), 0);
    }
}
