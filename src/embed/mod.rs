//! Embedded workspace scaffold.
//!
//! The files a fresh game workspace starts from, compiled into the binary
//! so `init` works without any installation directory.

/// One scaffold file: its name in the target workspace and its contents.
pub struct TemplateFile {
    pub name: &'static str,
    pub contents: &'static str,
}

/// Everything `init` copies into a new workspace.
pub const SCAFFOLD_FILES: &[TemplateFile] = &[
    TemplateFile {
        name: "main.ts",
        contents: include_str!("scaffold/main.ts"),
    },
    TemplateFile {
        name: "pico8.d.ts",
        contents: include_str!("scaffold/pico8.d.ts"),
    },
    TemplateFile {
        name: "tsconfig.json",
        contents: include_str!("scaffold/tsconfig.json"),
    },
    TemplateFile {
        name: "tspico8.json",
        contents: include_str!("scaffold/tspico8.json"),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PipelineConfig, ProjectConfig};

    #[test]
    fn test_scaffold_configs_parse_with_current_schema() {
        let tsconfig = SCAFFOLD_FILES
            .iter()
            .find(|f| f.name == "tsconfig.json")
            .unwrap();
        let project: ProjectConfig = serde_json::from_str(tsconfig.contents).unwrap();
        assert_eq!(
            project.compiler_options.out_file,
            std::path::Path::new("build/compiled.js")
        );

        let tspico8 = SCAFFOLD_FILES
            .iter()
            .find(|f| f.name == "tspico8.json")
            .unwrap();
        let pipeline: PipelineConfig = serde_json::from_str(tspico8.contents).unwrap();
        assert!(!pipeline.compression.compress);
        assert_eq!(pipeline.compression.indent_level, 1);
    }

    #[test]
    fn test_scaffold_game_has_metadata_and_loop() {
        let main = SCAFFOLD_FILES.iter().find(|f| f.name == "main.ts").unwrap();
        assert!(main.contents.starts_with("// title:"));
        for hook in ["_init", "_update", "_draw"] {
            assert!(main.contents.contains(hook), "missing {hook}");
        }
    }

    #[test]
    fn test_scaffold_names_unique() {
        let mut names: Vec<_> = SCAFFOLD_FILES.iter().map(|f| f.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SCAFFOLD_FILES.len());
    }
}
