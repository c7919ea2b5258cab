//! Post-processing of the compiler's emitted JavaScript.
//!
//! Uses oxc for compression and identifier mangling. The PICO-8 global
//! scope model imposes two quirks handled here:
//!
//! - a leading `"use strict";` directive breaks the runtime's globals and
//!   is stripped (exact leading literal only, never occurrences elsewhere);
//! - metadata comments (`// title:`, `// author:`, ...) are consumed by the
//!   cartridge packer and must survive even full compression.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::log;
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, CompressOptionsUnused, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use regex::Regex;
use std::sync::LazyLock;

/// Exact directive literal stripped from the start of compiler output.
const STRICT_DIRECTIVE: &str = "\"use strict\";";

/// Results shorter than this are logged as suspicious (but still written).
pub const MIN_PLAUSIBLE_LEN: usize = 10;

/// Magic tokens whose comment lines carry cartridge metadata.
static METADATA_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"title|author|desc|script|input|saveid").unwrap());

/// Transform compiled JavaScript into runtime-ready source.
///
/// Fails with [`PipelineError::PostProcessFailed`] only when the input
/// does not parse; a suspiciously small result is logged for diagnosis
/// and returned anyway.
pub fn post_process(source: &str, config: &PipelineConfig) -> Result<String, PipelineError> {
    let source = strip_strict_directive(source);
    let compression = &config.compression;

    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if !ret.errors.is_empty() {
        let msg = ret
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        return Err(PipelineError::PostProcessFailed(msg));
    }
    let mut program = ret.program;

    let code = if compression.compress || compression.mangle {
        let options = MinifierOptions {
            mangle: compression.mangle.then(|| MangleOptions {
                top_level: Some(config.mangle_options.toplevel),
                ..MangleOptions::default()
            }),
            // Game hooks (_init/_update/_draw) are only ever called by the
            // runtime, so unused top-level bindings must not be removed.
            compress: compression.compress.then(|| CompressOptions {
                drop_console: config.compress_options.drop_console,
                drop_debugger: config.compress_options.drop_debugger,
                unused: CompressOptionsUnused::Keep,
                ..CompressOptions::default()
            }),
        };
        let ret = Minifier::new(options).minify(&allocator, &mut program);
        let code = Codegen::new()
            .with_options(CodegenOptions {
                minify: true,
                comments: CommentOptions::disabled(),
                ..CodegenOptions::default()
            })
            .with_scoping(ret.scoping)
            .build(&program)
            .code;

        // The packer reads metadata from comments, so they must survive
        // compression: re-emit them verbatim ahead of the minified code.
        let kept = metadata_comments(source);
        if kept.is_empty() {
            code
        } else {
            format!("{}\n{}", kept.join("\n"), code)
        }
    } else {
        let code = Codegen::new()
            .with_options(CodegenOptions {
                minify: false,
                ..CodegenOptions::default()
            })
            .build(&program)
            .code;
        reindent(&strip_semicolons(&code), compression.indent_level)
    };

    if code.trim().len() < MIN_PLAUSIBLE_LEN {
        log!("build"; "suspiciously small output ({} bytes); original input follows", code.len());
        log!("build"; "{}", source);
    }

    Ok(code)
}

/// Strip a single exact leading occurrence of the strict-mode directive.
///
/// Only a prefix match counts; the same text elsewhere in the source
/// (user strings, inner directives) is left untouched.
fn strip_strict_directive(source: &str) -> &str {
    source.strip_prefix(STRICT_DIRECTIVE).unwrap_or(source)
}

/// Collect comment lines carrying cartridge metadata, verbatim.
fn metadata_comments(source: &str) -> Vec<&str> {
    source
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            trimmed.starts_with("//") && METADATA_COMMENT.is_match(trimmed)
        })
        .collect()
}

/// Remove statement-terminating semicolons at line ends.
///
/// The runtime's interpreter rejects them. A terminator is kept when the
/// following line starts with a token that would otherwise glue the two
/// statements together under ASI rules.
fn strip_semicolons(code: &str) -> String {
    let lines: Vec<&str> = code.lines().collect();
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        match line.strip_suffix(';') {
            Some(stripped) if asi_safe(lines.get(i + 1)) => out.push(stripped),
            _ => out.push(line),
        }
    }
    out.join("\n")
}

fn asi_safe(next: Option<&&str>) -> bool {
    let Some(next) = next else {
        return true;
    };
    !next
        .trim_start()
        .starts_with(['(', '[', '+', '-', '`', '/', '*'])
}

/// Replace the code generator's tab indentation with configured spaces.
fn reindent(code: &str, width: usize) -> String {
    let unit = " ".repeat(width);
    code.lines()
        .map(|line| {
            let tabs = line.bytes().take_while(|b| *b == b'\t').count();
            format!("{}{}", unit.repeat(tabs), &line[tabs..])
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    fn config(compress: bool, mangle: bool) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.compression.compress = compress;
        config.compression.mangle = mangle;
        config
    }

    #[test]
    fn test_strip_directive_leading_only() {
        assert_eq!(
            strip_strict_directive("\"use strict\";\nlet a = 1"),
            "\nlet a = 1"
        );
        // Not at the start: untouched
        let inner = "let a = 1;\n\"use strict\";";
        assert_eq!(strip_strict_directive(inner), inner);
    }

    #[test]
    fn test_directive_elsewhere_survives_processing() {
        let source = "\"use strict\";\nfunction f() {\n\"use strict\";\nreturn 1\n}";
        let out = post_process(source, &config(false, false)).unwrap();
        assert!(!out.starts_with("\"use strict\""));
        assert!(out.contains("use strict"));
    }

    #[test]
    fn test_metadata_comments_survive_mangle() {
        let source = "// title:  my game\n// author: someone\n// just a note\nlet gameSpeed = 2\nfunction f() { return gameSpeed }\nf()";
        let out = post_process(source, &config(true, true)).unwrap();
        assert!(out.contains("// title:  my game"));
        assert!(out.contains("// author: someone"));
        assert!(!out.contains("just a note"));
    }

    #[test]
    fn test_metadata_comment_matching() {
        let kept = metadata_comments(
            "// title: x\n// saveid: y\nlet title = 1 // not a comment line\n// other note\n",
        );
        assert_eq!(kept, vec!["// title: x", "// saveid: y"]);
    }

    #[test]
    fn test_beautified_output_has_no_trailing_semicolons() {
        let source = "let a = 1\nlet b = 2\nfunction f() {\nreturn a + b\n}";
        let out = post_process(source, &config(false, false)).unwrap();
        for line in out.lines() {
            assert!(!line.ends_with(';'), "unexpected terminator in: {line}");
        }
    }

    #[test]
    fn test_semicolon_kept_before_asi_hazard() {
        let code = "let a = b;\n(c)();";
        let out = strip_semicolons(code);
        assert_eq!(out, "let a = b;\n(c)()");
    }

    #[test]
    fn test_reindent_uses_configured_width() {
        assert_eq!(reindent("f()\n\tg()\n\t\th()", 2), "f()\n  g()\n    h()");
    }

    #[test]
    fn test_indent_level_applied() {
        let mut cfg = config(false, false);
        cfg.compression.indent_level = 2;
        let out = post_process("function f() {\nreturn 1\n}", &cfg).unwrap();
        assert!(out.contains("\n  return 1"));
    }

    #[test]
    fn test_invalid_input_is_post_process_failed() {
        let err = post_process("function ((", &config(false, false)).unwrap_err();
        assert!(matches!(err, PipelineError::PostProcessFailed(_)));
    }

    #[test]
    fn test_tiny_output_still_returned() {
        let out = post_process("x = 1", &config(false, false)).unwrap();
        assert!(!out.is_empty());
        assert!(out.contains("x = 1"));
    }

    #[test]
    fn test_compression_keeps_uncalled_game_hooks() {
        // Game hooks have no caller in the source; the runtime invokes them.
        let source =
            "function _init() {}\nfunction _update() { x = 1 }\nfunction _draw() { circfill(1, 2, 3) }";
        let out = post_process(source, &config(true, false)).unwrap();
        for hook in ["_init", "_update", "_draw"] {
            assert!(out.contains(hook), "{hook} removed from: {out:?}");
        }
    }

    #[test]
    fn test_compressed_output_compact() {
        let source = "\"use strict\";\nfunction f() {\n    return 1;\n}";
        let out = post_process(source, &config(true, false)).unwrap();
        assert!(!out.starts_with("\"use strict\""));
        assert!(out.contains("function f("));
        assert!(!out.ends_with(';'));
    }
}
