//! Parser configuration (§4.10, §6 "Input").
//!
//! Grounded in the teacher's `Options { extension, parse, render }` triad
//! (`parser/options.rs`), collapsed to the knobs this crate's modules
//! actually read — there is no render-time half here, since rendering is
//! an external collaborator (§1).

use crate::extension::InlineParserPlugin;
use std::path::PathBuf;

/// Toggles for the widely-deployed extensions named in §1. Disabling one
/// makes its block/inline rule fall through to plain text/paragraph
/// handling rather than erroring — nothing is ever rejected outright (§7).
#[derive(Debug, Clone, Copy)]
pub struct Extension {
    pub tables: bool,
    pub strikethrough: bool,
    pub tasklist: bool,
    pub footnotes: bool,
    pub math: bool,
    pub autolink: bool,
}

impl Default for Extension {
    fn default() -> Extension {
        Extension {
            tables: true,
            strikethrough: true,
            tasklist: true,
            footnotes: true,
            math: true,
            autolink: true,
        }
    }
}

/// Top-level parse options (§6's "Input").
pub struct ParseOptions {
    /// Used only to resolve relative link targets and to scope labels (§6).
    pub working_path: PathBuf,
    /// Used only to scope labels (§6); carries no filesystem meaning unless
    /// the multi-file driver is also in use.
    pub file_name: String,
    /// Whether the multi-file driver (§4.9) is engaged at all.
    pub recursive: bool,
    /// File extensions the multi-file driver treats as Markdown.
    pub extensions: Vec<String>,
    pub extension: Extension,
    /// The extension surface (§6): user-defined inline scanners consulted
    /// after the fixed precedence order and before the text fallback.
    pub plugins: Vec<Box<dyn InlineParserPlugin>>,
}

impl Default for ParseOptions {
    fn default() -> ParseOptions {
        ParseOptions {
            working_path: PathBuf::new(),
            file_name: String::new(),
            recursive: false,
            extensions: vec!["md".to_string(), "markdown".to_string()],
            extension: Extension::default(),
            plugins: Vec::new(),
        }
    }
}

impl std::fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseOptions")
            .field("working_path", &self.working_path)
            .field("file_name", &self.file_name)
            .field("recursive", &self.recursive)
            .field("extensions", &self.extensions)
            .field("extension", &self.extension)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}
