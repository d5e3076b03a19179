//! mdtree: a CommonMark 0.30-compatible Markdown parser producing an
//! immutable, span-tracked abstract syntax tree.
//!
//! GitHub-Flavored extensions (tables, strikethrough, task lists,
//! autolinks), Pandoc-style footnotes, inline/display TeX math, optional
//! heading labels, and optional recursive multi-file expansion are all
//! supported — see [`options::ParseOptions`] and [`options::Extension`].
//!
//! Malformed Markdown is never an error: [`parse_str`] always produces a
//! [`Document`]. The only failure this crate surfaces is an I/O failure
//! reading an input stream or a linked file during multi-file expansion
//! (see [`error`]).
//!
//! ```
//! use mdtree::options::ParseOptions;
//!
//! let doc = mdtree::parse_str("# Hello\n\nWorld **there**.\n", &ParseOptions::default());
//! let _root = doc.node(doc.root());
//! ```

pub mod ctype;
pub mod entity;
pub mod error;
pub mod extension;
pub mod line_reader;
pub mod multifile;
pub mod nodes;
pub mod options;
mod parser;
pub mod scanners;
pub mod span;
pub mod strings;

pub use error::{Error, Result};
pub use nodes::Document;
pub use options::ParseOptions;
pub use parser::{parse_file, parse_reader, parse_str};
