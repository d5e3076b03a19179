//! Error handling (§7, §4.11).
//!
//! Malformed Markdown is never an error: every input produces a [`crate::Document`].
//! The only failure this crate surfaces is an I/O failure reading the input
//! stream itself or a linked file during multi-file expansion.

use std::io;
use std::path::PathBuf;

/// The only error taxonomy this crate exposes to callers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading the input stream, or a file linked to during multi-file
    /// expansion, failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Convenience alias for the fallible entry points.
pub type Result<T> = std::result::Result<T, Error>;
