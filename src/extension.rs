//! The inline-parser extension surface (§6). Block-level plugins are not
//! in the core; only inline scanning is pluggable.

use crate::nodes::NodeKind;

/// A single plugin consulted by the inline parser's Phase B, after the
/// fixed precedence order (raw HTML/autolink, code span, math, image,
/// link, emphasis, line break) and before the final text fallback.
pub trait InlineParserPlugin: std::fmt::Debug {
    /// Attempt to scan a node starting at `cursor` (a byte offset) into
    /// `text`. On success, return the node produced and the byte offset
    /// just past what it consumed.
    fn scan(&self, text: &str, cursor: usize) -> Option<(NodeKind, usize)>;
}
