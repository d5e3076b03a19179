//! §4.9 — helpers for the recursive multi-file driver: deciding whether a
//! link target is a local Markdown file worth following, and normalizing
//! it to the absolute path used both as the visited-set key and as the
//! `Anchor` label.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// A link target qualifies for multi-file expansion iff it has no URL
/// scheme (`http:`, `mailto:`, ...), is not a bare in-page fragment
/// (`#section`), and its extension (case-insensitively) is in `extensions`.
pub fn is_local_markdown_link(url: &str, extensions: &[String]) -> bool {
    if url.is_empty() || url.starts_with('#') {
        return false;
    }
    if url.contains("://") {
        return false;
    }
    if let Some(scheme_end) = url.find(':') {
        // `mailto:`, `tel:` etc — anything with a colon before the first
        // slash that isn't a Windows drive letter is a URL scheme.
        if !url[..scheme_end].contains(['/', '\\']) && scheme_end > 1 {
            return false;
        }
    }
    let path_part = url.split(['#', '?']).next().unwrap_or(url);
    let ext = Path::new(path_part)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

/// Resolves `url` against `working_path`, returning an absolute,
/// lexically-normalized path (no filesystem access; existence is checked
/// by the caller before recursing, per §7's "silently skips targets that
/// cannot be opened").
pub fn resolve_relative(working_path: &Path, url: &str) -> PathBuf {
    let path_part = url.split(['#', '?']).next().unwrap_or(url);
    // §4.7: URLs are percent-decoded for comparison purposes only, so two
    // links differing only in encoding (`a%20b.md` vs `a b.md`) resolve to
    // the same visited-set entry instead of being parsed twice.
    let decoded = percent_decode_str(path_part).decode_utf8_lossy().into_owned();
    let joined = if Path::new(&decoded).is_absolute() {
        PathBuf::from(decoded)
    } else {
        working_path.join(decoded)
    };
    normalize_lexically(&joined)
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        use std::path::Component::*;
        match comp {
            CurDir => {}
            ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
