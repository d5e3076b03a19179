//! Inline raw HTML (§4.6's "Inline HTML uses rule-7 parsing embedded in a
//! paragraph"): open/close tags, comments, processing instructions,
//! declarations and CDATA sections appearing mid-text. Never sets the
//! *free-tag* flag — that is reserved for a tag that stood alone on its
//! line and was therefore recognized as a block by `parser::block`.

use crate::scanners;

/// Attempts to parse one inline HTML construct starting at `text[0..]`
/// (which must begin with `<`). Returns the byte length consumed on
/// success.
pub fn match_inline_html(text: &str) -> Option<usize> {
    if let Some(end) = scanners::parse_open_tag(text) {
        return Some(end);
    }
    if let Some(end) = scanners::parse_closing_tag(text) {
        return Some(end);
    }
    if let Some(rest) = text.strip_prefix("<!--") {
        // CommonMark 2.0+ comment grammar: not starting with `>`/`->`, not
        // ending in `-`, and not containing `--`.
        if !rest.starts_with('>') && !rest.starts_with("->") {
            if let Some(idx) = rest.find("-->") {
                if !rest[..idx].ends_with('-') && !rest[..idx].contains("--") {
                    return Some(4 + idx + 3);
                }
            }
        }
        return None;
    }
    if text.starts_with("<?") {
        return text.find("?>").map(|idx| idx + 2);
    }
    if let Some(rest) = text.strip_prefix("<!") {
        if rest.as_bytes().first().map(|b| b.is_ascii_alphabetic()) == Some(true) {
            return text.find('>').map(|idx| idx + 1);
        }
        if let Some(cdata) = rest.strip_prefix("[CDATA[") {
            return cdata.find("]]>").map(|idx| 2 + 7 + idx + 3);
        }
        return None;
    }
    None
}
