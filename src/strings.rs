//! Small text-munging helpers shared by the block and inline parsers:
//! trimming, backslash-unescaping, whitespace normalization, and reference
//! label canonicalization (§4.7, §4.8, §6).

use crate::ctype::{ispunct, isspace};
use caseless::default_case_fold_str;

/// Resolves backslash escapes of ASCII punctuation in place (§4.8). A
/// backslash before any other character, or at end of string, is left
/// untouched here; a trailing backslash at end of *line* is handled by the
/// inline parser as a hard line break before this runs.
pub fn unescape(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() && ispunct(bytes[i + 1]) {
            out.push(bytes[i + 1] as char);
            i += 2;
        } else {
            // Copy one UTF-8 scalar value verbatim.
            let ch_len = utf8_len(bytes[i]);
            out.push_str(&s[i..i + ch_len]);
            i += ch_len;
        }
    }
    out
}

fn utf8_len(lead: u8) -> usize {
    if lead < 0x80 {
        1
    } else if lead >> 5 == 0b110 {
        2
    } else if lead >> 4 == 0b1110 {
        3
    } else if lead >> 3 == 0b11110 {
        4
    } else {
        1
    }
}

/// Collapses every run of ASCII whitespace to a single space (used when
/// joining a leaf block's source lines into one inline-parse buffer, §4.4).
pub fn normalize_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = false;
    for c in s.chars() {
        if c.is_ascii() && isspace(c as u8) {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out
}

pub fn rtrim(s: &str) -> &str {
    s.trim_end_matches(|c: char| c.is_ascii() && isspace(c as u8))
}

pub fn ltrim(s: &str) -> &str {
    s.trim_start_matches(|c: char| c.is_ascii() && isspace(c as u8))
}

pub fn trim(s: &str) -> &str {
    ltrim(rtrim(s))
}

pub fn is_blank(s: &str) -> bool {
    s.bytes().all(|b| b == b' ' || b == b'\t')
}

/// Canonicalizes a reference/footnote label: trim, collapse internal
/// whitespace, and Unicode case-fold (§6's "Canonical label"). The `#`/file
/// scoping suffix is applied by the caller, not here.
pub fn normalize_label(label: &str) -> String {
    let trimmed = trim(label);
    let collapsed = normalize_whitespace(trimmed);
    default_case_fold_str(&collapsed)
}

/// Strips the enclosing `<...>`, `"..."`, `'...'` or `(...)` delimiters (if
/// present) from a URL/title literal, then resolves entities and escapes.
pub fn clean_url(url: &str) -> String {
    let url = trim(url);
    if url.is_empty() {
        return String::new();
    }
    let bytes = url.as_bytes();
    let inner = if bytes[0] == b'<' && bytes[bytes.len() - 1] == b'>' {
        &url[1..url.len() - 1]
    } else {
        url
    };
    unescape(&crate::entity::unescape_html(inner))
}

pub fn clean_title(title: &str) -> String {
    if title.is_empty() {
        return String::new();
    }
    let bytes = title.as_bytes();
    let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
    let inner = if (first == b'\'' && last == b'\'')
        || (first == b'(' && last == b')')
        || (first == b'"' && last == b'"')
    {
        &title[1..title.len() - 1]
    } else {
        title
    };
    unescape(&crate::entity::unescape_html(inner))
}

/// Strips a trailing closing sequence of an ATX heading (a run of `#`s
/// preceded by whitespace, or a bare trailing run of `#`s) per CommonMark
/// 4.2's "optional closing sequence".
pub fn rtrim_hashes(s: &str) -> &str {
    let trimmed = rtrim(s);
    let hashes_start = trimmed
        .rfind(|c: char| c != '#')
        .map(|i| i + 1)
        .unwrap_or(0);
    if hashes_start == trimmed.len() {
        return trimmed;
    }
    if hashes_start == 0 {
        // The whole line is hashes; CommonMark only strips a *trailing*
        // sequence preceded by a space, so leave it as-is here (the
        // caller already stripped the opening marker).
        return trimmed;
    }
    let before = &trimmed[..hashes_start];
    if before.ends_with(' ') || before.ends_with('\t') {
        rtrim(before)
    } else {
        trimmed
    }
}

/// Lowercases `text`, replaces runs of non-alphanumerics with `-`, and trims
/// leading/trailing `-` — the heading-label slug synthesis rule (§4.3).
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && !out.is_empty() {
            out.push('-');
            last_was_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
