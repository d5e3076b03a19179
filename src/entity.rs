//! HTML character entity and numeric-escape decoding (§4.8).
//!
//! Named entities are looked up in the `entities` crate's closed table
//! (the same published HTML5 entity list the WHATWG/CommonMark reference
//! implementations use); numeric entities are decoded by hand. Code spans,
//! code blocks and raw HTML never pass through this module — only text,
//! link/image titles, and info strings do.

use crate::ctype::isdigit;
use entities::ENTITIES;
use std::char;
use std::cmp::min;

pub const ENTITY_MIN_LENGTH: usize = 2;
pub const ENTITY_MAX_LENGTH: usize = 31;

/// Attempts to decode a single entity starting just after the `&` at the
/// front of `text`. Returns the decoded string and the number of bytes of
/// `text` consumed (including the trailing `;`), or `None` if `text` does
/// not begin with a recognized entity.
pub fn unescape(text: &[u8]) -> Option<(String, usize)> {
    if text.len() >= 3 && text[0] == b'#' {
        let mut codepoint: u32 = 0;
        let mut i;

        let num_digits = if text.len() > 1 && isdigit(text[1]) {
            i = 1;
            while i < text.len() && isdigit(text[i]) {
                codepoint = codepoint.saturating_mul(10) + (text[i] - b'0') as u32;
                codepoint = min(codepoint, 0x11_0000);
                i += 1;
            }
            i - 1
        } else if text.len() > 1 && (text[1] == b'x' || text[1] == b'X') {
            i = 2;
            while i < text.len() && text[i].is_ascii_hexdigit() {
                codepoint = codepoint.saturating_mul(16) + (text[i] as char).to_digit(16).unwrap();
                codepoint = min(codepoint, 0x11_0000);
                i += 1;
            }
            i - 2
        } else {
            0
        };

        if num_digits >= 1 && num_digits <= 8 && i < text.len() && text[i] == b';' {
            if codepoint == 0 || (0xD800..=0xDFFF).contains(&codepoint) || codepoint >= 0x110000 {
                codepoint = 0xFFFD;
            }
            let ch = char::from_u32(codepoint).unwrap_or('\u{FFFD}');
            return Some((ch.to_string(), i + 1));
        }

        return None;
    }

    let size = min(text.len(), ENTITY_MAX_LENGTH);
    for i in ENTITY_MIN_LENGTH..size {
        if text[i] == b' ' {
            return None;
        }
        if text[i] == b';' {
            return lookup(&text[..i]).map(|s| (s.to_string(), i + 1));
        }
    }

    None
}

fn lookup(name: &[u8]) -> Option<&'static str> {
    let name = std::str::from_utf8(name).ok()?;
    let wanted = format!("&{};", name);
    ENTITIES
        .iter()
        .find(|e| e.entity == wanted)
        .map(|e| e.characters)
}

/// Decodes every `&name;`/`&#123;`/`&#xFF;` entity in `src`, leaving an
/// unrecognized `&` untouched.
pub fn unescape_html(src: &str) -> String {
    let bytes = src.as_bytes();
    let size = bytes.len();
    let mut i = 0;
    let mut out = String::with_capacity(size);

    while i < size {
        let start = i;
        while i < size && bytes[i] != b'&' {
            i += 1;
        }
        if i > start {
            out.push_str(&src[start..i]);
        }
        if i >= size {
            return out;
        }
        i += 1;
        match unescape(&bytes[i..]) {
            Some((decoded, used)) => {
                out.push_str(&decoded);
                i += used;
            }
            None => out.push('&'),
        }
    }

    out
}
