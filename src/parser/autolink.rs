//! Autolink recognition (§4.6 item 1, §4.4 expansion "strikethrough and
//! autolink extensions"): the core CommonMark `<scheme:...>`/`<email>`
//! forms, plus the GFM "extended autolink" forms recognized bare in text
//! (`www.`-prefixed, bare `user@host`, trailing-punctuation trimming),
//! grounded in the teacher's `autolink.rs` dispatch shape.

use crate::ctype::{isalnum, isalpha};

/// Tries to match a core autolink's interior (the text between `<` and
/// the first following `>`), returning `(url, is_email)`.
pub fn match_bracketed(inner: &str) -> Option<(String, bool)> {
    if inner.is_empty() || inner.contains(char::is_whitespace) || inner.contains('<') {
        return None;
    }
    if let Some(at) = match_email(inner) {
        if at == inner.len() {
            return Some((format!("mailto:{}", inner), true));
        }
    }
    if match_scheme(inner) {
        return Some((inner.to_string(), false));
    }
    None
}

/// A scheme is 2–32 chars, starts with a letter, continues with
/// alphanumerics/`+`/`-`/`.`, followed by `:` and at least one non-space,
/// non-`<`/`>` character for the rest of the string (CommonMark 6.9).
fn match_scheme(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.is_empty() || !isalpha(bytes[0]) {
        return false;
    }
    let mut i = 1;
    while i < bytes.len() && i <= 32 && (isalnum(bytes[i]) || matches!(bytes[i], b'+' | b'-' | b'.')) {
        i += 1;
    }
    if !(2..=32).contains(&i) || bytes.get(i) != Some(&b':') {
        return false;
    }
    let rest = &s[i + 1..];
    !rest.is_empty() && !rest.contains(char::is_whitespace) && !rest.contains(['<', '>'])
}

/// A bare email per CommonMark 6.9's simplified grammar: one or more of
/// `[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]`, then `@`, then a sequence of label
/// components separated by `.`, each an alphanumeric (optionally
/// hyphenated) run. Returns the byte length matched from the start of `s`
/// if `s` begins with a valid email, else `None`.
fn match_email(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && is_email_local(bytes[i]) {
        i += 1;
    }
    if i == 0 || bytes.get(i) != Some(&b'@') {
        return None;
    }
    i += 1;
    let domain_start = i;
    loop {
        let label_start = i;
        while i < bytes.len() && (isalnum(bytes[i]) || bytes[i] == b'-') {
            i += 1;
        }
        if i == label_start {
            return None;
        }
        if bytes.get(i) == Some(&b'.') {
            i += 1;
            continue;
        }
        break;
    }
    if i == domain_start {
        return None;
    }
    Some(i)
}

fn is_email_local(b: u8) -> bool {
    isalnum(b) || matches!(b, b'.' | b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'/' | b'=' | b'?' | b'^' | b'_' | b'`' | b'{' | b'|' | b'}' | b'~' | b'-')
}

/// GFM extended autolinks (gfm.md §6.5): `www.` prefixes, bare
/// `user@host` emails, and `http://`/`https://` forms not wrapped in
/// `<...>`. Scans `text[start..]` for the *earliest* match and returns
/// `(match_start, match_end, url, is_email)` in byte offsets relative to
/// the start of `text`.
pub fn find_extended(text: &str, from: usize) -> Option<(usize, usize, String, bool)> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        let c = bytes[i];
        let boundary_ok = i == 0 || !is_word_byte(bytes[i - 1]);
        if boundary_ok {
            if let Some(end) = www_autolink(text, i) {
                return Some((i, end, normalize_www(&text[i..end]), false));
            }
            if text[i..].starts_with("http://") || text[i..].starts_with("https://") {
                if let Some(end) = url_autolink(text, i) {
                    return Some((i, end, text[i..end].to_string(), false));
                }
            }
            if c.is_ascii_alphanumeric() || is_email_local(c) {
                if let Some((s, e)) = bare_email_at(text, i) {
                    return Some((s, e, format!("mailto:{}", &text[s..e]), true));
                }
            }
        }
        i += 1;
    }
    None
}

fn is_word_byte(b: u8) -> bool {
    isalnum(b) || b == b'_' || b >= 0x80
}

fn www_autolink(text: &str, start: usize) -> Option<usize> {
    if !text[start..].starts_with("www.") {
        return None;
    }
    url_autolink(text, start)
}

/// Scans a run of non-whitespace starting at `start`, then trims
/// trailing punctuation per GFM's autolink-extension rule: trailing `?`,
/// `!`, `.`, `,`, `:`, `*`, `_`, `~`, and a trailing `)` unless the run
/// has a balancing unmatched `(`.
fn url_autolink(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut end = start;
    while end < bytes.len() && !bytes[end].is_ascii_whitespace() && bytes[end] != b'<' {
        end += 1;
    }
    if end == start {
        return None;
    }
    Some(trim_trailing_punct(text, start, end))
}

fn trim_trailing_punct(text: &str, start: usize, mut end: usize) -> usize {
    let bytes = text.as_bytes();
    loop {
        if end <= start {
            break;
        }
        match bytes[end - 1] {
            b'?' | b'!' | b'.' | b',' | b':' | b'*' | b'_' | b'~' | b'\'' | b'"' => {
                end -= 1;
            }
            b')' => {
                let opens = text[start..end].matches('(').count();
                let closes = text[start..end].matches(')').count();
                if closes > opens {
                    end -= 1;
                } else {
                    break;
                }
            }
            b';' => {
                // Trim a trailing dangling entity-like `&amp;` fragment.
                if let Some(amp) = text[start..end].rfind('&') {
                    if text[start + amp..end].chars().skip(1).all(|c| c.is_alphanumeric()) {
                        end = start + amp;
                        continue;
                    }
                }
                break;
            }
            _ => break,
        }
    }
    end
}

fn bare_email_at(text: &str, at: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut start = at;
    while start > 0 && is_email_local(bytes[start - 1]) {
        start -= 1;
    }
    let local_len = match_email(&text[start..])?;
    let end = start + local_len;
    // Require the match to actually cover an `@`.
    if !text[start..end].contains('@') {
        return None;
    }
    Some((start, end))
}

fn normalize_www(url: &str) -> String {
    format!("http://{}", url)
}
