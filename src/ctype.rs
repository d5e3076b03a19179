//! Byte-level character classification, restricted to the ASCII subset that
//! CommonMark's grammar actually cares about. Non-ASCII bytes (UTF-8
//! continuation/lead bytes) are never punctuation, space or digit here,
//! which is exactly what the spec requires: multi-byte sequences are opaque
//! to the scanners and only ASCII structural characters drive block/inline
//! classification.

#[rustfmt::skip]
const CLASS: [u8; 256] = [
    /*      0  1  2  3  4  5  6  7  8  9  a  b  c  d  e  f */
    /* 0 */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 0, 0, 1, 0, 0,
    /* 1 */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    /* 2 */ 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
    /* 3 */ 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 2, 2, 2, 2, 2, 2,
    /* 4 */ 2, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4,
    /* 5 */ 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 2, 2, 2, 2, 2,
    /* 6 */ 2, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4,
    /* 7 */ 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 2, 2, 2, 2, 0,
    /* 8 */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    /* 9 */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    /* a */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    /* b */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    /* c */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    /* d */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    /* e */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    /* f */ 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

pub fn isspace(ch: u8) -> bool {
    CLASS[ch as usize] == 1
}

pub fn ispunct(ch: u8) -> bool {
    CLASS[ch as usize] == 2
}

pub fn isdigit(ch: u8) -> bool {
    CLASS[ch as usize] == 3
}

pub fn isalpha(ch: u8) -> bool {
    CLASS[ch as usize] == 4
}

pub fn isalnum(ch: u8) -> bool {
    matches!(CLASS[ch as usize], 3 | 4)
}

pub fn is_line_end(ch: u8) -> bool {
    matches!(ch, b'\n' | b'\r')
}

pub fn is_space_or_tab(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t')
}

pub fn isxdigit(ch: u8) -> bool {
    ch.is_ascii_hexdigit()
}

/// True for bytes that continue or begin a non-ASCII UTF-8 sequence, which
/// CommonMark's flanking rules treat as "alphanumeric" for the purposes of
/// `_`'s intraword-emphasis suppression (§4.4).
pub fn is_unicode_continuation(ch: u8) -> bool {
    ch >= 0x80
}
