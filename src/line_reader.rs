//! §4.1 — normalizes a character stream into logical lines with stable,
//! 0-based line numbers. `\r`, `\n`, and `\r\n` are all single line ends;
//! U+0000 is replaced with U+FFFD; truncated input simply ends the stream.

/// One logical source line, numbered from the original input.
#[derive(Debug, Clone)]
pub struct RawLine {
    pub text: String,
    pub number: u32,
}

pub fn read_lines(input: &str) -> Vec<RawLine> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut number = 0u32;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\0' => cur.push('\u{FFFD}'),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push(RawLine {
                    text: std::mem::take(&mut cur),
                    number,
                });
                number += 1;
            }
            '\n' => {
                out.push(RawLine {
                    text: std::mem::take(&mut cur),
                    number,
                });
                number += 1;
            }
            _ => cur.push(c),
        }
    }
    if !cur.is_empty() {
        out.push(RawLine {
            text: cur,
            number,
        });
    }
    out
}
