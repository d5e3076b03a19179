//! The inline parser (§4.4): delimiter scan, code/math spans, raw
//! HTML/autolinks, images, links, footnote references, and delimiter-run
//! emphasis resolution. Runs once per leaf block, after the block parser's
//! first pass has populated every reference/footnote definition (§2's
//! two-phase split), so forward references resolve.
//!
//! The "recursive inline parsing for links and emphasis" design note (§9)
//! is realized as [`resolve_emphasis`]/[`materialize`] being reusable on
//! any slice of already-scanned [`Chunk`]s — link and image text is
//! carved out of the main scan, resolved independently, and grafted back
//! in as a single node, rather than sharing mutable state across levels.

use super::{html, Builder, Ctx, Line, PendingTarget};
use crate::ctype::ispunct;
use crate::entity;
use crate::nodes::*;
use crate::span::{Pos, Span};
use crate::strings;
use smallvec::SmallVec;
use unicode_categories::UnicodeCategories;

/// One character of the flattened leaf-block buffer (§4.4's "concatenated
/// text of a leaf block"). `Soft`/`Hard` mark the join between two source
/// lines — a single space for the former, a `LineBreak` node for the
/// latter — keeping per-line source positions recoverable without a
/// separate offset table.
#[derive(Clone, Copy)]
enum Raw {
    Ch(char),
    Soft,
    Hard,
}

#[derive(Clone, Copy)]
struct Flat {
    raw: Raw,
    pos: Pos,
    line_start: bool,
}

fn char_at(buf: &[Flat], i: usize) -> Option<char> {
    match buf.get(i)?.raw {
        Raw::Ch(c) => Some(c),
        Raw::Soft | Raw::Hard => Some(' '),
    }
}

fn buf_slice_to_string(buf: &[Flat], from: usize, to: usize) -> String {
    let mut out = String::with_capacity(to.saturating_sub(from));
    for i in from..to.min(buf.len()) {
        match buf[i].raw {
            Raw::Ch(c) => out.push(c),
            Raw::Soft | Raw::Hard => out.push(' '),
        }
    }
    out
}

fn skip_ws(buf: &[Flat], mut i: usize) -> usize {
    while let Some(c) = char_at(buf, i) {
        if c.is_whitespace() {
            i += 1;
        } else {
            break;
        }
    }
    i
}

/// Flattens a leaf block's source lines into one character buffer,
/// honoring the hard/soft line-break rule (§4.8's "a trailing backslash at
/// end of line is a hard line break"; §4.4's "two or more trailing
/// spaces").
fn flatten(lines: &[Line]) -> Vec<Flat> {
    let mut buf = Vec::new();
    for (li, line) in lines.iter().enumerate() {
        let is_last = li + 1 == lines.len();
        let trimmed = strings::rtrim(&line.text);
        let trailing_ws = line.text.len() - trimmed.len();
        let (content, hard) = if !is_last && trailing_ws >= 2 {
            (trimmed, true)
        } else if trimmed.ends_with('\\') && trailing_backslash_count(trimmed) % 2 == 1 {
            (&trimmed[..trimmed.len() - 1], !is_last)
        } else {
            (trimmed, false)
        };
        let mut first = true;
        for (ci, ch) in content.chars().enumerate() {
            buf.push(Flat {
                raw: Raw::Ch(ch),
                pos: Pos::new(line.number, line.origin_col + ci as u32),
                line_start: first,
            });
            first = false;
        }
        if !is_last {
            let end_pos = Pos::new(line.number, line.origin_col + content.chars().count() as u32);
            buf.push(Flat {
                raw: if hard { Raw::Hard } else { Raw::Soft },
                pos: end_pos,
                line_start: false,
            });
        }
    }
    buf
}

fn trailing_backslash_count(s: &str) -> usize {
    s.chars().rev().take_while(|&c| c == '\\').count()
}

/// True iff `s`, trimmed, is entirely a concatenation of HTML tags (open,
/// close, or self-closing) with nothing else — the *free-tag* condition's
/// "the remainder of the line contains only HTML tags" (§4.6, glossary).
fn line_is_tags_only(s: &str) -> bool {
    let mut t = strings::trim(s);
    if t.is_empty() {
        return false;
    }
    let mut saw_one = false;
    while !t.is_empty() {
        t = strings::ltrim(t);
        if t.is_empty() {
            break;
        }
        if let Some(end) = crate::scanners::parse_open_tag(t) {
            t = &t[end..];
        } else if let Some(end) = crate::scanners::parse_closing_tag(t) {
            t = &t[end..];
        } else {
            return false;
        }
        saw_one = true;
    }
    saw_one
}

/// A delimiter-run or resolved inline construct awaiting final assembly
/// into [`NodeId`]s. Emphasis/strikethrough style is accumulated here
/// (not on a wrapper node — the data model has none, §3/§9) and painted
/// onto the `Text`/`Link` nodes that end up spanning the matched range.
struct Chunk {
    node: Option<NodeId>,
    text: String,
    delim_ch: Option<char>,
    len: usize,
    can_open: bool,
    can_close: bool,
    span: Span,
    style: TextStyle,
    open: Vec<StyleDelim>,
    close: Vec<StyleDelim>,
}

impl Chunk {
    fn text(text: String, span: Span) -> Chunk {
        Chunk {
            node: None,
            text,
            delim_ch: None,
            len: 0,
            can_open: false,
            can_close: false,
            span,
            style: TextStyle::NONE,
            open: Vec::new(),
            close: Vec::new(),
        }
    }

    fn node(id: NodeId, span: Span) -> Chunk {
        Chunk {
            node: Some(id),
            text: String::new(),
            delim_ch: None,
            len: 0,
            can_open: false,
            can_close: false,
            span,
            style: TextStyle::NONE,
            open: Vec::new(),
            close: Vec::new(),
        }
    }

    fn delim(ch: char, len: usize, span: Span, can_open: bool, can_close: bool) -> Chunk {
        Chunk {
            node: None,
            text: String::new(),
            delim_ch: Some(ch),
            len,
            can_open,
            can_close,
            span,
            style: TextStyle::NONE,
            open: Vec::new(),
            close: Vec::new(),
        }
    }
}

struct Bracket {
    /// Index in `items` of the `[`/`![` placeholder chunk.
    item_idx: usize,
    /// Index in `buf` where the bracket's interior text begins.
    content_start: usize,
    is_image: bool,
    /// True when this bracket is nested inside an image's alt text —
    /// links found here degrade to plain text (§4.4 item 4).
    suppressed: bool,
}

/// Per-leaf-block scanning state (§9's "mutable intermediate state",
/// applied to the inline parser rather than the block splitter).
struct Scan {
    buf: Vec<Flat>,
    /// The whole leaf block's text, reconstructed once, plus the byte
    /// offset of each `buf` char within it — feeds the plugin extension
    /// point (§6), which scans by `(full text, byte cursor)` rather than a
    /// pre-sliced suffix.
    full_text: String,
    byte_offsets: Vec<usize>,
    i: usize,
    items: Vec<Chunk>,
    delims: SmallVec<[usize; 8]>,
    brackets: SmallVec<[Bracket; 4]>,
    image_depth: usize,
    pending_text: String,
    pending_start: Option<Pos>,
    pending_end: Pos,
    first_line: u32,
    saw_dirty: bool,
    is_table_cell: bool,
}

impl Scan {
    fn new(lines: &[Line], is_table_cell: bool) -> Scan {
        let first_line = lines.first().map(|l| l.number).unwrap_or(0);
        let buf = flatten(lines);
        let mut full_text = String::new();
        let mut byte_offsets = Vec::with_capacity(buf.len());
        for f in &buf {
            byte_offsets.push(full_text.len());
            match f.raw {
                Raw::Ch(c) => full_text.push(c),
                Raw::Soft | Raw::Hard => full_text.push(' '),
            }
        }
        Scan {
            buf,
            full_text,
            byte_offsets,
            i: 0,
            items: Vec::new(),
            delims: SmallVec::new(),
            brackets: SmallVec::new(),
            image_depth: 0,
            pending_text: String::new(),
            pending_start: None,
            pending_end: Pos::default(),
            first_line,
            saw_dirty: false,
            is_table_cell,
        }
    }

    fn flush_text(&mut self) {
        if self.pending_text.is_empty() {
            return;
        }
        let start = self.pending_start.unwrap_or(self.pending_end);
        let span = Span::new(start, self.pending_end);
        self.items.push(Chunk::text(std::mem::take(&mut self.pending_text), span));
        self.pending_start = None;
    }

    fn push_pending(&mut self, s: &str, pos: Pos) {
        if self.pending_start.is_none() {
            self.pending_start = Some(pos);
        }
        self.pending_text.push_str(s);
        self.pending_end = pos;
    }

    fn run(&mut self, b: &mut Builder, ctx: &mut Ctx) {
        while self.i < self.buf.len() {
            let flat = self.buf[self.i];
            match flat.raw {
                Raw::Hard => {
                    self.flush_text();
                    let span = Span::point(flat.pos);
                    let id = b.alloc(NodeKind::LineBreak, span);
                    self.items.push(Chunk::node(id, span));
                    self.i += 1;
                }
                Raw::Soft => {
                    self.push_pending(" ", flat.pos);
                    self.i += 1;
                }
                Raw::Ch(c) => self.step(c, b, ctx),
            }
        }
        self.flush_text();
    }

    fn step(&mut self, c: char, b: &mut Builder, ctx: &mut Ctx) {
        match c {
            '\\' if self.i + 1 < self.buf.len() && matches!(char_at(&self.buf, self.i + 1), Some(p) if p.is_ascii() && ispunct(p as u8)) =>
            {
                let p = char_at(&self.buf, self.i + 1).unwrap();
                let pos = self.buf[self.i].pos;
                self.push_pending(&p.to_string(), pos);
                self.i += 2;
            }
            '&' => {
                let rest = buf_slice_to_string(&self.buf, self.i + 1, self.buf.len());
                if let Some((decoded, used)) = entity::unescape(rest.as_bytes()) {
                    self.push_pending(&decoded, self.buf[self.i].pos);
                    self.i += 1 + used;
                } else {
                    self.push_pending("&", self.buf[self.i].pos);
                    self.i += 1;
                }
            }
            '`' => self.code_span(b),
            '$' if ctx.options.extension.math => {
                if !self.math_span(b) {
                    self.push_pending("$", self.buf[self.i].pos);
                    self.i += 1;
                }
            }
            '<' => {
                if !self.angle(b, ctx) {
                    self.push_pending("<", self.buf[self.i].pos);
                    self.i += 1;
                }
            }
            '!' if char_at(&self.buf, self.i + 1) == Some('[') => {
                self.flush_text();
                let span = Span::on_line(self.buf[self.i].pos.line, self.buf[self.i].pos.col, self.buf[self.i].pos.col + 1);
                self.items.push(Chunk::text("![".to_string(), span));
                self.brackets.push(Bracket {
                    item_idx: self.items.len() - 1,
                    content_start: self.i + 2,
                    is_image: true,
                    suppressed: self.image_depth > 0,
                });
                self.image_depth += 1;
                self.i += 2;
            }
            '[' => {
                self.flush_text();
                let span = Span::point(self.buf[self.i].pos);
                self.items.push(Chunk::text("[".to_string(), span));
                self.brackets.push(Bracket {
                    item_idx: self.items.len() - 1,
                    content_start: self.i + 1,
                    is_image: false,
                    suppressed: self.image_depth > 0,
                });
                self.i += 1;
            }
            ']' => self.close_bracket(b, ctx),
            '*' | '_' => self.emphasis_run(c),
            '~' if ctx.options.extension.strikethrough && char_at(&self.buf, self.i + 1) == Some('~') => {
                self.strikethrough_run();
            }
            _ => {
                if ctx.options.extension.autolink && c.is_ascii_alphanumeric() {
                    let tail = buf_slice_to_string(&self.buf, self.i, line_end(&self.buf, self.i));
                    if let Some((s, e, url, _is_email)) = super::autolink::find_extended(&tail, 0) {
                        if s == 0 {
                            self.flush_text();
                            let text = tail[..e].to_string();
                            let start = self.buf[self.i].pos;
                            let end = Pos::new(start.line, start.col + e as u32 - 1);
                            let span = Span::new(start, end);
                            let id = b.alloc(
                                NodeKind::Link(LinkData {
                                    url,
                                    text,
                                    style: TextStyle::NONE,
                                    text_pos: span,
                                    url_pos: span,
                                    image: None,
                                    paragraph: None,
                                }),
                                span,
                            );
                            self.items.push(Chunk::node(id, span));
                            self.i += e;
                            return;
                        }
                    }
                }
                if self.try_plugins(b, ctx) {
                    return;
                }
                let pos = self.buf[self.i].pos;
                self.push_pending(&c.to_string(), pos);
                self.i += 1;
            }
        }
    }

    fn code_span(&mut self, b: &mut Builder) {
        let start = self.i;
        let n = backtick_run_len(&self.buf, start);
        let mut j = start + n;
        let mut close = None;
        while j < self.buf.len() {
            if matches!(self.buf[j].raw, Raw::Ch('`')) {
                let run = backtick_run_len(&self.buf, j);
                if run == n {
                    close = Some(j);
                    break;
                }
                j += run;
            } else {
                j += 1;
            }
        }
        match close {
            None => {
                self.flush_text();
                let pos = self.buf[start].pos;
                self.push_pending(&"`".repeat(n), pos);
                self.i = start + n;
            }
            Some(close_start) => {
                self.flush_text();
                let mut text = buf_slice_to_string(&self.buf, start + n, close_start);
                if text.len() > 1
                    && text.starts_with(' ')
                    && text.ends_with(' ')
                    && text.trim() != ""
                {
                    text = text[1..text.len() - 1].to_string();
                }
                let span = Span::new(self.buf[start].pos, self.buf[close_start + n - 1].pos);
                let id = b.alloc(
                    NodeKind::Code(CodeData {
                        text,
                        inline: true,
                        syntax: None,
                        fence: None,
                    }),
                    span,
                );
                self.items.push(Chunk::node(id, span));
                self.i = close_start + n;
            }
        }
    }

    fn math_span(&mut self, b: &mut Builder) -> bool {
        let start = self.i;
        let n = dollar_run_len(&self.buf, start);
        if n == 0 || n > 2 {
            return false;
        }
        let mut j = start + n;
        let mut close = None;
        while j < self.buf.len() {
            if matches!(self.buf[j].raw, Raw::Ch('$')) && !preceded_by_odd_backslashes(&self.buf, j) {
                let run = dollar_run_len(&self.buf, j);
                if run == n {
                    close = Some(j);
                    break;
                }
                j += run.max(1);
            } else {
                j += 1;
            }
        }
        let close_start = match close {
            Some(c) => c,
            None => return false,
        };
        self.flush_text();
        let text = buf_slice_to_string(&self.buf, start + n, close_start);
        let start_delim = Span::new(self.buf[start].pos, self.buf[start + n - 1].pos);
        let end_delim = Span::new(self.buf[close_start].pos, self.buf[close_start + n - 1].pos);
        let span = Span::new(self.buf[start].pos, self.buf[close_start + n - 1].pos);
        let id = b.alloc(
            NodeKind::Math(MathData {
                expr: text,
                inline: n == 1,
                start_delim,
                end_delim,
                syntax: None,
            }),
            span,
        );
        self.items.push(Chunk::node(id, span));
        self.i = close_start + n;
        true
    }

    fn angle(&mut self, b: &mut Builder, ctx: &mut Ctx) -> bool {
        let start = self.i;
        let tail_end = self.buf.len();
        // Bracketed autolink: `<scheme:...>` or `<email>`.
        if let Some(gt) = (start + 1..tail_end).find(|&k| matches!(self.buf[k].raw, Raw::Ch('>'))) {
            let inner = buf_slice_to_string(&self.buf, start + 1, gt);
            if let Some((url, _is_email)) = super::autolink::match_bracketed(&inner) {
                self.flush_text();
                let span = Span::new(self.buf[start].pos, self.buf[gt].pos);
                let id = b.alloc(
                    NodeKind::Link(LinkData {
                        url,
                        text: inner,
                        style: TextStyle::NONE,
                        text_pos: span,
                        url_pos: span,
                        image: None,
                        paragraph: None,
                    }),
                    span,
                );
                self.items.push(Chunk::node(id, span));
                self.i = gt + 1;
                return true;
            }
        }
        // Inline HTML (rule 7 open/close tag, or comment/PI/declaration/CDATA).
        let tail = buf_slice_to_string(&self.buf, start, tail_end);
        if let Some(len_bytes) = html::match_inline_html(&tail) {
            self.flush_text();
            let matched_text = tail[..len_bytes].to_string();
            let char_len = matched_text.chars().count();
            let first = self.buf[start];
            let line_only = line_is_tags_only_at(&self.buf, start);
            let free_tag = first.line_start && line_only;
            if free_tag && first.pos.line != self.first_line && !self.is_table_cell {
                self.saw_dirty = true;
            }
            let end_idx = (start + char_len - 1).min(self.buf.len() - 1);
            let span = Span::new(self.buf[start].pos, self.buf[end_idx].pos);
            let id = b.alloc(
                NodeKind::RawHtml(RawHtmlData {
                    text: matched_text,
                    free_tag,
                }),
                span,
            );
            self.items.push(Chunk::node(id, span));
            self.i = start + char_len;
            return true;
        }
        let _ = ctx;
        false
    }

    /// Consults user-supplied scanners (§6's extension surface) after the
    /// fixed precedence order and before the plain-text fallback.
    fn try_plugins(&mut self, b: &mut Builder, ctx: &mut Ctx) -> bool {
        if ctx.options.plugins.is_empty() {
            return false;
        }
        let cursor = self.byte_offsets[self.i];
        for plugin in &ctx.options.plugins {
            if let Some((kind, end_offset)) = plugin.scan(&self.full_text, cursor) {
                if end_offset <= cursor {
                    continue;
                }
                self.flush_text();
                let target = end_offset;
                let end_idx = self
                    .byte_offsets
                    .iter()
                    .position(|&o| o >= target)
                    .unwrap_or(self.buf.len())
                    .max(self.i + 1);
                let span = Span::new(self.buf[self.i].pos, self.buf[(end_idx - 1).min(self.buf.len() - 1)].pos);
                let id = b.alloc(kind, span);
                self.items.push(Chunk::node(id, span));
                self.i = end_idx;
                return true;
            }
        }
        false
    }

    fn emphasis_run(&mut self, ch: char) {
        self.flush_text();
        let start = self.i;
        let n = run_len(&self.buf, start, ch);
        let before = if start == 0 { None } else { char_at(&self.buf, start - 1) };
        let after = char_at(&self.buf, start + n);
        let (left_flanking, right_flanking, left_punct, right_punct) = flanking(before, after);
        let can_open = if ch == '_' {
            left_flanking && (!right_flanking || left_punct)
        } else {
            left_flanking
        };
        let can_close = if ch == '_' {
            right_flanking && (!left_flanking || right_punct)
        } else {
            right_flanking
        };
        let span = Span::on_line(self.buf[start].pos.line, self.buf[start].pos.col, self.buf[start].pos.col + n as u32 - 1);
        let chunk = Chunk::delim(ch, n, span, can_open, can_close);
        self.items.push(chunk);
        if can_open || can_close {
            self.delims.push(self.items.len() - 1);
        }
        self.i = start + n;
    }

    fn strikethrough_run(&mut self) {
        self.flush_text();
        let start = self.i;
        // Exactly two, and not part of a longer run.
        if char_at(&self.buf, start + 2) == Some('~') {
            self.push_pending("~~", self.buf[start].pos);
            self.i = start + 2;
            return;
        }
        let before = if start == 0 { None } else { char_at(&self.buf, start - 1) };
        let after = char_at(&self.buf, start + 2);
        let (left_flanking, right_flanking, _, _) = flanking(before, after);
        let span = Span::on_line(self.buf[start].pos.line, self.buf[start].pos.col, self.buf[start].pos.col + 1);
        let chunk = Chunk::delim('~', 2, span, left_flanking, right_flanking);
        self.items.push(chunk);
        if left_flanking || right_flanking {
            self.delims.push(self.items.len() - 1);
        }
        self.i = start + 2;
    }

    fn close_bracket(&mut self, b: &mut Builder, ctx: &mut Ctx) {
        let close_pos = self.buf[self.i].pos;
        let bracket = match self.brackets.pop() {
            Some(m) => m,
            None => {
                self.flush_text();
                self.push_pending("]", close_pos);
                self.i += 1;
                return;
            }
        };
        self.flush_text();
        if bracket.is_image {
            self.image_depth = self.image_depth.saturating_sub(1);
        }

        let content_start = bracket.content_start;
        let interior = buf_slice_to_string(&self.buf, content_start, self.i);

        if bracket.suppressed {
            self.items.push(Chunk::text("]".to_string(), Span::point(close_pos)));
            self.i += 1;
            return;
        }

        if !bracket.is_image && interior.starts_with('^') && ctx.options.extension.footnotes {
            let id = interior[1..].to_string();
            let key = ctx.scope_key("#^", &id);
            let span = Span::new(self.buf[bracket.item_idx].span.start, close_pos);
            let node = b.alloc(NodeKind::FootnoteRef(FootnoteRefData { id: key }), span);
            self.items.truncate(bracket.item_idx);
            self.items.push(Chunk::node(node, span));
            self.truncate_delims(bracket.item_idx);
            self.i += 1;
            return;
        }

        // Inline destination: `(url "title")`.
        if char_at(&self.buf, self.i + 1) == Some('(') {
            if let Some((url, title, url_span, consumed)) = parse_inline_dest(&self.buf, self.i + 2) {
                self.finish_link(b, ctx, bracket, interior, url, title, url_span, 2 + consumed, None);
                return;
            }
        }
        // Full reference: `[label]`.
        if char_at(&self.buf, self.i + 1) == Some('[') {
            if let Some((label, consumed)) = parse_bracket_label(&self.buf, self.i + 2) {
                if !label.is_empty() {
                    let key = ctx.scope_key("#", &label);
                    if let Some((url, title)) = ctx.ref_defs.get(&key).cloned() {
                        let up = Span::point(close_pos);
                        self.finish_link(b, ctx, bracket, interior, url, title, up, 2 + consumed, Some(key));
                        return;
                    }
                    self.items.push(Chunk::text("]".to_string(), Span::point(close_pos)));
                    let lit = buf_slice_to_string(&self.buf, self.i + 1, self.i + 2 + consumed);
                    self.items.push(Chunk::text(lit, Span::point(close_pos)));
                    self.i += 1 + 2 + consumed;
                    return;
                }
                // Collapsed reference `[]`.
                let key = ctx.scope_key("#", &interior);
                if let Some((url, title)) = ctx.ref_defs.get(&key).cloned() {
                    let up = Span::point(close_pos);
                    self.finish_link(b, ctx, bracket, interior, url, title, up, 2 + consumed, Some(key));
                    return;
                }
                self.items.push(Chunk::text("][]".to_string(), Span::point(close_pos)));
                self.i += 1 + 2 + consumed;
                return;
            }
        }
        // Shortcut reference.
        let key = ctx.scope_key("#", &interior);
        if let Some((url, title)) = ctx.ref_defs.get(&key).cloned() {
            let up = Span::point(close_pos);
            self.finish_link(b, ctx, bracket, interior, url, title, up, 1, Some(key));
            return;
        }
        self.items.push(Chunk::text("]".to_string(), Span::point(close_pos)));
        self.i += 1;
    }

    fn truncate_delims(&mut self, below: usize) {
        while let Some(&last) = self.delims.last() {
            if last >= below {
                self.delims.pop();
            } else {
                break;
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_link(
        &mut self,
        b: &mut Builder,
        ctx: &mut Ctx,
        bracket: Bracket,
        interior: String,
        url: String,
        title: Option<String>,
        url_pos: Span,
        consumed_after_bracket: usize,
        use_key: Option<String>,
    ) {
        // The node schema has no title field (DESIGN.md); titles are
        // resolved (for `clean_title`'s entity/escape handling) but not
        // retained.
        let _ = title;
        let text_start_item = bracket.item_idx + 1;
        let sub_items: Vec<Chunk> = self.items.split_off(text_start_item.min(self.items.len()));
        self.items.truncate(bracket.item_idx);

        let split_at = self
            .delims
            .iter()
            .position(|&idx| idx >= text_start_item)
            .unwrap_or(self.delims.len());
        let local_delims: SmallVec<[usize; 8]> = self
            .delims
            .split_off(split_at)
            .into_iter()
            .map(|idx| idx - text_start_item)
            .collect();

        let text_pos = Span::new(self.buf[bracket.content_start.min(self.buf.len() - 1)].pos, self.buf[self.i.saturating_sub(1).max(bracket.content_start)].pos);

        let mut sub_items = sub_items;
        resolve_emphasis(&mut sub_items, &local_delims);
        let children = materialize(sub_items, b);
        let para_span = text_pos;
        let para = b.alloc(NodeKind::Paragraph(ParagraphData { children, dirty: false }), para_span);

        if bracket.is_image {
            let resolved_url = resolve_local_target(ctx, &url);
            let span = Span::new(self.buf[bracket.item_idx].span.start, self.buf[self.i].pos);
            let node = b.alloc(
                NodeKind::Image(ImageData {
                    url: resolved_url,
                    alt: interior,
                    paragraph: Some(para),
                    text_pos,
                    url_pos,
                }),
                span,
            );
            self.items.push(Chunk::node(node, span));
        } else {
            let resolved_url = resolve_local_target(ctx, &url);
            let span = Span::new(self.buf[bracket.item_idx].span.start, self.buf[self.i].pos);
            let node = b.alloc(
                NodeKind::Link(LinkData {
                    url: resolved_url,
                    text: interior,
                    style: TextStyle::NONE,
                    text_pos,
                    url_pos,
                    image: None,
                    paragraph: Some(para),
                }),
                span,
            );
            if let Some(key) = use_key {
                ctx.labeled_links.entry(key).or_insert(node);
            }
            self.items.push(Chunk::node(node, span));
        }
        self.i += 1 + consumed_after_bracket;
    }
}

fn resolve_local_target(ctx: &mut Ctx, url: &str) -> String {
    if crate::multifile::is_local_markdown_link(url, &ctx.options.extensions) {
        let resolved = crate::multifile::resolve_relative(&ctx.working_path, url);
        ctx.links_to_parse.push(resolved.to_string_lossy().into_owned());
    }
    url.to_string()
}

fn line_end(buf: &[Flat], from: usize) -> usize {
    let mut j = from;
    while j < buf.len() && matches!(buf[j].raw, Raw::Ch(_)) {
        j += 1;
    }
    j
}

fn line_is_tags_only_at(buf: &[Flat], start: usize) -> bool {
    let end = line_end(buf, start);
    let start_of_line = {
        let mut s = start;
        while s > 0 && matches!(buf[s - 1].raw, Raw::Ch(_)) && !buf[s].line_start {
            s -= 1;
        }
        s
    };
    line_is_tags_only(&buf_slice_to_string(buf, start_of_line, end))
}

fn backtick_run_len(buf: &[Flat], start: usize) -> usize {
    let mut n = 0;
    while matches!(buf.get(start + n).map(|f| f.raw), Some(Raw::Ch('`'))) {
        n += 1;
    }
    n
}

fn dollar_run_len(buf: &[Flat], start: usize) -> usize {
    let mut n = 0;
    while matches!(buf.get(start + n).map(|f| f.raw), Some(Raw::Ch('$'))) {
        n += 1;
    }
    n
}

fn preceded_by_odd_backslashes(buf: &[Flat], i: usize) -> bool {
    let mut n = 0;
    let mut j = i;
    while j > 0 && matches!(buf[j - 1].raw, Raw::Ch('\\')) {
        n += 1;
        j -= 1;
    }
    n % 2 == 1
}

fn run_len(buf: &[Flat], start: usize, ch: char) -> usize {
    let mut n = 0;
    while matches!(buf.get(start + n).map(|f| f.raw), Some(Raw::Ch(c)) if c == ch) {
        n += 1;
    }
    n
}

enum Class {
    Space,
    Punct,
    Other,
}

fn classify(c: Option<char>) -> Class {
    match c {
        None => Class::Space,
        Some(c) if c.is_whitespace() => Class::Space,
        Some(c) if (c.is_ascii() && ispunct(c as u8)) || c.is_punctuation() || c.is_symbol() => Class::Punct,
        _ => Class::Other,
    }
}

/// Returns `(left_flanking, right_flanking, left_is_punct, right_is_punct)`
/// for a run bounded by `before`/`after` (§4.4's Flanking rule, CommonMark
/// 0.30 §6.2).
fn flanking(before: Option<char>, after: Option<char>) -> (bool, bool, bool, bool) {
    let (left_space, left_punct) = match classify(before) {
        Class::Space => (true, false),
        Class::Punct => (false, true),
        Class::Other => (false, false),
    };
    let (right_space, right_punct) = match classify(after) {
        Class::Space => (true, false),
        Class::Punct => (false, true),
        Class::Other => (false, false),
    };
    let left_flanking = !right_space && (!right_punct || left_space || left_punct);
    let right_flanking = !left_space && (!left_punct || right_space || right_punct);
    (left_flanking, right_flanking, left_punct, right_punct)
}

/// Parses `(url "title")` (the `(` already consumed by the caller)
/// starting at buffer index `start`. Returns `(url, title, url_span,
/// chars_consumed)` where `chars_consumed` includes the trailing `)`.
fn parse_inline_dest(buf: &[Flat], start: usize) -> Option<(String, Option<String>, Span, usize)> {
    let mut i = skip_ws(buf, start);
    let url_start = i;
    let url_raw;
    if char_at(buf, i) == Some('<') {
        let mut j = i + 1;
        loop {
            match char_at(buf, j)? {
                '>' => break,
                '\\' if j + 1 < buf.len() => j += 2,
                _ => j += 1,
            }
        }
        url_raw = buf_slice_to_string(buf, i, j + 1);
        i = j + 1;
    } else {
        let mut depth = 0i32;
        let mut j = i;
        loop {
            match char_at(buf, j) {
                Some('(') => {
                    depth += 1;
                    j += 1;
                }
                Some(')') => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    j += 1;
                }
                Some(c) if c.is_whitespace() => break,
                Some('\\') if j + 1 < buf.len() => j += 2,
                Some(_) => j += 1,
                None => break,
            }
        }
        if j == i {
            return None;
        }
        url_raw = buf_slice_to_string(buf, i, j);
        i = j;
    }
    let url_end = i;
    let url = strings::clean_url(&url_raw);
    let url_span = Span::new(buf.get(url_start)?.pos, buf.get(url_end.saturating_sub(1).max(url_start))?.pos);
    i = skip_ws(buf, i);
    let mut title = None;
    if matches!(char_at(buf, i), Some('"') | Some('\'') | Some('(')) {
        let open = char_at(buf, i).unwrap();
        let close = if open == '(' { ')' } else { open };
        let mut j = i + 1;
        loop {
            match char_at(buf, j) {
                Some(c) if c == close => break,
                Some('\\') if j + 1 < buf.len() => j += 2,
                Some(_) => j += 1,
                None => return None,
            }
        }
        let raw = buf_slice_to_string(buf, i, j + 1);
        title = Some(strings::clean_title(&raw));
        i = j + 1;
    }
    i = skip_ws(buf, i);
    if char_at(buf, i) != Some(')') {
        return None;
    }
    i += 1;
    Some((url, title, url_span, i - start))
}

fn parse_bracket_label(buf: &[Flat], start: usize) -> Option<(String, usize)> {
    let mut j = start;
    loop {
        match char_at(buf, j)? {
            ']' => break,
            '\\' if j + 1 < buf.len() => j += 2,
            _ => j += 1,
        }
    }
    let label = strings::trim(&buf_slice_to_string(buf, start, j)).to_string();
    Some((label, (j - start) + 1))
}

/// The delimiter-run matching algorithm (§4.4): resolves every closer
/// against the nearest compatible opener (rule of three included),
/// painting style onto the chunks strictly between each matched pair.
/// `delims` indexes into `items`, in left-to-right encounter order.
fn resolve_emphasis(items: &mut [Chunk], delims: &[usize]) {
    let mut ci = 0usize;
    while ci < delims.len() {
        loop {
            let closer_idx = delims[ci];
            if items[closer_idx].len == 0 || !items[closer_idx].can_close {
                break;
            }
            let closer_ch = items[closer_idx].delim_ch.unwrap();
            let mut found = None;
            let mut k = ci;
            while k > 0 {
                k -= 1;
                let oi = delims[k];
                if items[oi].len == 0 || items[oi].delim_ch != Some(closer_ch) || !items[oi].can_open {
                    continue;
                }
                let o_len = items[oi].len;
                let c_len = items[closer_idx].len;
                let blocked = (items[oi].can_close || items[closer_idx].can_open)
                    && (o_len + c_len) % 3 == 0;
                if blocked {
                    continue;
                }
                found = Some(k);
                break;
            }
            let Some(k) = found else { break };
            let oi = delims[k];
            let use_delims = if items[oi].len >= 2 && items[closer_idx].len >= 2 { 2 } else { 1 };
            let style = match closer_ch {
                '~' => TextStyle::STRIKETHROUGH,
                _ if use_delims == 2 => TextStyle::BOLD,
                _ => TextStyle::ITALIC,
            };

            let opener_span = items[oi].span;
            let open_consumed = Span::on_line(
                opener_span.end.line,
                opener_span.end.col + 1 - use_delims as u32,
                opener_span.end.col,
            );
            items[oi].span = Span::new(opener_span.start, Pos::new(opener_span.end.line, opener_span.end.col - use_delims as u32));

            let closer_span = items[closer_idx].span;
            let close_consumed = Span::on_line(
                closer_span.start.line,
                closer_span.start.col,
                closer_span.start.col + use_delims as u32 - 1,
            );
            items[closer_idx].span = Span::new(Pos::new(closer_span.start.line, closer_span.start.col + use_delims as u32), closer_span.end);

            if oi + 1 <= closer_idx.saturating_sub(1) || oi + 1 == closer_idx {
                let first = oi + 1;
                let last = closer_idx - 1;
                if first <= last {
                    for item in items.iter_mut().take(last + 1).skip(first) {
                        item.style.insert(style);
                    }
                    items[first].open.push(StyleDelim { style, span: open_consumed });
                    items[last].close.push(StyleDelim { style, span: close_consumed });
                }
            }

            items[oi].len -= use_delims;
            items[closer_idx].len -= use_delims;
        }
        ci += 1;
    }
}

/// Converts a resolved `[Chunk]` sequence into final `NodeId`s, merging
/// adjacent plain-text runs that ended up with identical style (§4.4
/// item 8's "optimization pass").
fn materialize(items: Vec<Chunk>, b: &mut Builder) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut acc: Option<(String, Span, TextStyle, Vec<StyleDelim>, Vec<StyleDelim>, bool, bool)> = None;

    let flush_acc = |acc: &mut Option<(String, Span, TextStyle, Vec<StyleDelim>, Vec<StyleDelim>, bool, bool)>, b: &mut Builder, out: &mut Vec<NodeId>| {
        if let Some((text, span, style, open, close, space_before, space_after)) = acc.take() {
            if !text.is_empty() {
                let id = b.alloc(
                    NodeKind::Text(TextData {
                        text,
                        style,
                        space_before,
                        space_after,
                        open_styles: open,
                        close_styles: close,
                    }),
                    span,
                );
                out.push(id);
            }
        }
    };

    for item in items {
        if let Some(node_id) = item.node {
            flush_acc(&mut acc, b, &mut out);
            if item.style != TextStyle::NONE {
                if let NodeKind::Link(data) = b.get_mut(node_id) {
                    data.style.insert(item.style);
                }
            }
            out.push(node_id);
            continue;
        }
        let text = match item.delim_ch {
            Some(ch) => ch.to_string().repeat(item.len),
            None => item.text,
        };
        if text.is_empty() {
            continue;
        }
        let space_before = text.starts_with(' ');
        let space_after = text.ends_with(' ');
        let merge_with_prev = acc
            .as_ref()
            .map(|(_, _, style, _, _, _, _)| *style == item.style)
            .unwrap_or(false);
        if merge_with_prev {
            let (t, span, _, open, close, _, new_after) = acc.as_mut().unwrap();
            t.push_str(&text);
            span.end = item.span.end;
            open.extend(item.open);
            close.extend(item.close);
            *new_after = space_after;
        } else {
            flush_acc(&mut acc, b, &mut out);
            acc = Some((text, item.span, item.style, item.open, item.close, space_before, space_after));
        }
    }
    flush_acc(&mut acc, b, &mut out);
    out
}

/// Parses one pending leaf block's text into its final inline children.
fn parse_inline_lines(lines: &[Line], b: &mut Builder, ctx: &mut Ctx, is_table_cell: bool) -> (Vec<NodeId>, bool) {
    if lines.is_empty() || lines.iter().all(|l| l.text.is_empty()) {
        return (Vec::new(), false);
    }
    let mut scan = Scan::new(lines, is_table_cell);
    scan.run(b, ctx);
    let delims: SmallVec<[usize; 8]> = scan.delims.clone();
    resolve_emphasis(&mut scan.items, &delims);
    let dirty = scan.saw_dirty;
    (materialize(scan.items, b), dirty)
}

/// Drains the context's pending-inline queue (populated by the block
/// parser's first pass), running inline parsing now that every
/// reference/footnote definition in scope has been seen.
pub fn resolve_pending(b: &mut Builder, ctx: &mut Ctx) {
    let pending = std::mem::take(&mut ctx.pending);
    for item in pending {
        let is_table_cell = matches!(item.target, PendingTarget::TableCell(_));
        let (children, dirty) = parse_inline_lines(&item.lines, b, ctx, is_table_cell);
        match item.target {
            PendingTarget::Paragraph(id) => {
                if let NodeKind::Paragraph(data) = b.get_mut(id) {
                    data.children = children;
                    data.dirty = dirty;
                }
            }
            PendingTarget::TableCell(id) => {
                if let NodeKind::TableCell(data) = b.get_mut(id) {
                    data.children = children;
                }
            }
        }
    }
}
