//! The block parser (§4.2, §4.3): classifies each line, groups fragments,
//! and emits block nodes, recursing into containers. Reference-link and
//! footnote definitions are resolved block-at-a-time here, so by the time
//! [`super::inlines::resolve_pending`] runs, every label is already in
//! scope regardless of source order (§2's forward-reference requirement).

use super::table::{looks_like_table_header, parse_table_fragment};
use super::{Builder, Ctx, Line, PendingInline, PendingTarget};
use crate::nodes::*;
use crate::scanners;
use crate::span::{Pos, Span};
use crate::strings;

const CODE_INDENT: usize = 4;

fn indent_width(s: &str) -> usize {
    let mut w = 0;
    for c in s.chars() {
        match c {
            ' ' => w += 1,
            '\t' => w += 4 - (w % 4),
            _ => break,
        }
    }
    w
}

fn leading_ws_chars(s: &str) -> usize {
    s.chars().take_while(|&c| c == ' ' || c == '\t').count()
}

fn strip_indent(line: &Line, cols: usize) -> Line {
    let mut remaining = cols;
    let mut consumed_chars = 0;
    for c in line.text.chars() {
        if remaining == 0 {
            break;
        }
        match c {
            ' ' => {
                remaining -= 1;
                consumed_chars += 1;
            }
            '\t' => {
                let w = 4 - (consumed_chars % 4).min(4);
                remaining = remaining.saturating_sub(w);
                consumed_chars += 1;
            }
            _ => break,
        }
    }
    let text: String = line.text.chars().skip(consumed_chars).collect();
    Line {
        text,
        number: line.number,
        origin_col: line.origin_col + consumed_chars as u32,
    }
}

fn is_blank_line(l: &Line) -> bool {
    strings::is_blank(&l.text)
}

/// The main recursive entry: parses a run of (already container-stripped)
/// lines into an ordered list of block nodes.
pub fn parse_blocks(lines: &[Line], b: &mut Builder, ctx: &mut Ctx) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if is_blank_line(&lines[i]) {
            i += 1;
            continue;
        }
        let (node, next) = parse_one_block(lines, i, b, ctx);
        if let Some(node) = node {
            out.push(node);
        }
        debug_assert!(next > i);
        i = next;
    }
    out
}

fn parse_one_block(
    lines: &[Line],
    i: usize,
    b: &mut Builder,
    ctx: &mut Ctx,
) -> (Option<NodeId>, usize) {
    let line = &lines[i];
    let indent = leading_ws_chars(&line.text);
    let trimmed = &line.text[indent.min(line.text.len())..];

    if indent < CODE_INDENT {
        if scanners::thematic_break(trimmed) && scanners::bullet_list_marker(trimmed).is_none() {
            let span = Span::on_line(line.number, line.origin_col, line.end_col().saturating_sub(1));
            return (Some(b.alloc(NodeKind::HorizontalLine, span)), i + 1);
        }
        if let Some((level, _)) = scanners::atx_heading_start(trimmed) {
            return (Some(parse_atx_heading(line, level, trimmed, b, ctx)), i + 1);
        }
        if let Some((fence_char, fence_len, info_off)) = scanners::open_code_fence(trimmed) {
            return parse_fenced_code(lines, i, indent, fence_char, fence_len, info_off, b, ctx);
        }
        if ctx.options.extension.footnotes {
            if let Some((id, _)) = scanners::footnote_def_start(trimmed) {
                return parse_footnote(lines, i, id.to_string(), b, ctx);
            }
        }
        if scanners::html_block_start(trimmed).is_some() {
            return parse_html_block(lines, i, trimmed, b, ctx);
        }
        if scanners::blockquote_marker(trimmed).is_some() {
            return parse_blockquote(lines, i, b, ctx);
        }
        if scanners::bullet_list_marker(trimmed).is_some()
            || scanners::ordered_list_marker(trimmed).is_some()
        {
            return parse_list(lines, i, b, ctx);
        }
        if let Some(url_line) = try_reference_definition(lines, i) {
            return parse_reference_definitions(lines, i, url_line, ctx);
        }
    } else {
        return parse_indented_code(lines, i, b);
    }

    parse_paragraph_or_setext_or_table(lines, i, b, ctx)
}

// ---------------------------------------------------------------- heading

fn parse_atx_heading(
    line: &Line,
    level: u8,
    trimmed: &str,
    b: &mut Builder,
    ctx: &mut Ctx,
) -> NodeId {
    let (_, content_off) = scanners::atx_heading_start(trimmed).unwrap();
    let mut text = trimmed[content_off..].to_string();
    let label = scanners::heading_label_suffix(&text).map(|(rest, lab)| {
        text = rest.to_string();
        lab.to_string()
    });
    let text = strings::trim(strings::rtrim_hashes(&text)).to_string();

    let span = Span::on_line(line.number, line.origin_col, line.end_col().saturating_sub(1));
    let para = b.alloc(
        NodeKind::Paragraph(ParagraphData::default()),
        span,
    );
    let label = label.unwrap_or_else(|| {
        let slug = strings::slugify(&text);
        format!("{}", slug)
    });
    let key = ctx.scope_key("#", &label);
    let heading = b.alloc(
        NodeKind::Heading(HeadingData {
            level,
            text: para,
            label: Some(label),
        }),
        span,
    );
    ctx.labeled_headings.entry(key).or_insert(heading);
    ctx.pending.push(PendingInline {
        target: PendingTarget::Paragraph(para),
        lines: vec![Line {
            text: text,
            number: line.number,
            origin_col: line.origin_col + content_off as u32,
        }],
    });
    heading
}

// ------------------------------------------------------------- thematics

pub(crate) fn span_of_lines(lines: &[Line]) -> Span {
    let first = &lines[0];
    let last = &lines[lines.len() - 1];
    Span::new(first.start_pos(), last.end_pos())
}

// --------------------------------------------------------------- fenced

fn parse_fenced_code(
    lines: &[Line],
    start: usize,
    indent: usize,
    fence_char: u8,
    fence_len: usize,
    info_off: usize,
    b: &mut Builder,
    ctx: &mut Ctx,
) -> (Option<NodeId>, usize) {
    let open_line = &lines[start];
    let open_trimmed = &open_line.text[indent.min(open_line.text.len())..];
    let info = strings::trim(&open_trimmed[info_off.min(open_trimmed.len())..]).to_string();
    let info = strings::unescape(&crate::entity::unescape_html(&info));

    let mut end = start + 1;
    let mut body: Vec<String> = Vec::new();
    let mut close_line_idx = None;
    while end < lines.len() {
        let t = &lines[end].text;
        let li = leading_ws_chars(t).min(3);
        if scanners::close_code_fence(&t[li..], fence_char, fence_len) {
            close_line_idx = Some(end);
            end += 1;
            break;
        }
        body.push(strip_fence_indent(t, indent));
        end += 1;
    }

    let text = body.join("\n");
    let syntax_token = info.split_whitespace().next().map(|s| s.to_string());
    let open_span = Span::on_line(
        open_line.number,
        open_line.origin_col + indent as u32,
        open_line.origin_col + indent as u32 + fence_len as u32 - 1,
    );
    let close_span = close_line_idx.map(|idx| {
        let l = &lines[idx];
        let li = leading_ws_chars(&l.text).min(3) as u32;
        Span::on_line(l.number, l.origin_col + li, l.origin_col + li + fence_len as u32 - 1)
    });
    let syntax_span = if syntax_token.is_some() {
        Some(Span::on_line(
            open_line.number,
            open_line.origin_col + info_off as u32,
            open_line.origin_col + info_off as u32 + syntax_token.as_ref().unwrap().len() as u32,
        ))
    } else {
        None
    };

    let last_idx = end.saturating_sub(1).max(start);
    let overall_span = Span::new(open_line.start_pos(), lines[last_idx].end_pos());

    let is_math = ctx.options.extension.math
        && syntax_token
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("math"))
            .unwrap_or(false);

    let node = if is_math {
        b.alloc(
            NodeKind::Math(MathData {
                expr: text,
                inline: false,
                start_delim: open_span,
                end_delim: close_span.unwrap_or(open_span),
                syntax: syntax_span,
            }),
            overall_span,
        )
    } else {
        b.alloc(
            NodeKind::Code(CodeData {
                text,
                inline: false,
                syntax: syntax_token,
                fence: Some(FenceDelims {
                    open: open_span,
                    close: close_span,
                    syntax: syntax_span,
                }),
            }),
            overall_span,
        )
    };

    (Some(node), end)
}

fn strip_fence_indent(line: &str, indent: usize) -> String {
    let w = leading_ws_chars(line).min(indent.min(3));
    line.chars().skip(w).collect()
}

// ------------------------------------------------------------- indented

fn parse_indented_code(lines: &[Line], start: usize, b: &mut Builder) -> (Option<NodeId>, usize) {
    let mut end = start;
    let mut body = Vec::new();
    while end < lines.len() {
        let l = &lines[end];
        if is_blank_line(l) {
            // Peek: keep consuming if a further indented line follows.
            let mut j = end;
            while j < lines.len() && is_blank_line(&lines[j]) {
                j += 1;
            }
            if j < lines.len() && indent_width(&lines[j].text) >= CODE_INDENT {
                for k in end..j {
                    body.push(String::new());
                    end = k + 1;
                }
                continue;
            } else {
                break;
            }
        }
        if indent_width(&l.text) < CODE_INDENT {
            break;
        }
        body.push(strip_indent(l, CODE_INDENT).text);
        end += 1;
    }
    while body.last().map(|s| s.is_empty()).unwrap_or(false) {
        body.pop();
    }
    let span = span_of_lines(&lines[start..end]);
    let node = b.alloc(
        NodeKind::Code(CodeData {
            text: body.join("\n"),
            inline: false,
            syntax: None,
            fence: None,
        }),
        span,
    );
    (Some(node), end)
}

// -------------------------------------------------------------- raw HTML

/// Raw HTML block (§4.6): dispatches on which of the seven rules opened
/// the block, then consumes lines per that rule's closing condition.
/// Rules 1–5 are allowed to run to end-of-input if unterminated (§7); 6/7
/// close at the next blank line.
fn parse_html_block(
    lines: &[Line],
    start: usize,
    first_trimmed: &str,
    b: &mut Builder,
    _ctx: &mut Ctx,
) -> (Option<NodeId>, usize) {
    use scanners::HtmlBlockRule::*;
    let rule = scanners::html_block_start(first_trimmed).unwrap();

    let mut end = start + 1;
    match rule {
        Rule1 | Rule2 | Rule3 | Rule4 | Rule5 => {
            let closes = |t: &str| -> bool {
                let lower = t.to_ascii_lowercase();
                match rule {
                    Rule1 => ["</pre", "</script", "</style", "</textarea"]
                        .iter()
                        .any(|tag| lower.contains(tag)),
                    Rule2 => t.contains("-->"),
                    Rule3 => t.contains("?>"),
                    Rule4 => t.contains('>'),
                    Rule5 => t.contains("]]>"),
                    _ => unreachable!(),
                }
            };
            if closes(first_trimmed) {
                // Already closed on the opening line.
            } else {
                while end < lines.len() && !closes(&lines[end].text) {
                    end += 1;
                }
                if end < lines.len() {
                    end += 1;
                }
                // Else: unterminated — extends to end-of-input (§7).
            }
        }
        Rule6 | Rule7 => {
            while end < lines.len() && !is_blank_line(&lines[end]) {
                end += 1;
            }
        }
    }

    let text = lines[start..end]
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let span = span_of_lines(&lines[start..end]);
    let node = b.alloc(
        NodeKind::RawHtml(RawHtmlData {
            text,
            free_tag: true,
        }),
        span,
    );
    (Some(node), end)
}

// ------------------------------------------------------------ blockquote

fn parse_blockquote(lines: &[Line], start: usize, b: &mut Builder, ctx: &mut Ctx) -> (Option<NodeId>, usize) {
    let mut end = start;
    let mut inner: Vec<Line> = Vec::new();
    let mut markers: Vec<Span> = Vec::new();

    while end < lines.len() {
        let l = &lines[end];
        let indent = leading_ws_chars(&l.text).min(3);
        let trimmed = &l.text[indent..];
        if let Some(off) = scanners::blockquote_marker(trimmed) {
            markers.push(Span::on_line(
                l.number,
                l.origin_col + indent as u32,
                l.origin_col + indent as u32,
            ));
            let consumed = indent + off;
            inner.push(strip_indent(l, consumed));
            end += 1;
        } else if is_blank_line(l) {
            break;
        } else if !starts_new_block(trimmed) {
            // Lazy continuation.
            inner.push(l.clone());
            end += 1;
        } else {
            break;
        }
    }

    let span = span_of_lines(&lines[start..end]);
    let children = parse_blocks(&inner, b, ctx);
    let node = b.alloc(
        NodeKind::Blockquote(BlockquoteData {
            children,
            marker_positions: markers,
        }),
        span,
    );
    (Some(node), end)
}

fn starts_new_block(trimmed: &str) -> bool {
    scanners::atx_heading_start(trimmed).is_some()
        || scanners::open_code_fence(trimmed).is_some()
        || scanners::blockquote_marker(trimmed).is_some()
        || scanners::html_block_start(trimmed).is_some()
        || (scanners::thematic_break(trimmed) && scanners::bullet_list_marker(trimmed).is_none())
}

// ------------------------------------------------------------------ list

fn parse_list(lines: &[Line], start: usize, b: &mut Builder, ctx: &mut Ctx) -> (Option<NodeId>, usize) {
    let first_indent = leading_ws_chars(&lines[start].text).min(3);
    let first_trimmed = &lines[start].text[first_indent..];
    let (marker_kind, ordered_delim) =
        if let Some((_, d, _)) = scanners::ordered_list_marker(first_trimmed) {
            let delim = if d == b'.' {
                OrderedDelim::Dot
            } else {
                OrderedDelim::Paren
            };
            (ListType::Ordered, Some(delim))
        } else {
            (ListType::Unordered, None)
        };
    let marker_char = scanners::bullet_list_marker(first_trimmed).map(|(c, _)| c);

    let mut items = Vec::new();
    let mut end = start;
    loop {
        if end >= lines.len() {
            break;
        }
        if is_blank_line(&lines[end]) {
            let mut j = end;
            while j < lines.len() && is_blank_line(&lines[j]) {
                j += 1;
            }
            if j >= lines.len() || !same_list_marker(&lines[j], marker_kind, marker_char, ordered_delim) {
                break;
            }
            end = j;
            continue;
        }
        if !same_list_marker(&lines[end], marker_kind, marker_char, ordered_delim) {
            break;
        }
        let (item, next) = parse_list_item(lines, end, marker_kind, ordered_delim, b, ctx);
        items.push(item);
        end = next;
    }

    let span = span_of_lines(&lines[start..end]);
    let node = b.alloc(NodeKind::List(ListData { items }), span);
    (Some(node), end)
}

fn same_list_marker(
    line: &Line,
    kind: ListType,
    marker_char: Option<u8>,
    ordered_delim: Option<OrderedDelim>,
) -> bool {
    let indent = leading_ws_chars(&line.text).min(3);
    let trimmed = &line.text[indent..];
    match kind {
        ListType::Unordered => scanners::bullet_list_marker(trimmed)
            .map(|(c, _)| Some(c) == marker_char)
            .unwrap_or(false),
        ListType::Ordered => scanners::ordered_list_marker(trimmed)
            .map(|(_, d, _)| {
                let d = if d == b'.' {
                    OrderedDelim::Dot
                } else {
                    OrderedDelim::Paren
                };
                Some(d) == ordered_delim
            })
            .unwrap_or(false),
    }
}

fn parse_list_item(
    lines: &[Line],
    start: usize,
    kind: ListType,
    ordered_delim: Option<OrderedDelim>,
    b: &mut Builder,
    ctx: &mut Ctx,
) -> (NodeId, usize) {
    let first = &lines[start];
    let indent = leading_ws_chars(&first.text).min(3);
    let trimmed = &first.text[indent..];

    let (marker_width, start_number) = match kind {
        ListType::Unordered => {
            let (_, off) = scanners::bullet_list_marker(trimmed).unwrap();
            (off, 1)
        }
        ListType::Ordered => {
            let (n, _, off) = scanners::ordered_list_marker(trimmed).unwrap();
            (off, n)
        }
    };
    let content_indent = indent + marker_width;
    let marker_span = Span::on_line(
        first.number,
        first.origin_col + indent as u32,
        first.origin_col + (content_indent.saturating_sub(1)) as u32,
    );

    let mut item_lines: Vec<Line> = vec![strip_indent(first, content_indent)];
    let mut end = start + 1;
    loop {
        if end >= lines.len() {
            break;
        }
        let l = &lines[end];
        if is_blank_line(l) {
            let mut j = end;
            while j < lines.len() && is_blank_line(&lines[j]) {
                j += 1;
            }
            if j < lines.len() && indent_width(&lines[j].text) >= content_indent {
                for k in end..j {
                    let _ = k;
                    item_lines.push(Line {
                        text: String::new(),
                        number: lines[k].number,
                        origin_col: lines[k].origin_col,
                    });
                }
                end = j;
                continue;
            } else {
                break;
            }
        }
        if indent_width(&l.text) >= content_indent {
            item_lines.push(strip_indent(l, content_indent));
            end += 1;
        } else {
            break;
        }
    }

    let mut task_list = false;
    let mut checked = false;
    if ctx.options.extension.tasklist {
        if let Some(first_line) = item_lines.first_mut() {
            if let Some((flag, rest_off)) = parse_task_marker(&first_line.text) {
                task_list = true;
                checked = flag;
                *first_line = Line {
                    text: first_line.text[rest_off..].to_string(),
                    number: first_line.number,
                    origin_col: first_line.origin_col + rest_off as u32,
                };
            }
        }
    }

    let span = span_of_lines(&lines[start..end]);
    let children = parse_blocks(&item_lines, b, ctx);
    let pre_state = if start_number == 1 {
        OrderedPreState::Start
    } else {
        OrderedPreState::Continue
    };
    let ordered = if kind == ListType::Ordered {
        Some(OrderedMeta {
            start: start_number,
            delim: ordered_delim.unwrap_or(OrderedDelim::Dot),
            pre_state,
        })
    } else {
        None
    };
    let node = b.alloc(
        NodeKind::ListItem(ListItemData {
            list_type: kind,
            ordered,
            task_list,
            checked,
            marker_span,
            children,
        }),
        span,
    );
    (node, end)
}

fn parse_task_marker(text: &str) -> Option<(bool, usize)> {
    let bytes = text.as_bytes();
    if bytes.len() < 3 || bytes[0] != b'[' || bytes[2] != b']' {
        return None;
    }
    let flag = match bytes[1] {
        b' ' => false,
        b'x' | b'X' => true,
        _ => return None,
    };
    let mut off = 3;
    if bytes.get(off) == Some(&b' ') {
        off += 1;
    }
    Some((flag, off))
}

// -------------------------------------------------------------- footnote

fn parse_footnote(
    lines: &[Line],
    start: usize,
    id: String,
    b: &mut Builder,
    ctx: &mut Ctx,
) -> (Option<NodeId>, usize) {
    let first = &lines[start];
    let indent = leading_ws_chars(&first.text).min(3);
    let trimmed = &first.text[indent..];
    let (_, off) = scanners::footnote_def_start(trimmed).unwrap();

    let mut body_lines: Vec<Line> = vec![strip_indent(first, indent + off)];
    let mut end = start + 1;
    loop {
        if end >= lines.len() {
            break;
        }
        let l = &lines[end];
        if is_blank_line(l) {
            body_lines.push(Line {
                text: String::new(),
                number: l.number,
                origin_col: l.origin_col,
            });
            end += 1;
            continue;
        }
        if indent_width(&l.text) >= CODE_INDENT {
            body_lines.push(strip_indent(l, CODE_INDENT));
            end += 1;
        } else {
            break;
        }
    }
    while body_lines.last().map(|l| is_blank_line(l)).unwrap_or(false) {
        body_lines.pop();
        end -= 1;
    }

    let span = span_of_lines(&lines[start..end]);
    let children = parse_blocks(&body_lines, b, ctx);
    if children.is_empty() {
        // Empty footnotes are discarded (§3 invariant); still consume the
        // fragment so parsing makes forward progress.
        return (None, end);
    }
    let node = b.alloc(NodeKind::Footnote(FootnoteData { children }), span);
    let key = ctx.scope_key("#^", &id);
    ctx.footnotes.entry(key).or_insert(node);
    (Some(node), end)
}

// --------------------------------------------------------- reference def

fn try_reference_definition(lines: &[Line], start: usize) -> Option<usize> {
    let t = lines[start].text.trim_start();
    if !t.starts_with('[') {
        return None;
    }
    let close = t.find("]:")?;
    if t[1..close].is_empty() {
        return None;
    }
    Some(start)
}

fn parse_reference_definitions(
    lines: &[Line],
    start: usize,
    _url_line: usize,
    ctx: &mut Ctx,
) -> (Option<NodeId>, usize) {
    let mut end = start;
    // A run of consecutive `[label]: url "title"` lines, each optionally
    // spilling its title onto the following physical line. The first
    // definition for a given label wins (CommonMark 5.5).
    while end < lines.len() && !is_blank_line(&lines[end]) {
        let t = lines[end].text.trim_start();
        if !t.starts_with('[') {
            break;
        }
        let Some(close) = t.find("]:") else { break };
        let label = &t[1..close];
        if label.is_empty() {
            break;
        }
        let rest = t[close + 2..].trim_start();
        let (url, title, consumed_next) = parse_ref_url_title(rest, lines.get(end + 1));
        let key = ctx.scope_key("#", label);
        ctx.ref_defs.entry(key).or_insert((url, title));
        end += 1;
        if consumed_next {
            end += 1;
        }
    }
    (None, end.max(start + 1))
}

fn parse_ref_url_title(rest: &str, next_line: Option<&Line>) -> (String, Option<String>, bool) {
    let rest = rest.trim();
    let (url_part, title_part) = split_url_and_title(rest);
    let url = strings::clean_url(url_part);
    if let Some(t) = title_part {
        (url, Some(strings::clean_title(t)), false)
    } else if let Some(next) = next_line {
        let t = next.text.trim();
        if is_title_literal(t) {
            (url, Some(strings::clean_title(t)), true)
        } else {
            (url, None, false)
        }
    } else {
        (url, None, false)
    }
}

fn is_title_literal(s: &str) -> bool {
    s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"'))
            || (s.starts_with('\'') && s.ends_with('\''))
            || (s.starts_with('(') && s.ends_with(')')))
}

fn split_url_and_title(s: &str) -> (&str, Option<&str>) {
    if s.starts_with('<') {
        if let Some(end) = s.find('>') {
            let url = &s[..=end];
            let rest = s[end + 1..].trim();
            return (url, if rest.is_empty() { None } else { Some(rest) });
        }
    }
    if let Some(idx) = s.find(char::is_whitespace) {
        let url = &s[..idx];
        let rest = s[idx..].trim();
        (url, if rest.is_empty() { None } else { Some(rest) })
    } else {
        (s, None)
    }
}

// ----------------------------------------------------------- paragraph

fn parse_paragraph_or_setext_or_table(
    lines: &[Line],
    start: usize,
    b: &mut Builder,
    ctx: &mut Ctx,
) -> (Option<NodeId>, usize) {
    // Table lookahead: a pipe-bearing header line immediately followed by
    // a matching alignment row (§4.3, §4.5).
    if ctx.options.extension.tables
        && start + 1 < lines.len()
        && looks_like_table_header(&lines[start].text)
    {
        if let Some(aligns) = scanners::table_alignment_row(&lines[start + 1].text) {
            if scanners::split_table_cells(strings::trim(&lines[start].text)).len() == aligns.len()
            {
                return parse_table_fragment(lines, start, aligns, b, ctx);
            }
        }
    }

    let mut end = start + 1;
    while end < lines.len() {
        let l = &lines[end];
        if is_blank_line(l) {
            break;
        }
        let indent = leading_ws_chars(&l.text).min(3);
        let trimmed = &l.text[indent..];
        if scanners::setext_underline(trimmed).is_some() {
            break;
        }
        if starts_new_block(trimmed)
            || scanners::bullet_list_marker(trimmed).is_some()
            || scanners::ordered_list_marker(trimmed).is_some()
        {
            break;
        }
        end += 1;
    }

    // Setext promotion.
    if end < lines.len() {
        let l = &lines[end];
        let indent = leading_ws_chars(&l.text).min(3);
        let trimmed = &l.text[indent..];
        if let Some(level) = scanners::setext_underline(trimmed) {
            let text_lines = &lines[start..end];
            let text = join_lines(text_lines);
            let span = span_of_lines(&lines[start..=end]);
            let para = b.alloc(NodeKind::Paragraph(ParagraphData::default()), span_of_lines(text_lines));
            let label = strings::slugify(&text);
            let key = ctx.scope_key("#", &label);
            let heading = b.alloc(
                NodeKind::Heading(HeadingData {
                    level,
                    text: para,
                    label: Some(label),
                }),
                span,
            );
            ctx.labeled_headings.entry(key).or_insert(heading);
            ctx.pending.push(PendingInline {
                target: PendingTarget::Paragraph(para),
                lines: text_lines.to_vec(),
            });
            return (Some(heading), end + 1);
        }
    }

    let text_lines = lines[start..end].to_vec();
    let span = span_of_lines(&text_lines);
    let para = b.alloc(NodeKind::Paragraph(ParagraphData::default()), span);
    ctx.pending.push(PendingInline {
        target: PendingTarget::Paragraph(para),
        lines: text_lines,
    });
    (Some(para), end)
}

fn join_lines(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
