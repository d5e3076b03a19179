//! GFM tables (§4.3, §4.5): header/alignment/body row construction. Cell
//! inline content is deferred to `inlines` the same way paragraph text is.

use super::{Builder, Ctx, Line, PendingInline, PendingTarget};
use crate::nodes::*;
use crate::scanners;
use crate::span::Span;
use crate::strings;

/// A line plausibly opens a table header iff it contains an unescaped `|`.
pub fn looks_like_table_header(text: &str) -> bool {
    scanners::split_table_cells(strings::trim(text)).len() > 1
}

/// Parses a table starting at `lines[start]` (the header row), given the
/// already-validated alignment row at `lines[start + 1]`. Consumes body
/// rows while they keep the pipe-cell shape; a short or long row is padded
/// or truncated to the column count (GFM table extension behavior).
pub fn parse_table_fragment(
    lines: &[Line],
    start: usize,
    alignments: Vec<Alignment>,
    b: &mut Builder,
    ctx: &mut Ctx,
) -> (Option<NodeId>, usize) {
    let ncols = alignments.len();
    let header_row = make_row(&lines[start], ncols, b, ctx);

    let mut rows = vec![header_row];
    let mut end = start + 2;
    while end < lines.len() {
        let l = &lines[end];
        if strings::is_blank(&l.text) {
            break;
        }
        if !looks_like_table_header(&l.text) {
            break;
        }
        rows.push(make_row(l, ncols, b, ctx));
        end += 1;
    }

    let span = super::block::span_of_lines(&lines[start..end]);
    let node = b.alloc(
        NodeKind::Table(TableData {
            alignments,
            rows,
        }),
        span,
    );
    (Some(node), end)
}

fn make_row(line: &Line, ncols: usize, b: &mut Builder, ctx: &mut Ctx) -> NodeId {
    let trimmed_text = strings::trim(&line.text);
    let inner = trimmed_text
        .strip_prefix('|')
        .unwrap_or(trimmed_text);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    let raw_cells = scanners::split_table_cells(inner);

    let mut cells = Vec::with_capacity(ncols);
    for i in 0..ncols {
        let text = raw_cells.get(i).copied().unwrap_or("");
        let span = Span::on_line(
            line.number,
            line.origin_col,
            line.end_col().saturating_sub(1),
        );
        let cell = b.alloc(NodeKind::TableCell(TableCellData::default()), span);
        ctx.pending.push(PendingInline {
            target: PendingTarget::TableCell(cell),
            lines: vec![Line {
                text: strings::trim(text).to_string(),
                number: line.number,
                origin_col: line.origin_col,
            }],
        });
        cells.push(cell);
    }

    b.alloc(
        NodeKind::TableRow(TableRowData { cells }),
        Span::on_line(line.number, line.origin_col, line.end_col().saturating_sub(1)),
    )
}
