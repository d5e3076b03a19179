//! Black-box CommonMark 0.30 core-syntax scenarios (§8 scenarios 1, 4, 6 and
//! the universal span/style invariants).

use mdtree::nodes::NodeKind;
use mdtree::options::ParseOptions;
use mdtree::parse_str;
use pretty_assertions::assert_eq;

fn doc(src: &str) -> mdtree::Document {
    parse_str(src, &ParseOptions::default())
}

#[test]
fn atx_heading_gets_a_synthesized_label() {
    let d = doc("# Heading\n");
    let root = d.children(d.root());
    assert_eq!(root.len(), 1);
    let NodeKind::Heading(h) = d.node(root[0]) else {
        panic!("expected a Heading");
    };
    assert_eq!(h.level, 1);
    assert_eq!(h.label.as_deref(), Some("heading"));
    let NodeKind::Paragraph(p) = d.node(h.text) else {
        panic!("heading text must be a Paragraph");
    };
    let NodeKind::Text(t) = d.node(p.children[0]) else {
        panic!("expected Text");
    };
    assert_eq!(t.text, "Heading");

    let key = "#HEADING//";
    assert_eq!(d.labeled_heading(key), Some(root[0]));
}

#[test]
fn bold_run_balances_open_and_close_styles() {
    let d = doc("a **b** c\n");
    let root = d.children(d.root());
    let NodeKind::Paragraph(p) = d.node(root[0]) else {
        panic!("expected Paragraph");
    };
    assert_eq!(p.children.len(), 3);
    let NodeKind::Text(a) = d.node(p.children[0]) else { panic!() };
    assert_eq!(a.text, "a ");
    let NodeKind::Text(b) = d.node(p.children[1]) else { panic!() };
    assert_eq!(b.text, "b");
    assert!(b.style.contains(mdtree::nodes::TextStyle::BOLD));
    assert_eq!(b.open_styles.len(), b.close_styles.len());
    assert_eq!(b.open_styles.len(), 1);
    let NodeKind::Text(c) = d.node(p.children[2]) else { panic!() };
    assert_eq!(c.text, " c");
    assert!(c.style.is_none());
}

#[test]
fn nested_blockquotes_with_multiple_paragraphs() {
    let d = doc("> q1\n>\n> q2\n>\n> > nested\n");
    let root = d.children(d.root());
    assert_eq!(root.len(), 1);
    let NodeKind::Blockquote(bq) = d.node(root[0]) else {
        panic!("expected Blockquote");
    };
    assert_eq!(bq.children.len(), 3);
    let NodeKind::Paragraph(p1) = d.node(bq.children[0]) else { panic!() };
    let NodeKind::Text(t1) = d.node(p1.children[0]) else { panic!() };
    assert_eq!(t1.text, "q1");
    let NodeKind::Paragraph(p2) = d.node(bq.children[1]) else { panic!() };
    let NodeKind::Text(t2) = d.node(p2.children[0]) else { panic!() };
    assert_eq!(t2.text, "q2");
    let NodeKind::Blockquote(inner) = d.node(bq.children[2]) else {
        panic!("expected nested Blockquote");
    };
    let NodeKind::Paragraph(p3) = d.node(inner.children[0]) else { panic!() };
    let NodeKind::Text(t3) = d.node(p3.children[0]) else { panic!() };
    assert_eq!(t3.text, "nested");
}

#[test]
fn fenced_code_records_syntax_and_delimiter_spans() {
    let d = doc("```cpp\nint x;\n```\n");
    let root = d.children(d.root());
    let NodeKind::Code(c) = d.node(root[0]) else {
        panic!("expected Code");
    };
    assert!(!c.inline);
    assert_eq!(c.syntax.as_deref(), Some("cpp"));
    assert_eq!(c.text, "int x;");
    let fence = c.fence.as_ref().expect("fenced code has delimiter spans");
    assert_eq!(fence.open.start.line, 0);
    assert_eq!(fence.close.unwrap().start.line, 2);
}

#[test]
fn unclosed_emphasis_degrades_to_plain_text() {
    let d = doc("*oops\n");
    let root = d.children(d.root());
    let NodeKind::Paragraph(p) = d.node(root[0]) else { panic!() };
    assert_eq!(p.children.len(), 1);
    let NodeKind::Text(t) = d.node(p.children[0]) else { panic!() };
    assert_eq!(t.text, "*oops");
}

#[test]
fn unmatched_link_bracket_is_literal() {
    let d = doc("[nope\n");
    let root = d.children(d.root());
    let NodeKind::Paragraph(p) = d.node(root[0]) else { panic!() };
    let NodeKind::Text(t) = d.node(p.children[0]) else { panic!() };
    assert_eq!(t.text, "[nope");
}

#[test]
fn inline_link_resolves_destination_and_text() {
    let d = doc("[a link](http://example.com \"title\")\n");
    let root = d.children(d.root());
    let NodeKind::Paragraph(p) = d.node(root[0]) else { panic!() };
    assert_eq!(p.children.len(), 1);
    let NodeKind::Link(l) = d.node(p.children[0]) else {
        panic!("expected Link");
    };
    assert_eq!(l.url, "http://example.com");
    assert_eq!(l.text, "a link");
}

#[test]
fn reference_link_forward_reference_resolves() {
    let d = doc("[a link][ref]\n\n[ref]: http://example.com\n");
    let root = d.children(d.root());
    let NodeKind::Paragraph(p) = d.node(root[0]) else { panic!() };
    let NodeKind::Link(l) = d.node(p.children[0]) else {
        panic!("expected Link, forward reference must resolve");
    };
    assert_eq!(l.url, "http://example.com");
}

#[test]
fn hard_break_from_trailing_double_space() {
    let d = doc("line one  \nline two\n");
    let root = d.children(d.root());
    let NodeKind::Paragraph(p) = d.node(root[0]) else { panic!() };
    assert!(p
        .children
        .iter()
        .any(|id| matches!(d.node(*id), NodeKind::LineBreak)));
}

#[test]
fn document_span_covers_every_top_level_child() {
    let d = doc("# Title\n\nSome *text* here.\n");
    let doc_span = d.span(d.root());
    for child in d.children(d.root()) {
        let child_span = d.span(*child);
        assert!(doc_span.start.line <= child_span.start.line);
        assert!(doc_span.end.line >= child_span.end.line);
    }
}

// Two runs of length 3, each flanked so it can both open and close (the
// word-internal `a***b***c` shape), hit the rule of three: the sum of the
// run lengths is a multiple of 3 and one side is ambiguous, so no pairing
// is allowed and every `*` stays literal.
#[test]
fn rule_of_three_blocks_two_ambiguous_length_three_runs() {
    let d = doc("a***b***c\n");
    let root = d.children(d.root());
    let NodeKind::Paragraph(p) = d.node(root[0]) else { panic!() };
    assert_eq!(p.children.len(), 1);
    let NodeKind::Text(t) = d.node(p.children[0]) else { panic!() };
    assert_eq!(t.text, "a***b***c");
    assert!(t.style.is_none());
}

// Unicode punctuation (curly quotes) must flank `_` the same way ASCII
// punctuation does: an underscore between a word character and a quote is
// a valid opener/closer pair, not an intraword underscore.
#[test]
fn unicode_punctuation_flanks_underscore_emphasis() {
    let d = doc("\u{201C}_bar_\u{201D}\n");
    let root = d.children(d.root());
    let NodeKind::Paragraph(p) = d.node(root[0]) else { panic!() };
    assert_eq!(p.children.len(), 3);
    let NodeKind::Text(open_quote) = d.node(p.children[0]) else { panic!() };
    assert_eq!(open_quote.text, "\u{201C}");
    assert!(open_quote.style.is_none());
    let NodeKind::Text(bar) = d.node(p.children[1]) else { panic!() };
    assert_eq!(bar.text, "bar");
    assert!(bar.style.contains(mdtree::nodes::TextStyle::ITALIC));
    let NodeKind::Text(close_quote) = d.node(p.children[2]) else { panic!() };
    assert_eq!(close_quote.text, "\u{201D}");
    assert!(close_quote.style.is_none());
}
