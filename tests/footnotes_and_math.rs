//! Black-box Pandoc-footnote and TeX-math scenarios (§8 scenario 5, plus
//! the §4.4/§4.3 math and footnote expansions).

use mdtree::nodes::NodeKind;
use mdtree::options::ParseOptions;
use mdtree::parse_str;
use pretty_assertions::assert_eq;

fn doc(src: &str) -> mdtree::Document {
    parse_str(src, &ParseOptions::default())
}

#[test]
fn footnote_forward_reference_resolves() {
    let d = doc("[^1]: body\n\ntext[^1]\n");
    let root = d.children(d.root());
    let NodeKind::Paragraph(p) = d.node(root[0]) else {
        panic!("expected Paragraph");
    };
    assert_eq!(p.children.len(), 2);
    let NodeKind::Text(t) = d.node(p.children[0]) else { panic!() };
    assert_eq!(t.text, "text");
    let NodeKind::FootnoteRef(r) = d.node(p.children[1]) else {
        panic!("expected FootnoteRef");
    };

    let footnote_id = d.footnote(&r.id).expect("footnote must be registered");
    let NodeKind::Footnote(f) = d.node(footnote_id) else {
        panic!("expected Footnote");
    };
    let NodeKind::Paragraph(body) = d.node(f.children[0]) else { panic!() };
    let NodeKind::Text(body_text) = d.node(body.children[0]) else { panic!() };
    assert_eq!(body_text.text, "body");
}

#[test]
fn empty_footnote_is_discarded() {
    let d = doc("[^1]:\n\ntext[^1]\n");
    assert_eq!(d.footnotes().count(), 0);
}

#[test]
fn unresolved_footnote_ref_still_resolves_when_defined_later_in_fragment() {
    let d = doc("text[^missing]\n\n[^missing]: later\n");
    let root = d.children(d.root());
    let NodeKind::Paragraph(p) = d.node(root[0]) else { panic!() };
    assert!(p
        .children
        .iter()
        .any(|id| matches!(d.node(*id), NodeKind::FootnoteRef(_))));
}

#[test]
fn inline_math_span() {
    let d = doc("energy is $E = mc^2$ today\n");
    let root = d.children(d.root());
    let NodeKind::Paragraph(p) = d.node(root[0]) else { panic!() };
    let math = p
        .children
        .iter()
        .find_map(|id| match d.node(*id) {
            NodeKind::Math(m) => Some(m),
            _ => None,
        })
        .expect("expected an inline Math node");
    assert!(math.inline);
    assert_eq!(math.expr, "E = mc^2");
}

#[test]
fn display_math_span() {
    // A `$$...$$` run spanning several joined lines is taken verbatim
    // (§4.4 item 3): the single spaces introduced by joining source lines
    // are part of the expression, not trimmed the way code-span flanking
    // spaces are.
    let d = doc("before\n\n$$\nE = mc^2\n$$\n\nafter\n");
    let root = d.children(d.root());
    let display = root
        .iter()
        .find_map(|id| match d.node(*id) {
            NodeKind::Math(m) if !m.inline => Some(m),
            _ => None,
        })
        .expect("expected a display Math node");
    assert_eq!(display.expr, " E = mc^2 ");
}

#[test]
fn math_fenced_code_block_becomes_display_math() {
    let d = doc("```math\nE = mc^2\n```\n");
    let root = d.children(d.root());
    let NodeKind::Math(m) = d.node(root[0]) else {
        panic!("a ```math fence must become a display Math node, not Code");
    };
    assert!(!m.inline);
    assert_eq!(m.expr, "E = mc^2");
}

#[test]
fn math_disabled_leaves_dollar_signs_literal() {
    let mut opts = ParseOptions::default();
    opts.extension.math = false;
    let d = parse_str("cost is $5 not $10\n", &opts);
    let root = d.children(d.root());
    let NodeKind::Paragraph(p) = d.node(root[0]) else { panic!() };
    assert!(p
        .children
        .iter()
        .all(|id| matches!(d.node(*id), NodeKind::Text(_))));
}
