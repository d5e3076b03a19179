//! Black-box GitHub-Flavored extension scenarios (§8 scenario 3, plus
//! strikethrough/tasklist/extended-autolink coverage for §4.4's expansion).

use mdtree::nodes::{Alignment, NodeKind, TextStyle};
use mdtree::options::ParseOptions;
use mdtree::parse_str;
use pretty_assertions::assert_eq;

fn doc(src: &str) -> mdtree::Document {
    parse_str(src, &ParseOptions::default())
}

#[test]
fn three_by_two_table_with_left_alignment() {
    let d = doc("| A | B |\n|---|---|\n| 1 | 2 |\n");
    let root = d.children(d.root());
    assert_eq!(root.len(), 1);
    let NodeKind::Table(t) = d.node(root[0]) else {
        panic!("expected Table");
    };
    assert_eq!(t.alignments, vec![Alignment::Left, Alignment::Left]);
    assert_eq!(t.rows.len(), 2);

    let NodeKind::TableRow(header) = d.node(t.rows[0]) else { panic!() };
    assert_eq!(header.cells.len(), 2);
    let NodeKind::TableCell(a) = d.node(header.cells[0]) else { panic!() };
    let NodeKind::Text(a_text) = d.node(a.children[0]) else { panic!() };
    assert_eq!(a_text.text, "A");

    let NodeKind::TableRow(body) = d.node(t.rows[1]) else { panic!() };
    let NodeKind::TableCell(one) = d.node(body.cells[0]) else { panic!() };
    let NodeKind::Text(one_text) = d.node(one.children[0]) else { panic!() };
    assert_eq!(one_text.text, "1");
}

#[test]
fn table_rows_are_padded_and_truncated_to_column_count() {
    let d = doc("| A | B |\n|---|---|\n| 1 |\n| 2 | 3 | 4 |\n");
    let root = d.children(d.root());
    let NodeKind::Table(t) = d.node(root[0]) else { panic!() };
    assert_eq!(t.rows.len(), 3);
    let NodeKind::TableRow(short) = d.node(t.rows[1]) else { panic!() };
    assert_eq!(short.cells.len(), 2);
    let NodeKind::TableCell(missing) = d.node(short.cells[1]) else { panic!() };
    assert!(missing.children.is_empty());
    let NodeKind::TableRow(long) = d.node(t.rows[2]) else { panic!() };
    assert_eq!(long.cells.len(), 2);
}

#[test]
fn strikethrough_sets_style_flag() {
    let d = doc("a ~~b~~ c\n");
    let root = d.children(d.root());
    let NodeKind::Paragraph(p) = d.node(root[0]) else { panic!() };
    let NodeKind::Text(b) = d.node(p.children[1]) else { panic!() };
    assert_eq!(b.text, "b");
    assert!(b.style.contains(TextStyle::STRIKETHROUGH));
}

#[test]
fn task_list_item_records_checked_flag() {
    let d = doc("- [x] done\n- [ ] pending\n");
    let root = d.children(d.root());
    let NodeKind::List(l) = d.node(root[0]) else {
        panic!("expected List");
    };
    assert_eq!(l.items.len(), 2);
    let NodeKind::ListItem(done) = d.node(l.items[0]) else { panic!() };
    assert!(done.task_list);
    assert!(done.checked);
    let NodeKind::ListItem(pending) = d.node(l.items[1]) else { panic!() };
    assert!(pending.task_list);
    assert!(!pending.checked);
}

#[test]
fn gfm_extended_www_autolink() {
    let d = doc("see www.example.com for more\n");
    let root = d.children(d.root());
    let NodeKind::Paragraph(p) = d.node(root[0]) else { panic!() };
    let link = p
        .children
        .iter()
        .find_map(|id| match d.node(*id) {
            NodeKind::Link(l) => Some(l),
            _ => None,
        })
        .expect("expected an extended autolink Link node");
    assert_eq!(link.url, "http://www.example.com");
}

#[test]
fn gfm_bare_email_autolink() {
    let d = doc("reach me at a.b@example.com today\n");
    let root = d.children(d.root());
    let NodeKind::Paragraph(p) = d.node(root[0]) else { panic!() };
    let link = p
        .children
        .iter()
        .find_map(|id| match d.node(*id) {
            NodeKind::Link(l) => Some(l),
            _ => None,
        })
        .expect("expected a bare-email autolink Link node");
    assert_eq!(link.url, "mailto:a.b@example.com");
}

#[test]
fn extensions_can_be_disabled_and_fall_through_to_plain_text() {
    let mut opts = ParseOptions::default();
    opts.extension.strikethrough = false;
    let d = parse_str("a ~~b~~ c\n", &opts);
    let root = d.children(d.root());
    let NodeKind::Paragraph(p) = d.node(root[0]) else { panic!() };
    let joined: String = p
        .children
        .iter()
        .map(|id| match d.node(*id) {
            NodeKind::Text(t) => t.text.clone(),
            _ => String::new(),
        })
        .collect();
    assert!(joined.contains("~~b~~"));
}
