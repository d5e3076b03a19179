//! Black-box multi-file driver scenarios (§4.9, §4.12).
//!
//! Each test writes a small set of `.md` files into a scratch directory
//! under the system temp path (unique per test, cleaned up on drop) and
//! parses the entry file with `recursive: true`.

use mdtree::nodes::NodeKind;
use mdtree::options::ParseOptions;
use mdtree::parse_file;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;

struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new(name: &str) -> ScratchDir {
        let dir = std::env::temp_dir().join(format!("mdtree-multifile-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create scratch dir");
        ScratchDir(dir)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.0.join(name);
        fs::write(&path, contents).expect("write scratch file");
        path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn recursive_opts() -> ParseOptions {
    let mut opts = ParseOptions::default();
    opts.recursive = true;
    opts
}

#[test]
fn local_md_link_inlines_target_with_page_break_and_anchor() {
    let scratch = ScratchDir::new("basic");
    scratch.write("b.md", "# Second\n\nHello from b.\n");
    let entry = scratch.write("a.md", "# First\n\nSee [b](b.md) for more.\n");

    let mut opts = recursive_opts();
    let d = parse_file(&entry, &mut opts).expect("parse_file should succeed");
    let root = d.children(d.root());

    // First file's own blocks: Heading, Paragraph.
    assert!(matches!(d.node(root[0]), NodeKind::Heading(_)));
    assert!(matches!(d.node(root[1]), NodeKind::Paragraph(_)));

    let page_break_idx = root
        .iter()
        .position(|id| matches!(d.node(*id), NodeKind::PageBreak))
        .expect("expected a PageBreak node");
    let NodeKind::Anchor(anchor) = d.node(root[page_break_idx + 1]) else {
        panic!("expected an Anchor node immediately after the PageBreak");
    };
    assert!(anchor.label.ends_with("b.md"));

    // Second file's blocks follow the anchor.
    let NodeKind::Heading(h) = d.node(root[page_break_idx + 2]) else {
        panic!("expected the target file's Heading to follow its Anchor");
    };
    let NodeKind::Paragraph(text) = d.node(h.text) else { panic!() };
    let NodeKind::Text(t) = d.node(text.children[0]) else { panic!() };
    assert_eq!(t.text, "Second");
}

#[test]
fn cyclic_local_links_are_visited_once() {
    let scratch = ScratchDir::new("cycle");
    scratch.write("a.md", "[back to b](b.md)\n");
    let entry = scratch.write("b.md", "[to a](a.md)\n");

    let mut opts = recursive_opts();
    let d = parse_file(&entry, &mut opts).expect("parse_file should succeed");
    let root = d.children(d.root());

    let page_breaks = root
        .iter()
        .filter(|id| matches!(d.node(**id), NodeKind::PageBreak))
        .count();
    // b -> a -> (b already visited, stop): exactly one PageBreak/Anchor pair.
    assert_eq!(page_breaks, 1);
}

#[test]
fn unreachable_local_target_is_silently_skipped() {
    let scratch = ScratchDir::new("missing");
    let entry = scratch.write("a.md", "[gone](missing.md)\n");

    let mut opts = recursive_opts();
    let d = parse_file(&entry, &mut opts).expect("parse_file should succeed");
    let root = d.children(d.root());
    assert!(root
        .iter()
        .all(|id| !matches!(d.node(*id), NodeKind::PageBreak)));
}

#[test]
fn non_recursive_mode_leaves_local_links_unexpanded() {
    let scratch = ScratchDir::new("disabled");
    scratch.write("b.md", "# Second\n");
    let entry = scratch.write("a.md", "See [b](b.md).\n");

    let mut opts = ParseOptions::default();
    let d = parse_file(&entry, &mut opts).expect("parse_file should succeed");
    let root = d.children(d.root());
    assert_eq!(root.len(), 1);
    assert!(matches!(d.node(root[0]), NodeKind::Paragraph(_)));

    let NodeKind::Paragraph(p) = d.node(root[0]) else { panic!() };
    assert!(p
        .children
        .iter()
        .any(|id| matches!(d.node(*id), NodeKind::Link(_))));
}

#[test]
fn heading_labels_are_scoped_per_file_and_never_collide() {
    let scratch = ScratchDir::new("labels");
    scratch.write("b.md", "# Intro\n");
    let entry = scratch.write("a.md", "# Intro\n\n[next](b.md)\n");

    let mut opts = recursive_opts();
    let d = parse_file(&entry, &mut opts).expect("parse_file should succeed");

    let mut keys: Vec<&str> = d.labeled_headings().map(|(k, _)| k).collect();
    keys.sort();
    assert_eq!(keys.len(), 2, "both files' #intro headings must get distinct scoped keys");
    assert_ne!(keys[0], keys[1]);
    assert!(keys.iter().all(|k| k.contains("INTRO")));
    assert!(keys.iter().any(|k| k.ends_with("/a.md")));
    assert!(keys.iter().any(|k| k.ends_with("/b.md")));
}
