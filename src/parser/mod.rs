//! The parser (§2, §4.2–§4.3, §4.9): block splitting, block parsing, and
//! the multi-file driver. Inline parsing lives in [`inlines`]; raw-HTML
//! rule dispatch in [`html`]; table rows in [`table`]; GFM autolinks in
//! [`autolink`].
//!
//! The "privileged friend"/"mutable intermediate state" design notes (§9)
//! are realized here as [`Builder`]: a parser-private arena builder that
//! the public [`crate::Document`] is frozen from via [`Builder::finalize`].

pub mod autolink;
pub mod block;
pub mod html;
pub mod inlines;
pub mod table;

use crate::error::{Error, Result};
use crate::line_reader::{read_lines, RawLine};
use crate::multifile;
use crate::nodes::{Document, DocumentData, NodeId, NodeKind, NodeRecord};
use crate::options::ParseOptions;
use crate::span::{Pos, Span};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// One already-unwrapped source line: `text` has had any enclosing
/// container prefixes (blockquote `>`, list-item indent) stripped;
/// `origin_col` records how many source columns that stripping consumed,
/// so node spans can be reconstructed in original-document coordinates.
#[derive(Debug, Clone)]
pub struct Line {
    pub text: String,
    pub number: u32,
    pub origin_col: u32,
}

impl Line {
    fn from_raw(raw: &RawLine) -> Line {
        Line {
            text: raw.text.clone(),
            number: raw.number,
            origin_col: 0,
        }
    }

    pub fn end_col(&self) -> u32 {
        self.origin_col + self.text.chars().count() as u32
    }

    pub fn start_pos(&self) -> Pos {
        Pos::new(self.number, self.origin_col)
    }

    pub fn end_pos(&self) -> Pos {
        Pos::new(self.number, self.end_col().saturating_sub(1).max(self.origin_col))
    }
}

/// What a leaf block's raw text ultimately needs: inline parsing, deferred
/// until every reference/footnote definition in the fragment has been
/// seen (§2's two-phase block/inline split).
pub(crate) enum PendingTarget {
    Paragraph(NodeId),
    TableCell(NodeId),
}

pub(crate) struct PendingInline {
    pub target: PendingTarget,
    pub lines: Vec<Line>,
}

/// The parser-private arena builder (§9 "friend-class access"). Holds the
/// flat node vector under construction; [`Builder::finalize`] is the one
/// place mutation ends and an immutable [`Document`] is produced.
pub(crate) struct Builder {
    pub nodes: Vec<NodeRecord>,
}

impl Builder {
    fn new() -> Builder {
        Builder { nodes: Vec::new() }
    }

    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord { kind, span });
        id
    }

    pub fn get(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0 as usize].kind
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0 as usize].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.0 as usize].span
    }

    pub fn set_span(&mut self, id: NodeId, span: Span) {
        self.nodes[id.0 as usize].span = span;
    }
}

/// Per-file parsing context threaded through the block and inline parsers:
/// the label scope (§6), the lookup tables being populated, and the
/// pending-inline queue that bridges the two passes.
pub(crate) struct Ctx<'o> {
    pub options: &'o ParseOptions,
    pub working_path: PathBuf,
    pub file_name: String,
    pub labeled_links: FxHashMap<String, NodeId>,
    pub labeled_headings: FxHashMap<String, NodeId>,
    pub footnotes: FxHashMap<String, NodeId>,
    pub pending: Vec<PendingInline>,
    pub links_to_parse: Vec<String>,
    /// Raw `[label]: url "title"` definitions (§4.3), keyed by
    /// [`Ctx::scope_key`]. Consulted by `inlines` when resolving
    /// reference-style links and images; not nodes in their own right.
    pub ref_defs: FxHashMap<String, (String, Option<String>)>,
}

impl<'o> Ctx<'o> {
    /// The `#SIMPLIFIED/workingPath/fileName` scoping key (§6): trim,
    /// collapse whitespace, case-fold, then uppercase, per the literal
    /// `simplified(label).case_folded().upper()` formula.
    pub fn scope_key(&self, prefix: &str, label: &str) -> String {
        let normalized = crate::strings::normalize_label(label).to_uppercase();
        format!(
            "{}{}/{}/{}",
            prefix,
            normalized,
            self.working_path.display(),
            self.file_name
        )
    }
}

/// Parses an in-memory document. Cannot fail: malformed Markdown always
/// produces a `Document` (§7).
pub fn parse_str(input: &str, options: &ParseOptions) -> Document {
    let mut builder = Builder::new();
    let root = builder.alloc(
        NodeKind::Document(DocumentData { children: vec![] }),
        Span::default(),
    );

    let (front_matter, body) = split_front_matter(input);

    let mut ctx = Ctx {
        options,
        working_path: options.working_path.clone(),
        file_name: options.file_name.clone(),
        labeled_links: FxHashMap::default(),
        labeled_headings: FxHashMap::default(),
        footnotes: FxHashMap::default(),
        pending: Vec::new(),
        links_to_parse: Vec::new(),
        ref_defs: FxHashMap::default(),
    };

    let children = parse_one_source(body, &mut builder, &mut ctx);
    inlines::resolve_pending(&mut builder, &mut ctx);

    let mut all_children = children;
    if options.recursive {
        run_multifile_driver(&mut builder, &mut ctx, &mut all_children, options);
    }

    let doc_span = all_children
        .iter()
        .map(|&id| builder.span(id))
        .fold(None, |acc: Option<Span>, s| Some(acc.map_or(s, |a| a.union(&s))));
    if let Some(span) = doc_span {
        builder.set_span(root, span);
    }
    if let NodeKind::Document(d) = builder.get_mut(root) {
        d.children = all_children;
    }
    finalize(builder, root, ctx, front_matter.map(|s| s.to_string()))
}

/// Parses a file from disk, following local Markdown links if
/// `options.recursive` is set (§4.9). The only fatal error is failing to
/// read the entry file itself; unreachable linked files are silently
/// skipped (§7), logged at `warn` (§4.11).
pub fn parse_file(path: &Path, options: &mut ParseOptions) -> Result<Document> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if options.working_path.as_os_str().is_empty() {
        options.working_path = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(PathBuf::new);
    }
    if options.file_name.is_empty() {
        options.file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    Ok(parse_str(&text, options))
}

/// Parses a document from any [`std::io::Read`] (§4.11). The stream is read
/// to completion and decoded as UTF-8 before parsing; an I/O failure (not a
/// decoding failure, which never happens for valid UTF-8 streams) is the
/// only way this can fail.
pub fn parse_reader<R: std::io::Read>(mut reader: R, options: &ParseOptions) -> Result<Document> {
    let mut text = String::new();
    reader.read_to_string(&mut text).map_err(|source| Error::Io {
        path: PathBuf::from("<reader>"),
        source,
    })?;
    Ok(parse_str(&text, options))
}

fn parse_one_source(body: &str, builder: &mut Builder, ctx: &mut Ctx) -> Vec<NodeId> {
    let raw = read_lines(body);
    let lines: Vec<Line> = raw.iter().map(Line::from_raw).collect();
    block::parse_blocks(&lines, builder, ctx)
}

fn run_multifile_driver(
    builder: &mut Builder,
    ctx: &mut Ctx,
    children: &mut Vec<NodeId>,
    options: &ParseOptions,
) {
    let mut visited: std::collections::HashSet<PathBuf> = std::collections::HashSet::new();
    if let Ok(abs) = std::fs::canonicalize(ctx.working_path.join(&ctx.file_name)) {
        visited.insert(abs);
    }

    let mut queue: VecDeque<String> = ctx.links_to_parse.drain(..).collect();

    while let Some(url) = queue.pop_front() {
        if !multifile::is_local_markdown_link(&url, &options.extensions) {
            continue;
        }
        let target = multifile::resolve_relative(&ctx.working_path, &url);
        let canon = std::fs::canonicalize(&target).unwrap_or_else(|_| target.clone());
        if visited.contains(&canon) {
            continue;
        }
        visited.insert(canon.clone());

        let text = match std::fs::read_to_string(&target) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("multi-file: could not open {}: {}", target.display(), e);
                continue;
            }
        };
        log::debug!("multi-file: entering {}", target.display());

        let label = target.to_string_lossy().into_owned();
        let page_break = builder.alloc(NodeKind::PageBreak, Span::default());
        let anchor = builder.alloc(
            NodeKind::Anchor(crate::nodes::AnchorData { label: label.clone() }),
            Span::default(),
        );
        children.push(page_break);
        children.push(anchor);

        let sub_working_path = target
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(PathBuf::new);
        let sub_file_name = target
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut sub_ctx = Ctx {
            options: ctx.options,
            working_path: sub_working_path,
            file_name: sub_file_name,
            labeled_links: FxHashMap::default(),
            labeled_headings: FxHashMap::default(),
            footnotes: FxHashMap::default(),
            pending: Vec::new(),
            links_to_parse: Vec::new(),
            ref_defs: FxHashMap::default(),
        };

        let sub_children = parse_one_source(&text, builder, &mut sub_ctx);
        inlines::resolve_pending(builder, &mut sub_ctx);
        children.extend(sub_children);

        ctx.labeled_links.extend(sub_ctx.labeled_links);
        ctx.labeled_headings.extend(sub_ctx.labeled_headings);
        ctx.footnotes.extend(sub_ctx.footnotes);
        for link in sub_ctx.links_to_parse {
            queue.push_back(link);
        }
    }
}

fn finalize(builder: Builder, root: NodeId, ctx: Ctx, front_matter: Option<String>) -> Document {
    Document {
        nodes: builder.nodes,
        root,
        labeled_links: ctx.labeled_links,
        labeled_headings: ctx.labeled_headings,
        footnotes: ctx.footnotes,
        front_matter,
    }
}

/// Splits a leading `---`/`+++` front-matter block off the document body
/// (§4.1 expansion). Never interpreted as Markdown.
fn split_front_matter(input: &str) -> (Option<&str>, &str) {
    let fence = if input.starts_with("---\n") || input == "---" {
        "---"
    } else if input.starts_with("+++\n") || input == "+++" {
        "+++"
    } else {
        return (None, input);
    };
    let after_open = &input[fence.len()..];
    let after_open = after_open.strip_prefix('\n').unwrap_or(after_open);
    let marker = format!("\n{}", fence);
    if let Some(rel_end) = after_open.find(&marker) {
        let body_start = rel_end + marker.len();
        let rest = &after_open[body_start..];
        let rest = rest.strip_prefix('\n').unwrap_or(rest);
        (Some(&after_open[..rel_end]), rest)
    } else {
        (None, input)
    }
}
