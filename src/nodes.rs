//! The AST (§3): a closed, tagged sum of node kinds, realized as a flat,
//! self-owned arena addressed by [`NodeId`] rather than the teacher's
//! borrowed, lifetime-parameterized `typed_arena` tree. `Document` owns
//! every [`NodeRecord`] and is immutable once returned from the parser; the
//! mutable half lives in `parser::Builder` (see §9, "friend-class access").

use crate::span::Span;
use rustc_hash::FxHashMap;

/// An opaque reference to a node owned by some [`Document`]. `NodeId`s from
/// one document are meaningless against another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

/// Composable text-style flags (§3's Text/Link "style flags"), mirroring
/// the original's `Q_DECLARE_FLAGS(TextOptions, TextOption)` bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct TextStyle(u8);

impl TextStyle {
    pub const NONE: TextStyle = TextStyle(0);
    pub const BOLD: TextStyle = TextStyle(1);
    pub const ITALIC: TextStyle = TextStyle(2);
    pub const STRIKETHROUGH: TextStyle = TextStyle(4);

    pub fn contains(self, other: TextStyle) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: TextStyle) {
        self.0 |= other.0;
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for TextStyle {
    type Output = TextStyle;
    fn bitor(self, rhs: TextStyle) -> TextStyle {
        TextStyle(self.0 | rhs.0)
    }
}

/// A single style-delimiter position: which style it opens/closes, and
/// where in the source it sits.
#[derive(Debug, Clone, Copy)]
pub struct StyleDelim {
    pub style: TextStyle,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListType {
    Ordered,
    Unordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderedDelim {
    Dot,
    Paren,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderedPreState {
    Start,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
    Center,
}

/// Metadata for an ordered list item; `None` on an unordered item.
#[derive(Debug, Clone, Copy)]
pub struct OrderedMeta {
    pub start: u32,
    pub delim: OrderedDelim,
    pub pre_state: OrderedPreState,
}

#[derive(Debug, Clone)]
pub struct DocumentData {
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct AnchorData {
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct HeadingData {
    pub level: u8,
    /// The heading's inline content, always a `Paragraph` node.
    pub text: NodeId,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ParagraphData {
    pub children: Vec<NodeId>,
    /// Set when a free-standing raw-HTML block was adopted mid-paragraph
    /// during inline parsing (§9's "dirty" paragraph flag).
    pub dirty: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BlockquoteData {
    pub children: Vec<NodeId>,
    /// The column of each stripped `>` marker, one per source line.
    pub marker_positions: Vec<Span>,
}

#[derive(Debug, Clone, Default)]
pub struct ListData {
    pub items: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct ListItemData {
    pub list_type: ListType,
    pub ordered: Option<OrderedMeta>,
    pub task_list: bool,
    pub checked: bool,
    pub marker_span: Span,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct FenceDelims {
    pub open: Span,
    pub close: Option<Span>,
    pub syntax: Option<Span>,
}

#[derive(Debug, Clone)]
pub struct CodeData {
    pub text: String,
    pub inline: bool,
    pub syntax: Option<String>,
    pub fence: Option<FenceDelims>,
}

#[derive(Debug, Clone, Default)]
pub struct TextData {
    pub text: String,
    pub style: TextStyle,
    pub space_before: bool,
    pub space_after: bool,
    pub open_styles: Vec<StyleDelim>,
    pub close_styles: Vec<StyleDelim>,
}

#[derive(Debug, Clone)]
pub struct MathData {
    pub expr: String,
    pub inline: bool,
    pub start_delim: Span,
    pub end_delim: Span,
    pub syntax: Option<Span>,
}

#[derive(Debug, Clone, Default)]
pub struct LinkData {
    pub url: String,
    pub text: String,
    pub style: TextStyle,
    pub text_pos: Span,
    pub url_pos: Span,
    pub image: Option<NodeId>,
    /// The rendered inline children of the link text, when not a bare
    /// autolink (always a `Paragraph` node).
    pub paragraph: Option<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct ImageData {
    pub url: String,
    pub alt: String,
    pub paragraph: Option<NodeId>,
    pub text_pos: Span,
    pub url_pos: Span,
}

#[derive(Debug, Clone)]
pub struct FootnoteRefData {
    pub id: String,
}

#[derive(Debug, Clone, Default)]
pub struct FootnoteData {
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct TableData {
    pub alignments: Vec<Alignment>,
    pub rows: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct TableRowData {
    pub cells: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct TableCellData {
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct RawHtmlData {
    pub text: String,
    pub free_tag: bool,
}

/// The closed sum of node kinds (§3).
#[derive(Debug, Clone)]
pub enum NodeKind {
    Document(DocumentData),
    Anchor(AnchorData),
    PageBreak,
    HorizontalLine,
    Heading(HeadingData),
    Paragraph(ParagraphData),
    Blockquote(BlockquoteData),
    List(ListData),
    ListItem(ListItemData),
    Code(CodeData),
    Text(TextData),
    Math(MathData),
    LineBreak,
    Link(LinkData),
    Image(ImageData),
    FootnoteRef(FootnoteRefData),
    Footnote(FootnoteData),
    Table(TableData),
    TableRow(TableRowData),
    TableCell(TableCellData),
    RawHtml(RawHtmlData),
}

impl NodeKind {
    /// The node's own children, if it carries an ordered child list.
    /// Nodes that reference other nodes through single optional fields
    /// (`Heading.text`, `Link.paragraph`, `Image.paragraph`) are not
    /// included here; callers that need to walk the *entire* tree should
    /// special-case those.
    pub fn children(&self) -> &[NodeId] {
        match self {
            NodeKind::Document(d) => &d.children,
            NodeKind::Paragraph(p) => &p.children,
            NodeKind::Blockquote(b) => &b.children,
            NodeKind::List(l) => &l.items,
            NodeKind::ListItem(i) => &i.children,
            NodeKind::Footnote(f) => &f.children,
            NodeKind::TableCell(c) => &c.children,
            _ => &[],
        }
    }

    pub fn is_block(&self) -> bool {
        !matches!(
            self,
            NodeKind::Text(_)
                | NodeKind::LineBreak
                | NodeKind::Link(_)
                | NodeKind::Image(_)
                | NodeKind::FootnoteRef(_)
                | NodeKind::Code(CodeData { inline: true, .. })
                | NodeKind::Math(MathData { inline: true, .. })
                | NodeKind::RawHtml(RawHtmlData { free_tag: false, .. })
        )
    }
}

#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub kind: NodeKind,
    pub span: Span,
}

/// The parsed document (§3, §5): a self-owned, immutable tree plus the
/// cross-reference lookup tables. `Document` never borrows from its
/// caller and may be dropped to release everything it owns at once.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) nodes: Vec<NodeRecord>,
    pub(crate) root: NodeId,
    pub(crate) labeled_links: FxHashMap<String, NodeId>,
    pub(crate) labeled_headings: FxHashMap<String, NodeId>,
    pub(crate) footnotes: FxHashMap<String, NodeId>,
    /// Verbatim front-matter block, if the source opened with one (§4.1
    /// expansion). Never interpreted as Markdown.
    pub front_matter: Option<String>,
}

impl Document {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0 as usize].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.0 as usize].span
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    pub fn labeled_link(&self, key: &str) -> Option<NodeId> {
        self.labeled_links.get(key).copied()
    }

    pub fn labeled_heading(&self, key: &str) -> Option<NodeId> {
        self.labeled_headings.get(key).copied()
    }

    pub fn footnote(&self, key: &str) -> Option<NodeId> {
        self.footnotes.get(key).copied()
    }

    pub fn labeled_links(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.labeled_links.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn labeled_headings(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.labeled_headings.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn footnotes(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.footnotes.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
