//! Source positions and spans (§3).
//!
//! Positions are 0-based line/column pairs into the logical lines produced
//! by the line reader (§4.1); spans are inclusive at both ends.

/// A single point in the source: a 0-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub fn new(line: u32, col: u32) -> Pos {
        Pos { line, col }
    }
}

/// An inclusive source range. `start <= end` always holds for a well-formed
/// span; zero-width spans (`start == end`) are legal for synthesized nodes
/// such as a missing reference definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub fn new(start: Pos, end: Pos) -> Span {
        Span { start, end }
    }

    pub fn point(p: Pos) -> Span {
        Span { start: p, end: p }
    }

    /// A span covering a single line, from `start_col` to `end_col` inclusive.
    pub fn on_line(line: u32, start_col: u32, end_col: u32) -> Span {
        Span::new(Pos::new(line, start_col), Pos::new(line, end_col))
    }

    /// Whether `other` lies entirely within `self`.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The smallest span covering both `self` and `other`.
    pub fn union(&self, other: &Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}
