//! Byte-offset spans and derived line/column positions.
//!
//! Byte offsets into the UTF-8 source buffer are the canonical coordinate
//! system for every edit and every query result. Line/column values are
//! derived for display and diagnostics from a line-start index built once
//! per parse.

use line_index::{LineIndex, TextSize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open byte range `[start, end)` into a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span anchored at `at`. Pure insertions consume no bytes.
    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn of_node(node: tree_sitter::Node<'_>) -> Self {
        Self {
            start: node.start_byte(),
            end: node.end_byte(),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Strict half-open overlap: `a.start < b.end && b.start < a.end`.
    ///
    /// A zero-width span sharing an exact boundary byte with another span
    /// does not overlap it; a zero-width span strictly inside one does.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when `other` lies entirely within this span (inclusive bounds).
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A resolved source position. `byte_offset` is ground truth; `line` and
/// `column` are zero-based and display-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub byte_offset: usize,
}

/// A span resolved to start/end positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceRange {
    pub start: Position,
    pub end: Position,
}

/// Line-start index over one source version.
///
/// Built once per parse and reused for every lookup against that version;
/// offsets resolved against a different version are meaningless.
#[derive(Clone)]
pub struct LineMap {
    index: LineIndex,
    len: usize,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        Self {
            index: LineIndex::new(source),
            len: source.len(),
        }
    }

    /// Resolve a byte offset, clamped to the buffer length.
    pub fn position_at(&self, offset: usize) -> Position {
        let clamped = offset.min(self.len);
        let size = TextSize::from(u32::try_from(clamped).unwrap_or(u32::MAX));
        let line_col = self.index.line_col(size);
        Position {
            line: line_col.line,
            column: line_col.col,
            byte_offset: clamped,
        }
    }

    pub fn range_of(&self, span: Span) -> SourceRange {
        SourceRange {
            start: self.position_at(span.start),
            end: self.position_at(span.end),
        }
    }
}

impl fmt::Debug for LineMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineMap").field("len", &self.len).finish()
    }
}
