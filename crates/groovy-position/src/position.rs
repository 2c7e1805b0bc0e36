//! Editor-side positions and ranges (0-based, UTF-16 code units).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in a document as editors report it.
///
/// `line` is 0-based; `character` is a 0-based offset counted in UTF-16 code
/// units, per the LSP convention. Ordering is lexicographic on (line,
/// character), which is what containment tests rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// 0-based line.
    pub line: u32,
    /// 0-based UTF-16 code unit offset within the line.
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.character)
    }
}

/// A half-open range of editor positions: `[start, end)`.
///
/// A single-line range uses the same start and end line. The end position is
/// exclusive, so an empty range has `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Range covering a run of characters on a single line.
    pub fn on_line(line: u32, start_char: u32, end_char: u32) -> Self {
        Self { start: Position::new(line, start_char), end: Position::new(line, end_char) }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True when `pos` falls inside this range. The end is exclusive except
    /// for empty ranges, which contain only their own start.
    pub fn contains(&self, pos: Position) -> bool {
        if self.is_empty() {
            return pos == self.start;
        }
        self.start <= pos && pos < self.end
    }

    /// Like [`Range::contains`] but with an inclusive end. Position queries
    /// use this for block wrappers whose closing delimiter is the natural
    /// cursor resting point.
    pub fn contains_inclusive(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// True when `other` lies entirely within this range.
    pub fn contains_range(&self, other: Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Size key for "smallest range wins" ordering: compared
    /// lexicographically, fewer spanned lines beat fewer spanned characters.
    /// For multi-line ranges the character component is the end character,
    /// which is a stable (if approximate) proxy for width.
    pub fn size_key(&self) -> (u32, u32) {
        let lines = self.end.line.saturating_sub(self.start.line);
        let chars = if lines == 0 {
            self.end.character.saturating_sub(self.start.character)
        } else {
            self.end.character
        };
        (lines, chars)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn position_ordering_is_lexicographic() {
        assert!(Position::new(0, 9) < Position::new(1, 0));
        assert!(Position::new(1, 3) < Position::new(1, 4));
        assert_eq!(Position::new(2, 2), Position::new(2, 2));
    }

    #[test]
    fn contains_is_end_exclusive() {
        let range = Range::on_line(0, 4, 12);
        assert!(range.contains(Position::new(0, 4)));
        assert!(range.contains(Position::new(0, 11)));
        assert!(!range.contains(Position::new(0, 12)));
        assert!(!range.contains(Position::new(0, 3)));
    }

    #[test]
    fn empty_range_contains_only_itself() {
        let range = Range::on_line(3, 5, 5);
        assert!(range.contains(Position::new(3, 5)));
        assert!(!range.contains(Position::new(3, 6)));
    }

    #[test]
    fn contains_range_accepts_equal_bounds() {
        let outer = Range::new(Position::new(0, 0), Position::new(5, 0));
        let inner = Range::new(Position::new(1, 2), Position::new(2, 8));
        assert!(outer.contains_range(inner));
        assert!(outer.contains_range(outer));
        assert!(!inner.contains_range(outer));
    }

    #[test]
    fn size_key_prefers_fewer_lines() {
        let narrow_multiline = Range::new(Position::new(0, 0), Position::new(1, 1));
        let wide_single = Range::on_line(0, 0, 200);
        assert!(wide_single.size_key() < narrow_multiline.size_key());
    }
}
