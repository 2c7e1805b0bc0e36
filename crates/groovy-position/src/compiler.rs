//! Compiler-side coordinates (1-based) and the editor boundary conversion.

use crate::{Position, Range};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 1-based line/column pair as the Groovy front end reports it.
///
/// Columns are counted in UTF-16 code units by the lexer, so the editor
/// conversion is exactly a ±1 shift on both axes. The front end flags nodes
/// it fabricated with non-positive coordinates; those are invalid here and
/// excluded from position queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineColumn {
    /// 1-based line.
    pub line: u32,
    /// 1-based column in UTF-16 code units.
    pub column: u32,
}

impl LineColumn {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Compiler-generated nodes carry zero (or negative, clamped to zero)
    /// coordinates; anything 1-based is addressable.
    pub fn is_valid(&self) -> bool {
        self.line >= 1 && self.column >= 1
    }

    /// `to_editor(l, c) = (l - 1, c - 1)`. Returns `None` for invalid
    /// coordinates rather than wrapping.
    pub fn to_editor(&self) -> Option<Position> {
        if !self.is_valid() {
            return None;
        }
        Some(Position::new(self.line - 1, self.column - 1))
    }

    /// `to_compiler(l, c) = (l + 1, c + 1)`.
    pub fn from_editor(pos: Position) -> Self {
        Self { line: pos.line + 1, column: pos.character + 1 }
    }
}

impl fmt::Display for LineColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A compiler-coordinate range. Start is inclusive; the end column points one
/// past the last character, matching the half-open editor convention after
/// conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: LineColumn,
    pub end: LineColumn,
}

impl SourceRange {
    pub fn new(start: LineColumn, end: LineColumn) -> Self {
        Self { start, end }
    }

    /// The zero range used for synthesized nodes; never matches a query.
    pub fn synthetic() -> Self {
        Self { start: LineColumn::new(0, 0), end: LineColumn::new(0, 0) }
    }

    pub fn is_valid(&self) -> bool {
        self.start.is_valid() && self.end.is_valid()
    }

    /// Converts to an editor range. `None` when either endpoint is invalid.
    pub fn to_editor(&self) -> Option<Range> {
        Some(Range::new(self.start.to_editor()?, self.end.to_editor()?))
    }

    /// Widens this range to cover `other`. Used by the parser to keep the
    /// parent-contains-child invariant when attaching trailing children.
    pub fn union(&self, other: SourceRange) -> SourceRange {
        SourceRange {
            start: if other.start < self.start { other.start } else { self.start },
            end: if other.end > self.end { other.end } else { self.end },
        }
    }

    pub fn contains_range(&self, other: SourceRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn synthetic_range_is_invalid() {
        let range = SourceRange::synthetic();
        assert!(!range.is_valid());
        assert!(range.to_editor().is_none());
    }

    #[test]
    fn conversion_shifts_by_one() {
        let lc = LineColumn::new(3, 7);
        assert_eq!(lc.to_editor(), Some(Position::new(2, 6)));
        assert_eq!(LineColumn::from_editor(Position::new(2, 6)), lc);
    }

    proptest! {
        // to_compiler(to_editor(l, c)) == (l, c) for all valid coordinates,
        // and the reverse for all editor positions.
        #[test]
        fn round_trip_compiler(line in 1u32..100_000, column in 1u32..100_000) {
            let lc = LineColumn::new(line, column);
            let editor = lc.to_editor();
            prop_assert_eq!(editor.map(LineColumn::from_editor), Some(lc));
        }

        #[test]
        fn round_trip_editor(line in 0u32..100_000, character in 0u32..100_000) {
            let pos = Position::new(line, character);
            prop_assert_eq!(LineColumn::from_editor(pos).to_editor(), Some(pos));
        }
    }
}
