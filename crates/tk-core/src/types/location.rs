//! Source positions inside element module text.

use serde::{Deserialize, Serialize};

/// A position within a module's source text.
///
/// - `line` is 1-indexed
/// - `column` is 0-indexed, in bytes from the start of the line
/// - `byte_offset` is the absolute byte position from the start of the text
///
/// # Examples
///
/// ```
/// use tk_core::SourceLocation;
///
/// let loc = SourceLocation::from_offset("const a = 1;\nconst b = {};", 13);
/// assert_eq!(loc, SourceLocation::new(2, 0, 13));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number (1-indexed).
    pub line: u32,

    /// Column number (0-indexed byte offset within the line).
    pub column: u32,

    /// Absolute byte offset from the start of the text.
    pub byte_offset: u32,
}

impl SourceLocation {
    /// Creates a new source location.
    #[inline]
    #[must_use]
    pub const fn new(line: u32, column: u32, byte_offset: u32) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }

    /// Computes the location of `offset` within `text`.
    ///
    /// Offsets past the end of the text are clamped to the end.
    #[must_use]
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let before = &text.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |pos| pos + 1);

        Self::new(
            u32::try_from(line).unwrap_or(u32::MAX),
            u32::try_from(offset - line_start).unwrap_or(u32::MAX),
            u32::try_from(offset).unwrap_or(u32::MAX),
        )
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_offset_first_line() {
        let loc = SourceLocation::from_offset("const x = {}", 6);
        assert_eq!(loc, SourceLocation::new(1, 6, 6));
    }

    #[test]
    fn test_from_offset_later_line() {
        let text = "// header\n\nconst x = {}";
        let loc = SourceLocation::from_offset(text, 17);
        assert_eq!(loc.line, 3);
        assert_eq!(loc.column, 6);
    }

    #[test]
    fn test_from_offset_clamps() {
        let loc = SourceLocation::from_offset("ab", 10);
        assert_eq!(loc.byte_offset, 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(SourceLocation::new(3, 4, 20).to_string(), "3:5");
    }
}
