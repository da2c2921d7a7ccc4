//! Bracket-depth code map over raw module text.
//!
//! [`CodeMap`] classifies every byte of a text as code, comment, or literal
//! (string and template text) and records the bracket depth in effect before
//! it. Brackets inside strings, templates, and comments do not count;
//! `${ ... }` inside a template re-enters code one level deeper.
//!
//! The scanner never fails. Unbalanced input simply leaves a non-zero depth
//! at the end, which callers observe through [`CodeMap::is_balanced`].
//!
//! Regular expression literals are not recognized.
//!
//! # Examples
//!
//! ```
//! use tk_source::CodeMap;
//!
//! let text = "const a = { s: '}', b: [1] };";
//! let map = CodeMap::new(text);
//! let open = text.find('{').unwrap();
//! assert_eq!(map.matching_close(open), Some(text.len() - 2));
//! assert!(map.is_balanced());
//! ```

use std::ops::Range;

/// Lexical class of a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteClass {
    /// Ordinary code, including brackets and whitespace.
    Code,
    /// Line or block comment.
    Comment,
    /// String literal or template text.
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    LineComment,
    BlockComment,
    Str(u8),
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Bracket,
    TemplateExpr,
}

/// Per-byte classification and bracket depth of a text.
#[derive(Debug, Clone)]
pub struct CodeMap<'a> {
    text: &'a str,
    classes: Vec<ByteClass>,
    depths: Vec<usize>,
    end_depth: usize,
    ends_in_code: bool,
}

impl<'a> CodeMap<'a> {
    /// Scans `text`.
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        let bytes = text.as_bytes();
        let len = bytes.len();
        let mut classes = vec![ByteClass::Code; len];
        let mut depths = vec![0; len];
        let mut frames: Vec<Frame> = Vec::new();
        let mut mode = Mode::Code;

        let mut i = 0;
        while i < len {
            let byte = bytes[i];
            let next = bytes.get(i + 1).copied();
            let depth = frames.len();
            let mut width = 1;

            let class = match mode {
                Mode::Code => match byte {
                    b'/' if next == Some(b'/') => {
                        mode = Mode::LineComment;
                        width = 2;
                        ByteClass::Comment
                    }
                    b'/' if next == Some(b'*') => {
                        mode = Mode::BlockComment;
                        width = 2;
                        ByteClass::Comment
                    }
                    b'\'' | b'"' => {
                        mode = Mode::Str(byte);
                        ByteClass::Literal
                    }
                    b'`' => {
                        mode = Mode::Template;
                        ByteClass::Literal
                    }
                    b'{' | b'(' | b'[' => {
                        frames.push(Frame::Bracket);
                        ByteClass::Code
                    }
                    b'}' if frames.last() == Some(&Frame::TemplateExpr) => {
                        frames.pop();
                        mode = Mode::Template;
                        ByteClass::Literal
                    }
                    b'}' | b')' | b']' => {
                        if frames.last() == Some(&Frame::Bracket) {
                            frames.pop();
                        }
                        ByteClass::Code
                    }
                    _ => ByteClass::Code,
                },
                Mode::LineComment => {
                    if byte == b'\n' {
                        mode = Mode::Code;
                        ByteClass::Code
                    } else {
                        ByteClass::Comment
                    }
                }
                Mode::BlockComment => {
                    if byte == b'*' && next == Some(b'/') {
                        mode = Mode::Code;
                        width = 2;
                    }
                    ByteClass::Comment
                }
                Mode::Str(quote) => {
                    if byte == b'\\' {
                        width = 2;
                        ByteClass::Literal
                    } else if byte == b'\n' {
                        // Unterminated string: recover at the end of the line.
                        mode = Mode::Code;
                        ByteClass::Code
                    } else {
                        if byte == quote {
                            mode = Mode::Code;
                        }
                        ByteClass::Literal
                    }
                }
                Mode::Template => {
                    if byte == b'\\' {
                        width = 2;
                    } else if byte == b'`' {
                        mode = Mode::Code;
                    } else if byte == b'$' && next == Some(b'{') {
                        frames.push(Frame::TemplateExpr);
                        mode = Mode::Code;
                        width = 2;
                    }
                    ByteClass::Literal
                }
            };

            let end = (i + width).min(len);
            classes[i..end].fill(class);
            depths[i..end].fill(depth);
            i = end;
        }

        Self {
            text,
            classes,
            depths,
            end_depth: frames.len(),
            ends_in_code: matches!(mode, Mode::Code | Mode::LineComment),
        }
    }

    /// The scanned text.
    #[inline]
    #[must_use]
    pub const fn text(&self) -> &'a str {
        self.text
    }

    /// Length of the scanned text in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns `true` if the text is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Class of the byte at `index`, or `None` past the end.
    #[inline]
    #[must_use]
    pub fn class_at(&self, index: usize) -> Option<ByteClass> {
        self.classes.get(index).copied()
    }

    /// Bracket depth in effect before the byte at `index`.
    ///
    /// Past the end, returns the depth at the end of the text.
    #[inline]
    #[must_use]
    pub fn depth_at(&self, index: usize) -> usize {
        self.depths.get(index).copied().unwrap_or(self.end_depth)
    }

    /// Returns `true` if the byte at `index` is code.
    #[inline]
    #[must_use]
    pub fn is_code(&self, index: usize) -> bool {
        self.class_at(index) == Some(ByteClass::Code)
    }

    /// Returns `true` if the byte at `index` is code outside any bracket.
    #[inline]
    #[must_use]
    pub fn is_top_level(&self, index: usize) -> bool {
        self.is_code(index) && self.depth_at(index) == 0
    }

    /// Returns `true` if every bracket is closed and the text does not end
    /// inside a string, template, or block comment.
    #[inline]
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        self.end_depth == 0 && self.ends_in_code
    }

    /// Finds the bracket closing the one opened at `open`.
    ///
    /// Returns `None` if `open` is not an opening bracket in code or if the
    /// bracket is never closed.
    #[must_use]
    pub fn matching_close(&self, open: usize) -> Option<usize> {
        let bytes = self.text.as_bytes();
        if !self.is_code(open) || !matches!(bytes.get(open), Some(b'{' | b'(' | b'[')) {
            return None;
        }
        let inner = self.depth_at(open) + 1;
        (open + 1..bytes.len()).find(|&i| {
            matches!(bytes[i], b'}' | b')' | b']') && self.is_code(i) && self.depths[i] == inner
        })
    }

    /// Returns `true` if every non-whitespace byte in `range` is a comment.
    ///
    /// An all-whitespace range is not a comment.
    #[must_use]
    pub fn is_comment_only(&self, range: Range<usize>) -> bool {
        let bytes = self.text.as_bytes();
        let end = range.end.min(bytes.len());
        let start = range.start.min(end);
        let mut saw_comment = false;
        for (byte, class) in bytes[start..end].iter().zip(&self.classes[start..end]) {
            if byte.is_ascii_whitespace() {
                continue;
            }
            if *class != ByteClass::Comment {
                return false;
            }
            saw_comment = true;
        }
        saw_comment
    }

    /// Offsets of `needle` in `range` whose first byte is code.
    pub fn find_code<'s>(
        &'s self,
        needle: &'s str,
        range: Range<usize>,
    ) -> impl Iterator<Item = usize> + 's {
        let end = range.end.min(self.text.len());
        let start = range.start.min(end);
        self.text[start..end]
            .match_indices(needle)
            .map(move |(offset, _)| start + offset)
            .filter(|&i| self.is_code(i))
    }

    /// Offsets of `needle` anywhere in the text where it starts in top-level
    /// code.
    pub fn find_top_level<'s>(&'s self, needle: &'s str) -> impl Iterator<Item = usize> + 's {
        self.find_code(needle, 0..self.text.len())
            .filter(|&i| self.depths[i] == 0)
    }
}

/// Returns `true` for bytes that may appear in an identifier.
#[inline]
#[must_use]
pub const fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

/// Returns `true` if a word may start at `index` (no identifier byte or
/// member access directly before it).
#[inline]
#[must_use]
pub fn is_word_start(text: &str, index: usize) -> bool {
    index == 0
        || text
            .as_bytes()
            .get(index - 1)
            .is_some_and(|&b| !is_ident_byte(b) && b != b'.')
}

/// Byte cursor over ASCII tokens.
pub(crate) struct Cursor<'a> {
    text: &'a str,
    pub(crate) pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) const fn new(text: &'a str, pos: usize) -> Self {
        Self { text, pos }
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    /// Skips whitespace, returning `true` if any was skipped.
    pub(crate) fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    pub(crate) fn eat_byte(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_word(&mut self, word: &str) -> bool {
        let rest = &self.text.as_bytes()[self.pos..];
        let matches = rest.starts_with(word.as_bytes())
            && rest.get(word.len()).is_none_or(|&b| !is_ident_byte(b));
        if matches {
            self.pos += word.len();
        }
        matches
    }

    pub(crate) fn eat_identifier(&mut self) -> Option<&'a str> {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        if !bytes
            .get(start)
            .is_some_and(|&b| b.is_ascii_alphabetic() || b == b'_' || b == b'$')
        {
            return None;
        }
        let mut end = start + 1;
        while bytes.get(end).is_some_and(|&b| is_ident_byte(b)) {
            end += 1;
        }
        self.pos = end;
        Some(&self.text[start..end])
    }

    pub(crate) fn eat_quoted(&mut self) -> Option<&'a str> {
        let quote = self.peek().filter(|b| matches!(b, b'\'' | b'"'))?;
        let start = self.pos + 1;
        let len = self.text.as_bytes()[start..].iter().position(|&b| b == quote)?;
        self.pos = start + len + 1;
        Some(&self.text[start..start + len])
    }
}
