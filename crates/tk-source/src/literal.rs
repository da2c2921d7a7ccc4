//! Object-literal span extraction.
//!
//! Element modules bind their definition to a name with
//! `[export] <const|let|var> <identifier> = { ... }`. This module locates
//! those bindings at the top level of a text and returns the literal's span
//! without parsing the language.
//!
//! When brackets balance, the literal ends at its matching `}`. Otherwise the
//! span runs up to the first following line that starts an `export`,
//! registration, or `console` statement, or to the end of the text.
//!
//! # Examples
//!
//! ```
//! use tk_source::{Termination, extract_literal};
//!
//! let text = "import x from './x.js';\n\nconst lamp = {\n  icon: 'L',\n};\n";
//! let literal = extract_literal(text).unwrap();
//! assert_eq!(literal.identifier, "lamp");
//! assert_eq!(literal.body, "\n  icon: 'L',\n");
//! assert_eq!(literal.termination, Termination::Balanced);
//! ```

use std::ops::Range;

use smallvec::SmallVec;
use tk_core::SourceLocation;

use crate::scan::{ByteClass, CodeMap, Cursor, is_word_start};

/// Keyword introducing a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKeyword {
    /// `const`
    Const,
    /// `let`
    Let,
    /// `var`
    Var,
}

impl BindingKeyword {
    /// The keyword as written in source.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Const => "const",
            Self::Let => "let",
            Self::Var => "var",
        }
    }
}

/// How the end of a literal was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// The literal's closing brace was found.
    Balanced,
    /// Brackets never balanced; the end was found by the line heuristic.
    Heuristic,
}

/// An object literal bound at the top level of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLiteral<'a> {
    /// Binding keyword.
    pub keyword: BindingKeyword,
    /// Bound name.
    pub identifier: &'a str,
    /// Whether the binding is preceded by `export`.
    pub exported: bool,
    /// Byte range of the whole statement head through the literal's end.
    pub statement: Range<usize>,
    /// Byte range of the literal, from `{` through `}`.
    pub span: Range<usize>,
    /// The literal text, braces included.
    pub text: &'a str,
    /// The text between the braces.
    pub body: &'a str,
    /// Position of the statement.
    pub location: SourceLocation,
    /// How the end was found.
    pub termination: Termination,
}

impl ObjectLiteral<'_> {
    /// Top-level fields of the literal body.
    pub fn fields(&self) -> SmallVec<[Field<'_>; 8]> {
        fields(self.body)
    }

    /// Plain string value of the top-level field `key`, if present.
    #[must_use]
    pub fn string_field(&self, key: &str) -> Option<&str> {
        self.fields()
            .into_iter()
            .find(|field| field.key == Some(key))
            .and_then(|field| field.string_value())
    }
}

/// Returns the first top-level object-literal binding of `text`.
///
/// When a module binds several literals, the first one wins.
#[must_use]
pub fn extract_literal(text: &str) -> Option<ObjectLiteral<'_>> {
    let map = CodeMap::new(text);
    literals_in(&map).next()
}

/// Returns every top-level object-literal binding of `text`, in order.
#[must_use]
pub fn find_literals(text: &str) -> Vec<ObjectLiteral<'_>> {
    let map = CodeMap::new(text);
    literals_in(&map).collect()
}

/// Returns `true` if the text has a top-level `export const descriptor =`.
///
/// Modules in canonical form always do.
///
/// # Examples
///
/// ```
/// use tk_source::has_descriptor_export;
///
/// assert!(has_descriptor_export("export const descriptor = resistor;\n"));
/// assert!(!has_descriptor_export("// export const descriptor = x;\n"));
/// ```
#[must_use]
pub fn has_descriptor_export(text: &str) -> bool {
    let map = CodeMap::new(text);
    map.find_top_level("export")
        .filter(|&start| is_word_start(text, start))
        .any(|start| {
            let mut cursor = Cursor::new(text, start);
            cursor.eat_word("export")
                && cursor.skip_ws()
                && cursor.eat_word("const")
                && cursor.skip_ws()
                && cursor.eat_word("descriptor")
                && {
                    cursor.skip_ws();
                    cursor.eat_byte(b'=')
                }
        })
}

/// Iterates the object-literal bindings of a scanned text.
pub fn literals_in<'m, 'a>(map: &'m CodeMap<'a>) -> impl Iterator<Item = ObjectLiteral<'a>> + 'm {
    let text = map.text();
    let bytes = text.as_bytes();
    let mut skip_until = 0;

    (0..bytes.len()).filter_map(move |start| {
        if start < skip_until
            || !matches!(bytes[start], b'e' | b'c' | b'l' | b'v')
            || !map.is_top_level(start)
            || !is_word_start(text, start)
        {
            return None;
        }
        let head = BindingHead::parse(text, start)?;
        let literal = head.finish(map);
        skip_until = literal.span.end;
        Some(literal)
    })
}

/// A binding statement up to and including its opening brace.
struct BindingHead<'a> {
    start: usize,
    exported: bool,
    keyword: BindingKeyword,
    identifier: &'a str,
    open: usize,
}

impl<'a> BindingHead<'a> {
    fn parse(text: &'a str, start: usize) -> Option<Self> {
        let mut cursor = Cursor::new(text, start);
        let exported = cursor.eat_word("export");
        if exported && !cursor.skip_ws() {
            return None;
        }

        let keyword = if cursor.eat_word("const") {
            BindingKeyword::Const
        } else if cursor.eat_word("let") {
            BindingKeyword::Let
        } else if cursor.eat_word("var") {
            BindingKeyword::Var
        } else {
            return None;
        };
        if !cursor.skip_ws() {
            return None;
        }

        let identifier = cursor.eat_identifier()?;
        cursor.skip_ws();
        if !cursor.eat_byte(b'=') {
            return None;
        }
        cursor.skip_ws();
        let open = cursor.pos;
        if !cursor.eat_byte(b'{') {
            return None;
        }

        Some(Self {
            start,
            exported,
            keyword,
            identifier,
            open,
        })
    }

    fn finish(self, map: &CodeMap<'a>) -> ObjectLiteral<'a> {
        let text = map.text();
        let close = map
            .matching_close(self.open)
            .filter(|&close| text.as_bytes()[close] == b'}');

        let (span, body, termination) = match close {
            Some(close) => (
                self.open..close + 1,
                &text[self.open + 1..close],
                Termination::Balanced,
            ),
            None => {
                let end = heuristic_end(text, self.open);
                let region = text[self.open..end].trim_end();
                let region = region.strip_suffix(';').map_or(region, str::trim_end);
                let body = region[1..].strip_suffix('}').unwrap_or(&region[1..]);
                (
                    self.open..self.open + region.len(),
                    body,
                    Termination::Heuristic,
                )
            }
        };

        let mut statement_end = span.end;
        if text.as_bytes().get(statement_end) == Some(&b';') {
            statement_end += 1;
        }

        ObjectLiteral {
            keyword: self.keyword,
            identifier: self.identifier,
            exported: self.exported,
            statement: self.start..statement_end,
            text: &text[span.clone()],
            span,
            body,
            location: SourceLocation::from_offset(text, self.start),
            termination,
        }
    }
}

/// Start of the first line after `open` that begins a statement ending the
/// literal, or the end of the text.
fn heuristic_end(text: &str, open: usize) -> usize {
    let Some(newline) = text[open..].find('\n') else {
        return text.len();
    };
    let mut line_start = open + newline + 1;
    while line_start < text.len() {
        let line_end = text[line_start..]
            .find('\n')
            .map_or(text.len(), |n| line_start + n);
        if is_terminator_line(text[line_start..line_end].trim_start()) {
            return line_start;
        }
        line_start = line_end + 1;
    }
    text.len()
}

fn is_terminator_line(line: &str) -> bool {
    line.strip_prefix("export")
        .is_some_and(|rest| rest.starts_with([' ', '\t', '{', '*']))
        || line.starts_with("console.")
        || line.contains(".register(")
}

/// Kind of a top-level literal field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// `key: value` or shorthand `key`.
    Property,
    /// `key(...) { ... }`, including `async`, `get`, and `set` forms.
    Method,
    /// `...expression`
    Spread,
    /// Anything else (computed keys, stray text).
    Other,
}

/// One top-level field of an object literal body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field<'a> {
    /// Key, when it could be determined.
    pub key: Option<&'a str>,
    /// Field kind.
    pub kind: FieldKind,
    /// Range within the body, from just after the previous comma (leading
    /// whitespace and comments included) up to the separating comma.
    pub span: Range<usize>,
    /// Range including the separating comma, if there is one.
    pub span_with_comma: Range<usize>,
    /// Field text, trimmed, leading comments included.
    pub text: &'a str,
    /// Property value text, trimmed.
    pub value: Option<&'a str>,
}

impl<'a> Field<'a> {
    /// Returns the contents of a plain quoted string value.
    ///
    /// Values containing escapes or template substitutions yield `None`.
    #[must_use]
    pub fn string_value(&self) -> Option<&'a str> {
        let value = self.value?;
        let quote = value.chars().next()?;
        if !matches!(quote, '\'' | '"' | '`') || value.len() < 2 || !value.ends_with(quote) {
            return None;
        }
        let inner = &value[1..value.len() - 1];
        if inner.contains(quote) || inner.contains('\\') || (quote == '`' && inner.contains("${")) {
            return None;
        }
        Some(inner)
    }
}

/// Splits an object literal body at its top-level commas.
///
/// Empty trailing segments (after a trailing comma) are not returned.
///
/// # Examples
///
/// ```
/// use tk_source::{FieldKind, fields};
///
/// let body = "\n  label: 'Lamp',\n  render(el) { return [el.x, el.y]; },\n  ...base,\n";
/// let fields = fields(body);
/// assert_eq!(fields.len(), 3);
/// assert_eq!(fields[0].string_value(), Some("Lamp"));
/// assert_eq!(fields[1].kind, FieldKind::Method);
/// assert_eq!(fields[2].kind, FieldKind::Spread);
/// ```
#[must_use]
pub fn fields(body: &str) -> SmallVec<[Field<'_>; 8]> {
    let map = CodeMap::new(body);
    let mut out = SmallVec::new();
    let mut start = 0;

    let mut push = |start: usize, end: usize, comma: Option<usize>| {
        if let Some(field) = Field::parse(&map, start, end, comma) {
            out.push(field);
        }
    };

    for comma in map.find_top_level(",") {
        push(start, comma, Some(comma));
        start = comma + 1;
    }
    push(start, body.len(), None);
    out
}

impl<'a> Field<'a> {
    fn parse(map: &CodeMap<'a>, start: usize, end: usize, comma: Option<usize>) -> Option<Self> {
        let body = map.text();
        let raw = &body[start..end];
        if raw.trim().is_empty() {
            return None;
        }

        // First byte that is neither whitespace nor comment.
        let bytes = body.as_bytes();
        let content = (start..end)
            .find(|&i| !bytes[i].is_ascii_whitespace() && map.class_at(i) != Some(ByteClass::Comment));

        let (key, kind, value) = match content {
            Some(pos) => classify_field(&body[pos..end]),
            None => (None, FieldKind::Other, None),
        };

        Some(Self {
            key,
            kind,
            span: start..end,
            span_with_comma: start..comma.map_or(end, |c| c + 1),
            text: raw.trim(),
            value,
        })
    }
}

fn classify_field(text: &str) -> (Option<&str>, FieldKind, Option<&str>) {
    if text.starts_with("...") {
        return (None, FieldKind::Spread, None);
    }

    let mut cursor = Cursor::new(text, 0);
    for modifier in ["async", "get", "set"] {
        let mut ahead = Cursor::new(text, 0);
        if ahead.eat_word(modifier) && ahead.skip_ws() {
            if let Some(name) = ahead.eat_identifier() {
                ahead.skip_ws();
                if ahead.peek() == Some(b'(') {
                    return (Some(name), FieldKind::Method, None);
                }
            }
        }
    }

    let key = cursor.eat_identifier().or_else(|| cursor.eat_quoted());
    let Some(key) = key else {
        return (None, FieldKind::Other, None);
    };
    cursor.skip_ws();
    match cursor.peek() {
        Some(b':') => {
            let value = text[cursor.pos + 1..].trim();
            (Some(key), FieldKind::Property, Some(value))
        }
        Some(b'(') => (Some(key), FieldKind::Method, None),
        None => (Some(key), FieldKind::Property, Some(key)),
        Some(_) => (Some(key), FieldKind::Other, None),
    }
}
