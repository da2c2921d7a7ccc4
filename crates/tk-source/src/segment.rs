//! Top-level statement segmentation.
//!
//! A module is cut into [`Segment`]s at top-level line ends (outside any
//! bracket, string, template, or block comment). A top-level `;` followed by
//! more code on the same line also ends a segment, so
//! `register(x); console.log(...)` yields two statements.
//!
//! Concatenating the text of all segments reproduces the input exactly.

use std::ops::Range;

use crate::scan::{CodeMap, Cursor, is_ident_byte};

/// Recognized statement shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind<'a> {
    /// Whitespace only.
    Blank,
    /// Comments only.
    Comment,
    /// An `import` declaration.
    Import,
    /// `[export] <const|let|var> <identifier> = { ... }`.
    Binding {
        /// Bound name.
        identifier: &'a str,
        /// Whether the binding is exported.
        exported: bool,
    },
    /// `export const descriptor = <identifier>;`.
    DescriptorAlias {
        /// Aliased name.
        target: &'a str,
    },
    /// `export default ...`.
    ExportDefault,
    /// `<receiver>.register(...)`.
    Registration {
        /// Object the call is made on.
        receiver: &'a str,
    },
    /// `console.<method>(...)`.
    Log,
    /// Anything else.
    Other,
}

/// One top-level statement (or run of comments or blank lines).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Statement shape.
    pub kind: SegmentKind<'a>,
    /// Byte range, line terminator included.
    pub span: Range<usize>,
    /// Raw text of the segment.
    pub text: &'a str,
}

impl<'a> Segment<'a> {
    /// The segment text without surrounding whitespace.
    #[inline]
    #[must_use]
    pub fn trimmed(&self) -> &'a str {
        self.text.trim()
    }

    /// Returns `true` if `word` appears as a whole word in the segment.
    #[must_use]
    pub fn mentions(&self, word: &str) -> bool {
        let bytes = self.text.as_bytes();
        self.text.match_indices(word).any(|(i, _)| {
            let before = i.checked_sub(1).and_then(|p| bytes.get(p));
            let after = bytes.get(i + word.len());
            before.is_none_or(|&b| !is_ident_byte(b)) && after.is_none_or(|&b| !is_ident_byte(b))
        })
    }

    /// Returns `true` if the segment ends with a line terminator.
    #[inline]
    #[must_use]
    pub fn ends_line(&self) -> bool {
        self.text.ends_with('\n')
    }
}

/// Splits `text` into top-level segments.
///
/// # Examples
///
/// ```
/// use tk_source::{SegmentKind, segments};
///
/// let text = "import { r } from './r.js';\nconst lamp = {\n  a: 1,\n};\nr.register(lamp);\n";
/// let kinds: Vec<_> = segments(text).into_iter().map(|s| s.kind).collect();
/// assert_eq!(
///     kinds,
///     vec![
///         SegmentKind::Import,
///         SegmentKind::Binding { identifier: "lamp", exported: false },
///         SegmentKind::Registration { receiver: "r" },
///     ]
/// );
/// ```
#[must_use]
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let map = CodeMap::new(text);
    segments_in(&map)
}

/// Splits a scanned text into top-level segments.
#[must_use]
pub fn segments_in<'a>(map: &CodeMap<'a>) -> Vec<Segment<'a>> {
    let text = map.text();
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        let boundary = match byte {
            b'\n' => map.is_top_level(i),
            b';' if map.is_top_level(i) => {
                let line_end = text[i + 1..].find('\n').map_or(text.len(), |n| i + 1 + n);
                !text[i + 1..line_end].trim().is_empty() && !map.is_comment_only(i + 1..line_end)
            }
            _ => false,
        };
        if boundary {
            out.push(segment(map, start..i + 1));
            start = i + 1;
        }
    }
    if start < text.len() {
        out.push(segment(map, start..text.len()));
    }
    out
}

fn segment<'a>(map: &CodeMap<'a>, span: Range<usize>) -> Segment<'a> {
    let text = &map.text()[span.clone()];
    Segment {
        kind: classify(map, span.clone(), text.trim()),
        span,
        text,
    }
}

fn classify<'a>(map: &CodeMap<'a>, span: Range<usize>, trimmed: &'a str) -> SegmentKind<'a> {
    if trimmed.is_empty() {
        return SegmentKind::Blank;
    }
    if map.is_comment_only(span) {
        return SegmentKind::Comment;
    }

    let mut cursor = Cursor::new(trimmed, 0);
    if cursor.eat_word("import") {
        return SegmentKind::Import;
    }
    if cursor.eat_word("export") {
        cursor.skip_ws();
        if cursor.eat_word("default") {
            return SegmentKind::ExportDefault;
        }
        return classify_binding(cursor, true);
    }
    if trimmed.starts_with("console.") {
        return SegmentKind::Log;
    }

    let mut cursor = Cursor::new(trimmed, 0);
    if let Some(receiver) = cursor.eat_identifier() {
        cursor.skip_ws();
        if cursor.eat_byte(b'.') {
            cursor.skip_ws();
            if cursor.eat_word("register") {
                cursor.skip_ws();
                if cursor.peek() == Some(b'(') {
                    return SegmentKind::Registration { receiver };
                }
            }
        }
    }

    classify_binding(Cursor::new(trimmed, 0), false)
}

fn classify_binding(mut cursor: Cursor<'_>, exported: bool) -> SegmentKind<'_> {
    let keyword = ["const", "let", "var"]
        .into_iter()
        .find(|keyword| cursor.eat_word(keyword));
    if keyword.is_none() || !cursor.skip_ws() {
        return SegmentKind::Other;
    }
    let Some(identifier) = cursor.eat_identifier() else {
        return SegmentKind::Other;
    };
    cursor.skip_ws();
    if !cursor.eat_byte(b'=') {
        return SegmentKind::Other;
    }
    cursor.skip_ws();

    if cursor.peek() == Some(b'{') {
        return SegmentKind::Binding {
            identifier,
            exported,
        };
    }
    if exported && keyword == Some("const") && identifier == "descriptor" {
        if let Some(target) = cursor.eat_identifier() {
            cursor.skip_ws();
            cursor.eat_byte(b';');
            cursor.skip_ws();
            if cursor.peek().is_none() {
                return SegmentKind::DescriptorAlias { target };
            }
        }
    }
    SegmentKind::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<SegmentKind<'_>> {
        segments(text).into_iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_segments_reproduce_text() {
        let text = "/**\n * Lamp\n */\nimport { a } from 'a';\n\nconst x = {\n  s: `\n}`,\n};\n\nexport default x;";
        let joined: String = segments(text).iter().map(|s| s.text).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn test_canonical_module_kinds() {
        let text = "\
/**
 * Resistor
 */
import { elementRegistry } from '../elementRegistry.js';

const resistor = {
  type: 'resistor',
};

export const descriptor = resistor;
export default resistor;

elementRegistry.register(resistor);
console.log('✔ [circuittikz] bipoles/resistor');
";
        assert_eq!(
            kinds(text),
            vec![
                SegmentKind::Comment,
                SegmentKind::Import,
                SegmentKind::Blank,
                SegmentKind::Binding {
                    identifier: "resistor",
                    exported: false
                },
                SegmentKind::Blank,
                SegmentKind::DescriptorAlias { target: "resistor" },
                SegmentKind::ExportDefault,
                SegmentKind::Blank,
                SegmentKind::Registration {
                    receiver: "elementRegistry"
                },
                SegmentKind::Log,
            ]
        );
    }

    #[test]
    fn test_statements_on_one_line_are_split() {
        let text = "elementRegistry.register('circuittikz:vsource', vsource); console.log(\"✅ vsource registrado\");\n";
        let segs = segments(text);
        assert_eq!(segs.len(), 2);
        assert!(matches!(segs[0].kind, SegmentKind::Registration { .. }));
        assert_eq!(segs[1].kind, SegmentKind::Log);
        assert!(!segs[0].ends_line());
    }

    #[test]
    fn test_legacy_module_kinds() {
        let text = "\
// legacy vsource
import { elementRegistry } from '../elementRegistry.js';
const vsource = {
  type: 'elemento',
};
elementRegistry.register('circuittikz:vsource', vsource); console.log(\"✅ vsource registrado\");
export default vsource;
";
        let listing: Vec<String> = kinds(text).iter().map(|kind| format!("{kind:?}")).collect();
        insta::assert_snapshot!(listing.join("\n"), @r#"
        Comment
        Import
        Binding { identifier: "vsource", exported: false }
        Registration { receiver: "elementRegistry" }
        Log
        ExportDefault
        "#);
    }

    #[test]
    fn test_trailing_comment_does_not_split() {
        let text = "foo(); // note\n";
        assert_eq!(segments(text).len(), 1);
    }

    #[test]
    fn test_exported_descriptor_literal_is_binding() {
        let text = "export const descriptor = {\n  type: \"circle\",\n}\n";
        assert_eq!(
            kinds(text),
            vec![SegmentKind::Binding {
                identifier: "descriptor",
                exported: true
            }]
        );
    }

    #[test]
    fn test_other_statements() {
        let text = "const n = 3;\nexport function f() {\n  return n;\n}\nregisterAll();\nfoo.registerX(a);\n";
        assert_eq!(
            kinds(text),
            vec![
                SegmentKind::Other,
                SegmentKind::Other,
                SegmentKind::Other,
                SegmentKind::Other,
            ]
        );
    }

    #[test]
    fn test_mentions_whole_word() {
        let segs = segments("import { elementRegistry } from '../elementRegistry.js';\n");
        assert!(segs[0].mentions("elementRegistry"));
        assert!(!segs[0].mentions("element"));
    }
}
