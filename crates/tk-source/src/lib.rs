//! Parser-free scanning of element module source text.
//!
//! Element modules are small, author-controlled files following a handful of
//! layouts. Instead of building a syntax tree, this crate works on raw text:
//!
//! - [`CodeMap`] classifies every byte as code, comment, or literal and
//!   tracks bracket depth, so brackets inside strings, templates, and
//!   comments never count
//! - [`extract_literal`] finds the first top-level `const X = { ... }` and
//!   returns its span, falling back to a line heuristic when brackets do not
//!   balance
//! - [`fields`] splits a literal body into its top-level fields
//! - [`segments`] cuts a module into top-level statements (imports,
//!   bindings, registrations, log calls, ...)
//! - [`label_for`] and [`to_js_identifier`] derive labels and binding names
//!
//! # Examples
//!
//! ```
//! use tk_source::{extract_literal, has_descriptor_export, label_for};
//!
//! let text = "const switchClosed = {\n  icon: 'S',\n};\nexport default switchClosed;\n";
//!
//! assert!(!has_descriptor_export(text));
//! let literal = extract_literal(text).unwrap();
//! assert_eq!(label_for(literal.identifier), "Switch Closed");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod literal;
mod naming;
mod scan;
mod segment;

pub use literal::{
    BindingKeyword, Field, FieldKind, ObjectLiteral, Termination, extract_literal, fields,
    find_literals, has_descriptor_export, literals_in,
};
pub use naming::{is_js_identifier, label_for, quote_js, to_js_identifier};
pub use scan::{ByteClass, CodeMap, is_ident_byte, is_word_start};
pub use segment::{Segment, SegmentKind, segments, segments_in};
