//! Descriptor synthesis.
//!
//! [`synthesize`] is total: given a file identifier and whatever could be
//! recovered from the source module, it always produces a module in the
//! canonical frame. Identity fields (`type`, `library`, `category`, `label`)
//! are written by the frame and dropped from the carried-over body; every
//! other field is kept verbatim, re-indented.

use tk_core::RegistryConfig;
use tk_source::{ByteClass, CodeMap, Field, FieldKind, fields, label_for, to_js_identifier};

use crate::module::{IDENTITY_KEYS, ModuleFrame, Support, render_module};

/// Body written when no literal could be recovered.
const PLACEHOLDER_BODY: &str = "  // No definition could be recovered from the original module.\n  \
                                // Add defaults, propertySchema, svgRender, and codeGenerator.\n";

/// Inputs of a synthesis.
#[derive(Debug, Clone)]
pub struct SynthesisInput<'a> {
    /// File identifier of the module.
    pub file_id: &'a str,
    /// Identifier bound in the source, if one was found.
    pub identifier: Option<&'a str>,
    /// Text between the literal's braces, if a literal was found.
    pub body: Option<&'a str>,
    /// Whether the source binding was exported.
    pub exported: bool,
    /// Library name.
    pub library: &'a str,
    /// Resolved category.
    pub category: &'a str,
    /// Resolved label; an authored `label` in the body takes precedence.
    pub label: Option<&'a str>,
    /// Statements carried over from the source.
    pub support: Support,
    /// Registry wiring.
    pub registry: &'a RegistryConfig,
}

impl<'a> SynthesisInput<'a> {
    /// Creates an input with nothing recovered.
    #[must_use]
    pub fn new(
        file_id: &'a str,
        library: &'a str,
        category: &'a str,
        registry: &'a RegistryConfig,
    ) -> Self {
        Self {
            file_id,
            identifier: None,
            body: None,
            exported: false,
            library,
            category,
            label: None,
            support: Support::default(),
            registry,
        }
    }

    /// Sets the recovered literal.
    #[must_use]
    pub const fn with_literal(mut self, identifier: &'a str, body: &'a str, exported: bool) -> Self {
        self.identifier = Some(identifier);
        self.body = Some(body);
        self.exported = exported;
        self
    }

    /// Sets the bound identifier without a body.
    #[must_use]
    pub const fn with_identifier(mut self, identifier: &'a str) -> Self {
        self.identifier = Some(identifier);
        self
    }

    /// Sets the resolved label.
    #[must_use]
    pub const fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    /// Sets the carried-over statements.
    #[must_use]
    pub fn with_support(mut self, support: Support) -> Self {
        self.support = support;
        self
    }
}

/// Produces a canonical module.
///
/// # Examples
///
/// ```
/// use tk_codegen::{SynthesisInput, synthesize};
/// use tk_core::RegistryConfig;
///
/// let registry = RegistryConfig::default();
/// let input = SynthesisInput::new("lamp", "circuittikz", "bipole", &registry)
///     .with_literal("lamp", "\n  type: 'elemento',\n  icon: '💡',\n", false);
/// let text = synthesize(&input);
/// assert!(text.contains("  type: 'lamp',\n"));
/// assert!(text.contains("  label: 'Lamp',\n  icon: '💡',\n};"));
/// assert!(text.ends_with("console.log('✔ [circuittikz] bipole/lamp');\n"));
/// ```
#[must_use]
pub fn synthesize(input: &SynthesisInput<'_>) -> String {
    let identifier = input
        .identifier
        .map_or_else(|| to_js_identifier(input.file_id), str::to_owned);

    let (body, authored_label) = match input.body {
        Some(body) => {
            let (kept, authored) = strip_identity(body);
            (reindent(&kept), authored)
        }
        None => (PLACEHOLDER_BODY.to_owned(), None),
    };

    let label = authored_label
        .or(input.label)
        .map_or_else(|| label_for(&identifier), str::to_owned);

    let frame = ModuleFrame {
        identifier: &identifier,
        exported: input.exported,
        library: input.library,
        category: input.category,
        label: &label,
        registry: input.registry,
    };
    render_module(&frame, &body, &input.support)
}

/// Removes identity fields, returning the rest and any authored label.
fn strip_identity(body: &str) -> (String, Option<&str>) {
    let fields = fields(body);
    let authored = fields
        .iter()
        .find(|field| field.kind == FieldKind::Property && field.key == Some("label"))
        .and_then(Field::string_value);

    let mut kept = String::with_capacity(body.len());
    let mut cursor = 0;
    for field in fields.iter().filter(|field| is_identity(field)) {
        kept.push_str(&body[cursor..field.span_with_comma.start]);
        cursor = field.span_with_comma.end;
    }
    kept.push_str(&body[cursor..]);
    (kept, authored)
}

fn is_identity(field: &Field<'_>) -> bool {
    field.kind == FieldKind::Property && field.key.is_some_and(|key| IDENTITY_KEYS.contains(&key))
}

/// Re-indents a body to two spaces, leaving template-literal lines alone.
fn reindent(body: &str) -> String {
    let map = CodeMap::new(body);
    let in_literal = |index: usize| map.class_at(index) == Some(ByteClass::Literal);

    let mut lines = Vec::new();
    let mut offset = 0;
    for line in body.split('\n') {
        let verbatim = offset > 0 && in_literal(offset - 1);
        let open_end = in_literal(offset + line.len());
        lines.push((line, verbatim, open_end));
        offset += line.len() + 1;
    }

    let is_blank = |&(line, verbatim, _): &(&str, bool, bool)| !verbatim && line.trim().is_empty();
    let first = lines.iter().position(|l| !is_blank(l));
    let last = lines.iter().rposition(|l| !is_blank(l));
    let (Some(first), Some(last)) = (first, last) else {
        return String::new();
    };
    let lines = &lines[first..=last];

    let indent = lines
        .iter()
        .filter(|l| !l.1 && !is_blank(*l))
        .map(|(line, ..)| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    let mut out = String::with_capacity(body.len() + lines.len() * 2);
    for entry in lines {
        let (line, verbatim, open_end) = *entry;
        if verbatim {
            out.push_str(line);
        } else if !is_blank(entry) {
            let line = line.get(indent..).unwrap_or_else(|| line.trim_start());
            out.push_str("  ");
            out.push_str(if open_end { line } else { line.trim_end() });
        }
        out.push('\n');
    }
    out
}
