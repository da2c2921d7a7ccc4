//! Canonical module frame.
//!
//! Every module the migration writes, converted or generated, shares one
//! frame:
//!
//! ```text
//! /**
//!  * Resistor
//!  * Library: circuittikz | Category: bipole
//!  */
//! import { elementRegistry } from '../elementRegistry.js';
//!
//! const resistor = {
//!   type: 'resistor',
//!   library: 'circuittikz',
//!   category: 'bipole',
//!   label: 'Resistor',
//!   ...
//! };
//!
//! export const descriptor = resistor;
//! export default resistor;
//!
//! elementRegistry.register(resistor);
//! console.log('✔ [circuittikz] bipole/resistor');
//! ```
//!
//! The registration patcher recognizes this frame as already canonical, so
//! patching freshly written modules changes nothing.

use tk_core::RegistryConfig;
use tk_source::quote_js;

/// Name of the canonical descriptor export.
pub const DESCRIPTOR_EXPORT: &str = "descriptor";

/// Keys the frame writes itself; bodies never repeat them.
pub const IDENTITY_KEYS: [&str; 4] = ["type", "library", "category", "label"];

/// Markers that identify an existing registration log line.
const DIAGNOSTIC_MARKERS: [&str; 4] = ["✔ [", "✅", "registrado", "registered"];

/// `type` values legacy modules used as a stand-in for the element name.
const GENERIC_TYPES: [&str; 3] = ["elemento", "element", ""];

/// Everything the frame needs besides the literal body.
#[derive(Debug, Clone, Copy)]
pub struct ModuleFrame<'a> {
    /// Declared identifier; also the element type.
    pub identifier: &'a str,
    /// Whether the binding itself carries `export`.
    pub exported: bool,
    /// Library name.
    pub library: &'a str,
    /// Category name.
    pub category: &'a str,
    /// Display label.
    pub label: &'a str,
    /// Registry wiring.
    pub registry: &'a RegistryConfig,
}

/// Statements carried over from a source module alongside the literal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Support {
    /// Additional import declarations.
    pub imports: Vec<String>,
    /// Statements that preceded the binding.
    pub leading: String,
    /// Statements that followed the binding.
    pub trailing: String,
}

impl Support {
    /// Returns `true` if nothing is carried over.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.leading.is_empty() && self.trailing.is_empty()
    }
}

/// Renders the registration call for `identifier`.
///
/// # Examples
///
/// ```
/// use tk_codegen::render_registration;
///
/// assert_eq!(
///     render_registration("elementRegistry", "lamp"),
///     "elementRegistry.register(lamp);"
/// );
/// ```
#[must_use]
pub fn render_registration(receiver: &str, identifier: &str) -> String {
    format!("{receiver}.register({identifier});")
}

/// Renders the diagnostic log line that follows a registration.
#[must_use]
pub fn render_diagnostic(library: &str, category: &str, type_name: &str) -> String {
    let message = format!("✔ [{library}] {category}/{type_name}");
    format!("console.log({});", quote_js(&message))
}

/// Renders the registry import declaration.
#[must_use]
pub fn render_import(registry: &RegistryConfig) -> String {
    format!(
        "import {{ {} }} from {};",
        registry.receiver,
        quote_js(&registry.import_path)
    )
}

/// Returns `true` if a log statement is a registration diagnostic.
#[must_use]
pub fn is_diagnostic_log(text: &str) -> bool {
    DIAGNOSTIC_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Returns `true` if a `type` value names no particular element.
#[must_use]
pub fn is_generic_type(value: &str) -> bool {
    GENERIC_TYPES.contains(&value.trim())
}

/// Renders a full module around `body`.
///
/// `body` holds the literal's remaining fields, each line indented and
/// terminated by a newline; it may be empty.
#[must_use]
pub fn render_module(frame: &ModuleFrame<'_>, body: &str, support: &Support) -> String {
    let id = frame.identifier;
    let mut out = String::with_capacity(body.len() + 512);

    out.push_str(&format!(
        "/**\n * {}\n * Library: {} | Category: {}\n */\n",
        header_safe(frame.label),
        header_safe(frame.library),
        header_safe(frame.category),
    ));
    out.push_str(&render_import(frame.registry));
    out.push('\n');
    for import in &support.imports {
        out.push_str(import);
        out.push('\n');
    }
    out.push('\n');

    if !support.leading.is_empty() {
        out.push_str(&support.leading);
        out.push_str("\n\n");
    }

    let export = if frame.exported || id == DESCRIPTOR_EXPORT {
        "export "
    } else {
        ""
    };
    out.push_str(&format!("{export}const {id} = {{\n"));
    out.push_str(&format!("  type: {},\n", quote_js(id)));
    out.push_str(&format!("  library: {},\n", quote_js(frame.library)));
    out.push_str(&format!("  category: {},\n", quote_js(frame.category)));
    out.push_str(&format!("  label: {},\n", quote_js(frame.label)));
    out.push_str(body);
    out.push_str("};\n\n");

    if !support.trailing.is_empty() {
        out.push_str(&support.trailing);
        out.push_str("\n\n");
    }

    if id != DESCRIPTOR_EXPORT {
        out.push_str(&format!("export const {DESCRIPTOR_EXPORT} = {id};\n"));
    }
    out.push_str(&format!("export default {id};\n\n"));
    out.push_str(&render_registration(&frame.registry.receiver, id));
    out.push('\n');
    out.push_str(&render_diagnostic(frame.library, frame.category, id));
    out.push('\n');
    out
}

fn header_safe(text: &str) -> String {
    text.replace("*/", "* /").replace('\n', " ")
}
