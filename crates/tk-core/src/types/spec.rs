//! Declarative element specification tables.
//!
//! A [`SpecTable`] drives batch generation: every entry becomes one element
//! module. Entry order is preserved so generated output is deterministic.

use std::fs;

use camino::Utf8Path;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Category given to generated elements when a table does not name one.
pub const DEFAULT_TABLE_CATEGORY: &str = "bipole";

/// Library generated elements belong to when a table does not name one.
pub const DEFAULT_TABLE_LIBRARY: &str = "circuittikz";

/// Specification of one generated element.
///
/// `defaults` is emitted verbatim (as JSON) into the module's `defaults` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    /// Human-readable label.
    pub label: String,

    /// Palette icon (a short glyph).
    #[serde(default)]
    pub icon: String,

    /// Circuit drawing tag used in the emitted `to[...]` directive.
    pub tikz: String,

    /// Default geometry and value fields.
    #[serde(default)]
    pub defaults: IndexMap<String, serde_json::Value>,
}

impl ElementSpec {
    /// Creates a spec with no defaults.
    #[must_use]
    pub fn new(label: impl Into<String>, icon: impl Into<String>, tikz: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            icon: icon.into(),
            tikz: tikz.into(),
            defaults: IndexMap::new(),
        }
    }

    /// Adds a default field, returning `self` for chaining.
    #[must_use]
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }
}

/// Mapping from element name to its specification.
///
/// # Examples
///
/// ```
/// use tk_core::{ElementSpec, SpecTable};
///
/// let table = SpecTable::new("circuittikz")
///     .with_entry("resistor", ElementSpec::new("Resistor", "▭", "R"));
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.category, "bipole");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecTable {
    /// Library every generated element belongs to.
    pub library: String,

    /// Category every generated element is filed under.
    pub category: String,

    /// Element name (also the declared identifier) to specification.
    pub entries: IndexMap<String, ElementSpec>,
}

impl Default for SpecTable {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_LIBRARY)
    }
}

impl SpecTable {
    /// Creates an empty table for a library, using the default category.
    #[must_use]
    pub fn new(library: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            category: DEFAULT_TABLE_CATEGORY.to_owned(),
            entries: IndexMap::new(),
        }
    }

    /// Adds an entry, returning `self` for chaining.
    #[must_use]
    pub fn with_entry(mut self, name: impl Into<String>, spec: ElementSpec) -> Self {
        self.entries.insert(name.into(), spec);
        self
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ElementSpec)> {
        self.entries.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Parses a table from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a table from a JSON file.
    pub fn from_json_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_owned()));
        }
        let contents = fs::read_to_string(path.as_std_path())?;
        Self::from_json_str(&contents)
    }
}
