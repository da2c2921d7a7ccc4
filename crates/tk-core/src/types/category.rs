//! Category lookup for element modules.
//!
//! The [`CategoryMap`] maps a file identifier (the module's file stem, e.g.
//! `capacitor_polar`) to the semantic category the host editor groups it
//! under. Identifiers missing from the table resolve to the fallback.

use serde::{Deserialize, Serialize};

use crate::FxHashMap;

/// Category assigned to identifiers that are not in the table.
pub const DEFAULT_FALLBACK_CATEGORY: &str = "other";

/// Built-in table, grouped by category.
const BUILTIN_CATEGORIES: &[(&str, &[&str])] = &[
    ("shapes", &["circle", "ellipse", "line", "node", "rectangle"]),
    (
        "bipoles",
        &[
            "ammeter",
            "capacitor",
            "capacitor_polar",
            "diode",
            "euroresistor",
            "fuse",
            "inductor",
            "npn",
            "pnj",
            "potentiometer",
            "relay_spdt",
            "resistor",
            "switch_closed",
            "thermistor",
            "usresistor",
            "zener",
        ],
    ),
    ("sources", &["isource", "vsource"]),
    ("symbols", &["ground", "opamp"]),
];

/// Static mapping from file identifier to category tag.
///
/// # Examples
///
/// ```
/// use tk_core::CategoryMap;
///
/// let map = CategoryMap::default();
/// assert_eq!(map.category_for("vsource"), "sources");
/// assert_eq!(map.category_for("mystery"), "other");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryMap {
    /// File identifier to category.
    pub entries: FxHashMap<String, String>,

    /// Category for identifiers not present in `entries`.
    pub fallback: String,
}

impl CategoryMap {
    /// Creates an empty map with the given fallback category.
    #[must_use]
    pub fn empty(fallback: impl Into<String>) -> Self {
        Self {
            entries: FxHashMap::default(),
            fallback: fallback.into(),
        }
    }

    /// Adds or replaces a mapping, returning `self` for chaining.
    #[must_use]
    pub fn with(mut self, file_id: impl Into<String>, category: impl Into<String>) -> Self {
        self.entries.insert(file_id.into(), category.into());
        self
    }

    /// Resolves the category for a file identifier.
    #[must_use]
    pub fn category_for(&self, file_id: &str) -> &str {
        self.entries
            .get(file_id)
            .map_or(self.fallback.as_str(), String::as_str)
    }

    /// Returns `true` if the identifier has an explicit mapping.
    #[inline]
    #[must_use]
    pub fn contains(&self, file_id: &str) -> bool {
        self.entries.contains_key(file_id)
    }

    /// Number of explicit mappings.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no explicit mappings.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        let mut map = Self::empty(DEFAULT_FALLBACK_CATEGORY);
        for (category, ids) in BUILTIN_CATEGORIES {
            for id in *ids {
                map.entries.insert((*id).to_owned(), (*category).to_owned());
            }
        }
        map
    }
}
