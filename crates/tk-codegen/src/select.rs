//! Element module selection.
//!
//! Library directories also hold helpers (parsers, shared constants). Only
//! element modules are converted, patched, and indexed; everything else is
//! reported as skipped and left as it is.

use std::fs;

use camino::Utf8Path;
use tk_core::{CategoryMap, Config, FxHashSet, RegistryConfig, types::file_identifier};
use tk_source::{SegmentKind, has_descriptor_export, segments};

use crate::error::CodegenError;

/// Report detail for files that are not element modules.
pub const NOT_AN_ELEMENT: &str = "not an element module";

/// Decides which library files are element modules.
///
/// A file is an element when its identifier has a category, or when its
/// text exports `descriptor` or registers with the registry receiver.
/// Excluded identifiers never are.
///
/// # Examples
///
/// ```
/// use tk_codegen::ModuleSelector;
/// use tk_core::{CategoryMap, RegistryConfig};
///
/// let selector = ModuleSelector::new(&CategoryMap::default(), &RegistryConfig::default());
/// assert!(selector.is_element_text("resistor", ""));
/// assert!(!selector.is_element_text("config", "export const TIKZ_CONFIG = {\n  scale: 1,\n};\n"));
/// assert!(selector.is_element_text("lamp", "const lamp = {};\nelementRegistry.register(lamp);\n"));
/// ```
#[derive(Debug, Clone)]
pub struct ModuleSelector {
    categories: CategoryMap,
    receiver: String,
    exclude: FxHashSet<String>,
}

impl ModuleSelector {
    /// Creates a selector with no exclusions.
    #[must_use]
    pub fn new(categories: &CategoryMap, registry: &RegistryConfig) -> Self {
        Self {
            categories: categories.clone(),
            receiver: registry.receiver.clone(),
            exclude: FxHashSet::default(),
        }
    }

    /// Creates a selector from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.categories, &config.registry).with_exclude(&config.elements.exclude)
    }

    /// Adds identifiers that are never elements.
    #[must_use]
    pub fn with_exclude<S: AsRef<str>>(mut self, ids: &[S]) -> Self {
        self.exclude.extend(ids.iter().map(|id| id.as_ref().to_owned()));
        self
    }

    /// Classifies a file from its identifier and text.
    #[must_use]
    pub fn is_element_text(&self, file_id: &str, text: &str) -> bool {
        if self.exclude.contains(file_id) {
            return false;
        }
        if self.categories.contains(file_id) || has_descriptor_export(text) {
            return true;
        }
        segments(text).iter().any(|segment| {
            matches!(segment.kind, SegmentKind::Registration { receiver } if receiver == self.receiver)
        })
    }

    /// Classifies a file on disk, reading it only when the identifier alone
    /// does not decide.
    pub fn is_element(&self, path: &Utf8Path) -> Result<bool, CodegenError> {
        let file_id = file_identifier(path).unwrap_or_default();
        if self.exclude.contains(file_id) {
            return Ok(false);
        }
        if self.categories.contains(file_id) {
            return Ok(true);
        }
        let text = fs::read_to_string(path).map_err(|err| CodegenError::read(path, err))?;
        Ok(self.is_element_text(file_id, &text))
    }
}
