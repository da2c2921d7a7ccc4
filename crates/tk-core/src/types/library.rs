//! Element libraries.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// A named collection of element modules sharing one flat directory.
///
/// # Examples
///
/// ```
/// use tk_core::Library;
///
/// let lib = Library::new("circuittikz", "/app/src/libs/circuittikz");
/// assert_eq!(lib.module_path("resistor").as_str(), "/app/src/libs/circuittikz/resistor.js");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Library {
    /// Library name, used as the `library` field of every descriptor.
    pub name: String,

    /// Directory holding the library's modules.
    pub dir: Utf8PathBuf,
}

/// Extension of element module files.
pub const MODULE_EXTENSION: &str = "js";

impl Library {
    /// Creates a new library.
    #[must_use]
    pub fn new(name: impl Into<String>, dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
        }
    }

    /// Returns the flat path of the module with the given file identifier.
    #[must_use]
    pub fn module_path(&self, file_id: &str) -> Utf8PathBuf {
        self.dir.join(format!("{file_id}.{MODULE_EXTENSION}"))
    }

    /// Returns the flat destination for a (possibly nested) module path.
    ///
    /// Returns `None` if the path has no file name.
    #[must_use]
    pub fn flat_destination(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        path.file_name().map(|name| self.dir.join(name))
    }

    /// Returns `true` if `path` sits directly inside the library directory.
    #[must_use]
    pub fn is_flat(&self, path: &Utf8Path) -> bool {
        path.parent() == Some(self.dir.as_path())
    }
}

/// Derives the file identifier (file stem) of a module path.
///
/// # Examples
///
/// ```
/// use tk_core::types::file_identifier;
/// use camino::Utf8Path;
///
/// assert_eq!(file_identifier(Utf8Path::new("libs/tikz/circle.js")), Some("circle"));
/// ```
#[must_use]
pub fn file_identifier(path: &Utf8Path) -> Option<&str> {
    path.file_stem().filter(|stem| !stem.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_destination() {
        let lib = Library::new("circuittikz", "root/libs");
        assert_eq!(
            lib.flat_destination(Utf8Path::new("root/libs/nested/resistor.js")),
            Some(Utf8PathBuf::from("root/libs/resistor.js"))
        );
    }

    #[test]
    fn test_is_flat() {
        let lib = Library::new("tikz", "root/libs");
        assert!(lib.is_flat(Utf8Path::new("root/libs/circle.js")));
        assert!(!lib.is_flat(Utf8Path::new("root/libs/deep/circle.js")));
    }

    #[test]
    fn test_file_identifier() {
        assert_eq!(
            file_identifier(Utf8Path::new("a/switch_closed.js")),
            Some("switch_closed")
        );
        assert_eq!(file_identifier(Utf8Path::new("")), None);
    }
}
