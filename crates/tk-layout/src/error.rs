//! Error types for the tk-layout crate.

use camino::Utf8PathBuf;

/// Errors that can occur while walking or reorganizing the tree.
///
/// # Error Recovery Strategy
///
/// - **Missing root** ([`LayoutError::MissingRoot`]): Fatal - abort before any mutation
/// - **Everything else**: Report for the affected file or directory, continue the run
///
/// # Examples
///
/// ```
/// use tk_layout::LayoutError;
/// use camino::Utf8PathBuf;
///
/// let err = LayoutError::MissingRoot(Utf8PathBuf::from("/app/src/services"));
/// assert!(err.is_fatal());
/// assert!(err.to_string().contains("/app/src/services"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// The project (or services) root does not exist.
    #[error("root directory not found: {0} (run from the project root)")]
    MissingRoot(Utf8PathBuf),

    /// A directory to walk does not exist.
    #[error("directory not found: {0}")]
    MissingDirectory(Utf8PathBuf),

    /// A filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The path the operation was applied to.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to walk a directory.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),
}

impl LayoutError {
    /// Creates a new [`LayoutError::Io`] error.
    #[inline]
    pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the run can continue past this error.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    /// Returns `true` if the run must stop.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingRoot(_))
    }

    /// Returns the path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::MissingRoot(path) | Self::MissingDirectory(path) | Self::Io { path, .. } => {
                Some(path)
            }
            Self::Walk(_) | Self::NonUtf8Path(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_missing_root_is_fatal() {
        let err = LayoutError::MissingRoot(Utf8PathBuf::from("src/services"));
        assert!(err.is_fatal());
        assert!(!err.is_recoverable());
        assert_eq!(err.path().map(|p| p.as_str()), Some("src/services"));
    }

    #[test]
    fn test_io_error_is_recoverable() {
        let err = LayoutError::io(
            "src/libs/tikz/circle.js",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("src/libs/tikz/circle.js"));
    }

    #[test]
    fn test_non_utf8_path() {
        use std::path::PathBuf;
        let err = LayoutError::NonUtf8Path(PathBuf::from("test"));
        assert!(err.is_recoverable());
        assert!(err.path().is_none());
    }
}
