//! Error types for the tk-codegen crate.

use camino::Utf8PathBuf;
use tk_core::ConfigError;
use tk_layout::LayoutError;

/// Errors that can occur while converting, generating, or patching modules.
///
/// # Error Recovery Strategy
///
/// - **Layout errors** ([`CodegenError::Layout`]): Fatal only for a missing root
/// - **Everything else**: Reported for the affected file, the run continues
///
/// # Examples
///
/// ```
/// use tk_codegen::CodegenError;
///
/// let err = CodegenError::NoDeclaredIdentifier;
/// assert!(err.is_recoverable());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// The module binds no top-level object literal.
    #[error("no declared identifier: the module binds no top-level object literal")]
    NoDeclaredIdentifier,

    /// The declared literal's brackets never balance.
    #[error("object literal '{identifier}' has unbalanced brackets")]
    UnbalancedLiteral {
        /// Declared identifier of the literal.
        identifier: String,
    },

    /// A table key cannot be used as a binding name.
    #[error("'{name}' is not a valid identifier")]
    InvalidIdentifier {
        /// The rejected name.
        name: String,
    },

    /// Failed to read a module.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The path of the module.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a module or backup.
    #[error("failed to write {path}: {source}")]
    Write {
        /// The path being written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to render a defaults block.
    #[error("failed to serialize defaults: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Tree walking or layout failure.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Configuration or specification table failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CodegenError {
    /// Creates a new [`CodegenError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`CodegenError::Write`] error.
    #[inline]
    pub fn write(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
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
        match self {
            Self::Layout(err) => err.is_fatal(),
            _ => false,
        }
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Read { path, .. } | Self::Write { path, .. } => Some(path),
            Self::Layout(err) => err.path(),
            _ => None,
        }
    }
}
