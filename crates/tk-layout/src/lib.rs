//! Idempotent directory normalization for element libraries.
//!
//! This crate owns every filesystem reorganization the migration performs:
//!
//! - [`TreeNormalizer`] creates target directories, applies planned
//!   relocations, and writes stubs, never overwriting an existing file
//! - [`flatten_library`] moves nested modules to their library root
//! - [`ModuleWalker`] lists module files with `.gitignore` support
//!
//! # Examples
//!
//! ```no_run
//! use camino::Utf8Path;
//! use tk_layout::{ModuleWalker, relocate};
//!
//! let entry = relocate(
//!     Utf8Path::new("src/services/code/codeParser.js"),
//!     Utf8Path::new("src/services/code/codeParser.legacy.js"),
//! );
//! println!("{entry}");
//!
//! let modules = ModuleWalker::new(Utf8Path::new("src/libs/tikz"))?.collect_paths()?;
//! # Ok::<(), tk_layout::LayoutError>(())
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
mod normalize;
mod walker;

pub use error::LayoutError;
pub use normalize::{TreeNormalizer, ensure_stub, flatten_library, relocate};
pub use walker::ModuleWalker;
