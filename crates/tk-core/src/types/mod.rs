//! Domain types for the tk-migrate tool.
//!
//! # Module Organization
//!
//! - [`category`] - Category lookup table
//! - [`library`] - Element libraries and file identifiers
//! - [`location`] - Source positions
//! - [`report`] - Stage and run reports
//! - [`spec`] - Element specification tables for batch generation
//!
//! All public types are re-exported at this module level and at the crate
//! root:
//!
//! ```
//! use tk_core::types::{CategoryMap, Library, Outcome};
//! use tk_core::{SpecTable, StageReport};
//! ```

mod category;
mod library;
mod location;
mod report;
mod spec;

pub use category::{CategoryMap, DEFAULT_FALLBACK_CATEGORY};
pub use library::{Library, MODULE_EXTENSION, file_identifier};
pub use location::SourceLocation;
pub use report::{Outcome, ReportEntry, ReportSummary, RunReport, Stage, StageReport};
pub use spec::{DEFAULT_TABLE_CATEGORY, DEFAULT_TABLE_LIBRARY, ElementSpec, SpecTable};
