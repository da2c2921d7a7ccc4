//! Core types, errors, and configuration for the tk-migrate tool.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - Error types for configuration loading
//! - Configuration structures (layout plan, libraries, registry binding)
//! - Domain types (`Library`, `CategoryMap`, `SpecTable`, run reports)
//! - Type aliases for `FxHashMap`/`FxHashSet` (faster than std)

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hash;
mod templates;
pub mod types;

pub use config::{
    Config, ConvertConfig, ElementsConfig, GenerateConfig, LayoutConfig, LibraryConfig,
    RegistryConfig, RelocationRule, StubRule,
};
pub use error::ConfigError;
pub use hash::{FxHashMap, FxHashSet, fx_hash_map, fx_hash_set};
pub use types::{
    CategoryMap, ElementSpec, Library, Outcome, ReportEntry, ReportSummary, RunReport,
    SourceLocation, SpecTable, Stage, StageReport,
};
