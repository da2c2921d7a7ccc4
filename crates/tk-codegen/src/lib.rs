//! Module conversion, generation, and registration patching.
//!
//! Every module this crate writes uses one canonical frame (see
//! [`render_module`]), so converted and generated modules are already in
//! the form the [`Patcher`] produces.
//!
//! - [`synthesize`] builds a canonical module from whatever a legacy module
//!   yields, falling back to a placeholder body
//! - [`Converter`] rewrites legacy modules on disk, backing them up first
//! - [`generate`] renders one module per [`SpecTable`](tk_core::SpecTable) entry
//! - [`patch_text`] collapses registrations and diagnostics to one canonical
//!   pair
//! - [`ModuleSelector`] tells element modules from helpers sharing their
//!   directory
//! - [`Pipeline`] runs normalize, convert, generate, patch, and index in order
//!
//! # Examples
//!
//! ```no_run
//! use tk_codegen::Pipeline;
//! use tk_core::Config;
//!
//! let config = Config::from_json_file(camino::Utf8Path::new("tk-migrate.json"))?;
//! let report = Pipeline::new(config).run()?;
//! for stage in &report.stages {
//!     for entry in &stage.entries {
//!         println!("{entry}");
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod catalog;
mod convert;
pub mod error;
mod generate;
mod index;
mod module;
mod patch;
mod pipeline;
mod select;
mod synthesize;

pub use catalog::builtin_table;
pub use convert::{Conversion, Converter, convert_text};
pub use error::CodegenError;
pub use generate::{GeneratedModule, GenerationWriter, RenderTemplate, generate, generate_module};
pub use index::{IndexWriter, render_index};
pub use module::{
    DESCRIPTOR_EXPORT, IDENTITY_KEYS, ModuleFrame, Support, is_diagnostic_log, is_generic_type,
    render_diagnostic, render_import, render_module, render_registration,
};
pub use patch::{PatchContext, Patcher, patch_text};
pub use pipeline::Pipeline;
pub use select::{ModuleSelector, NOT_AN_ELEMENT};
pub use synthesize::{SynthesisInput, synthesize};
