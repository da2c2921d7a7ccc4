//! Per-library registry index.
//!
//! Importing a library's index module loads every element module in it, and
//! each of those registers itself on import. Helper modules are left out.

use std::fs;

use tk_core::{CategoryMap, Config, Library, Outcome, RegistryConfig, ReportEntry, Stage};
use tk_layout::ModuleWalker;
use tracing::{debug, warn};

use crate::{error::CodegenError, select::ModuleSelector};

/// Renders the index module for a library.
///
/// # Examples
///
/// ```
/// use tk_codegen::render_index;
///
/// let text = render_index("tikz", &["line.js", "circle.js"]);
/// assert!(text.ends_with("import './circle.js';\nimport './line.js';\n"));
/// ```
#[must_use]
pub fn render_index<S: AsRef<str>>(library: &str, module_files: &[S]) -> String {
    let mut files: Vec<&str> = module_files.iter().map(|file| file.as_ref()).collect();
    files.sort_unstable();
    files.dedup();

    let mut out = format!("/**\n * {library} element index\n * Generated by tk-migrate; do not edit.\n */\n");
    for file in files {
        out.push_str(&format!("import './{file}';\n"));
    }
    out
}

/// Writes library index modules, only when their content changes.
#[derive(Debug, Clone)]
pub struct IndexWriter {
    index_file: String,
    selector: ModuleSelector,
}

impl IndexWriter {
    /// Creates a writer using the configured index file name.
    #[must_use]
    pub fn new(categories: &CategoryMap, registry: &RegistryConfig) -> Self {
        Self {
            index_file: registry.index_file.clone(),
            selector: ModuleSelector::new(categories, registry),
        }
    }

    /// Creates a writer from configuration, honoring element exclusions.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            index_file: config.registry.index_file.clone(),
            selector: ModuleSelector::from_config(config),
        }
    }

    /// Writes the index for one library.
    pub fn write(&self, library: &Library) -> ReportEntry {
        let path = library.dir.join(&self.index_file);
        if !library.dir.is_dir() {
            return ReportEntry::new(Stage::Index, path, Outcome::Skipped)
                .with_detail("library directory not found");
        }

        match self.try_write(library) {
            Ok(outcome) => {
                debug!(path = %path, outcome = outcome.label(), "wrote index");
                ReportEntry::new(Stage::Index, path, outcome)
            }
            Err(err) => {
                warn!(path = %path, error = %err, "failed to write index");
                ReportEntry::new(Stage::Index, path, Outcome::Failed).with_detail(err.to_string())
            }
        }
    }

    fn try_write(&self, library: &Library) -> Result<Outcome, CodegenError> {
        let path = library.dir.join(&self.index_file);
        let modules = ModuleWalker::new(&library.dir)?
            .with_max_depth(Some(1))
            .with_skip_files(&[self.index_file.as_str()])
            .collect_paths()?;
        let mut files = Vec::with_capacity(modules.len());
        for module in &modules {
            if !self.selector.is_element(module)? {
                debug!(path = %module, "left out of index");
                continue;
            }
            if let Some(name) = module.file_name() {
                files.push(name.to_owned());
            }
        }
        let text = render_index(&library.name, &files);

        let outcome = match fs::read_to_string(&path) {
            Ok(existing) if existing == text => return Ok(Outcome::Unchanged),
            Ok(_) => Outcome::Written,
            Err(_) => Outcome::Created,
        };
        fs::write(&path, text).map_err(|err| CodegenError::write(&path, err))?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_render_index() {
        let text = render_index("circuittikz", &["vsource.js", "ammeter.js", "ammeter.js"]);
        insta::assert_snapshot!(text, @r"
        /**
         * circuittikz element index
         * Generated by tk-migrate; do not edit.
         */
        import './ammeter.js';
        import './vsource.js';
        ");
    }

    #[test]
    fn test_writer_only_writes_changes() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        fs::write(root.join("ground.js"), "").unwrap();
        fs::write(root.join("utils.js"), "export const GRID = 10;\n").unwrap();
        let library = Library::new("circuittikz", root.clone());
        let writer = IndexWriter::new(&CategoryMap::default(), &RegistryConfig::default());

        assert_eq!(writer.write(&library).outcome, Outcome::Created);
        assert_eq!(writer.write(&library).outcome, Outcome::Unchanged);

        fs::write(root.join("fuse.js"), "").unwrap();
        assert_eq!(writer.write(&library).outcome, Outcome::Written);
        let index = fs::read_to_string(root.join("index.js")).unwrap();
        assert!(index.ends_with(" */\nimport './fuse.js';\nimport './ground.js';\n"));
        assert!(!index.contains("index.js"));
        assert!(!index.contains("utils.js"));
    }

    #[test]
    fn test_missing_library_skipped() {
        let writer = IndexWriter::new(&CategoryMap::default(), &RegistryConfig::default());
        let entry = writer.write(&Library::new("tikz", "/nonexistent/tikz"));
        assert_eq!(entry.outcome, Outcome::Skipped);
    }
}
