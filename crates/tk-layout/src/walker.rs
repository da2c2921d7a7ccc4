//! Directory traversal for element modules.
//!
//! [`ModuleWalker`] uses the `ignore` crate to walk a library directory while
//! respecting `.gitignore` patterns and skipping hidden entries (backup
//! directories included).
//!
//! # Examples
//!
//! ```ignore
//! use tk_layout::ModuleWalker;
//! use camino::Utf8Path;
//!
//! let walker = ModuleWalker::new(Utf8Path::new("src/libs/circuittikz"))?
//!     .with_max_depth(Some(1))
//!     .with_skip_files(&["index.js"]);
//! for path in walker.collect_paths()? {
//!     println!("{path}");
//! }
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use tk_core::types::MODULE_EXTENSION;

use crate::error::LayoutError;

/// Directories never descended into.
const SKIP_DIRECTORIES: &[&str] = &["node_modules", "dist", "build", ".git", "coverage"];

/// Walks a directory tree for element module files.
#[derive(Debug)]
pub struct ModuleWalker {
    /// The directory to walk.
    root: Utf8PathBuf,
    /// File names to leave out.
    skip_files: Vec<String>,
    /// Maximum depth below the root, `None` for unlimited.
    max_depth: Option<usize>,
    /// Whether to follow symbolic links.
    follow_links: bool,
}

impl ModuleWalker {
    /// Creates a walker for an existing directory.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::MissingDirectory`] if `root` is not a directory.
    pub fn new(root: &Utf8Path) -> Result<Self, LayoutError> {
        if !root.is_dir() {
            return Err(LayoutError::MissingDirectory(root.to_owned()));
        }
        Ok(Self {
            root: root.to_owned(),
            skip_files: Vec::new(),
            max_depth: None,
            follow_links: false,
        })
    }

    /// Adds file names to leave out.
    #[must_use]
    pub fn with_skip_files(mut self, names: &[&str]) -> Self {
        self.skip_files.extend(names.iter().map(ToString::to_string));
        self
    }

    /// Limits how deep the walk goes; `Some(1)` lists only direct children.
    #[must_use]
    pub const fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Configures whether to follow symbolic links.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Collects module files, sorted by path.
    pub fn collect_paths(&self) -> Result<Vec<Utf8PathBuf>, LayoutError> {
        let mut paths = Vec::new();
        for result in self.build_walker() {
            let entry = result?;
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = to_utf8(entry.path())?;
            if !is_module_file(path) || self.is_skipped_file(path) || self.in_skipped_dir(path) {
                continue;
            }
            paths.push(path.to_owned());
        }
        paths.sort();
        Ok(paths)
    }

    /// Collects subdirectories below the root, deepest first.
    pub fn collect_dirs(&self) -> Result<Vec<Utf8PathBuf>, LayoutError> {
        let mut dirs = Vec::new();
        for result in self.build_walker() {
            let entry = result?;
            if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                continue;
            }
            let path = to_utf8(entry.path())?;
            if !self.in_skipped_dir(path) {
                dirs.push(path.to_owned());
            }
        }
        dirs.sort_by(|a, b| {
            b.components()
                .count()
                .cmp(&a.components().count())
                .then_with(|| a.cmp(b))
        });
        Ok(dirs)
    }

    fn build_walker(&self) -> ignore::Walk {
        WalkBuilder::new(&self.root)
            .standard_filters(true)
            .follow_links(self.follow_links)
            .max_depth(self.max_depth)
            .threads(1)
            .require_git(false)
            .build()
    }

    fn is_skipped_file(&self, path: &Utf8Path) -> bool {
        path.file_name()
            .is_some_and(|name| self.skip_files.iter().any(|skip| skip == name))
    }

    fn in_skipped_dir(&self, path: &Utf8Path) -> bool {
        path.strip_prefix(&self.root).is_ok_and(|relative| {
            relative
                .components()
                .any(|component| SKIP_DIRECTORIES.contains(&component.as_str()))
        })
    }
}

fn to_utf8(path: &std::path::Path) -> Result<&Utf8Path, LayoutError> {
    Utf8Path::from_path(path).ok_or_else(|| LayoutError::NonUtf8Path(path.to_owned()))
}

fn is_module_file(path: &Utf8Path) -> bool {
    path.extension() == Some(MODULE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    fn touch(path: &Utf8Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_missing_directory() {
        let err = ModuleWalker::new(Utf8Path::new("/nonexistent/libs")).unwrap_err();
        assert!(matches!(err, LayoutError::MissingDirectory(_)));
    }

    #[test]
    fn test_collects_modules_recursively() {
        let dir = TempDir::new().unwrap();
        let root = utf8_root(&dir);
        touch(&root.join("resistor.js"));
        touch(&root.join("nested/capacitor.js"));
        touch(&root.join("nested/readme.md"));
        touch(&root.join("node_modules/dep/x.js"));
        touch(&root.join(".backup-1/old.js"));

        let paths = ModuleWalker::new(&root).unwrap().collect_paths().unwrap();
        let relative: Vec<_> = paths
            .iter()
            .map(|p| p.strip_prefix(&root).unwrap().as_str().to_owned())
            .collect();
        assert_eq!(relative, vec!["nested/capacitor.js", "resistor.js"]);
    }

    #[test]
    fn test_flat_listing_with_skip() {
        let dir = TempDir::new().unwrap();
        let root = utf8_root(&dir);
        touch(&root.join("index.js"));
        touch(&root.join("lamp.js"));
        touch(&root.join("deep/fuse.js"));

        let paths = ModuleWalker::new(&root)
            .unwrap()
            .with_max_depth(Some(1))
            .with_skip_files(&["index.js"])
            .collect_paths()
            .unwrap();
        assert_eq!(paths, vec![root.join("lamp.js")]);
    }

    #[test]
    fn test_dirs_deepest_first() {
        let dir = TempDir::new().unwrap();
        let root = utf8_root(&dir);
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir_all(root.join("d")).unwrap();

        let dirs = ModuleWalker::new(&root).unwrap().collect_dirs().unwrap();
        assert_eq!(
            dirs,
            vec![root.join("a/b/c"), root.join("a/b"), root.join("a"), root.join("d")]
        );
    }
}
