//! Idempotent tree normalization.
//!
//! The [`TreeNormalizer`] brings a project tree into the target layout:
//!
//! 1. Target directories are created when absent
//! 2. Planned relocations move files that exist to destinations that do not
//! 3. Stubs are written for paths that are entirely absent
//! 4. Library directories are flattened and emptied subdirectories pruned
//!
//! Nothing is ever overwritten or deleted apart from empty directories.
//! Running the normalizer twice leaves the tree as the first run left it.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use tk_core::{Config, LayoutConfig, Library, Outcome, ReportEntry, Stage, StageReport};
use tracing::{debug, info, warn};

use crate::error::LayoutError;
use crate::walker::ModuleWalker;

/// Applies a layout plan to a project tree.
///
/// # Examples
///
/// ```no_run
/// use tk_core::Config;
/// use tk_layout::TreeNormalizer;
///
/// let config = Config::default().with_root("/path/to/project");
/// let report = TreeNormalizer::from_config(&config).run()?;
/// for entry in &report.entries {
///     println!("{entry}");
/// }
/// # Ok::<(), tk_layout::LayoutError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TreeNormalizer {
    services_root: Utf8PathBuf,
    layout: LayoutConfig,
    libraries: Vec<Library>,
}

impl TreeNormalizer {
    /// Creates a normalizer for an explicit services root and library set.
    #[must_use]
    pub fn new(
        services_root: impl Into<Utf8PathBuf>,
        layout: LayoutConfig,
        libraries: Vec<Library>,
    ) -> Self {
        Self {
            services_root: services_root.into(),
            layout,
            libraries,
        }
    }

    /// Creates a normalizer from the resolved configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.services_root(), config.layout.clone(), config.libraries())
    }

    /// The services root all layout paths are relative to.
    #[inline]
    #[must_use]
    pub fn services_root(&self) -> &Utf8Path {
        &self.services_root
    }

    /// Fails with [`LayoutError::MissingRoot`] if the services root is absent.
    pub fn check_root(&self) -> Result<(), LayoutError> {
        if self.services_root.is_dir() {
            Ok(())
        } else {
            Err(LayoutError::MissingRoot(self.services_root.clone()))
        }
    }

    /// Runs the whole plan.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::MissingRoot`] before touching anything if the
    /// services root does not exist. Every other problem is reported per
    /// entry.
    pub fn run(&self) -> Result<StageReport, LayoutError> {
        self.check_root()?;
        info!(root = %self.services_root, "normalizing layout");

        let mut report = self.ensure_layout();
        for rule in &self.layout.relocations {
            let entry = relocate(
                &self.services_root.join(&rule.from),
                &self.services_root.join(&rule.to),
            );
            report.push(entry);
        }
        for stub in &self.layout.stubs {
            report.push(ensure_stub(&self.services_root.join(&stub.path), &stub.body));
        }
        for library in &self.libraries {
            report.extend(flatten_library(library));
        }

        let summary = report.summary();
        info!(
            changed = summary.changed,
            conflicts = summary.conflicts,
            skipped = summary.skipped,
            failures = summary.failures,
            "layout normalized"
        );
        Ok(report)
    }

    /// Creates the target directories that do not exist yet.
    pub fn ensure_layout(&self) -> StageReport {
        let mut report = StageReport::new(Stage::Normalize);
        for dir in &self.layout.directories {
            let path = self.services_root.join(dir);
            let entry = if path.is_dir() {
                ReportEntry::new(Stage::Normalize, path, Outcome::Unchanged)
            } else if path.exists() {
                ReportEntry::new(Stage::Normalize, path, Outcome::Conflict)
                    .with_detail("exists and is not a directory")
            } else {
                match fs::create_dir_all(&path) {
                    Ok(()) => ReportEntry::new(Stage::Normalize, path, Outcome::Created),
                    Err(err) => failed(&path, err),
                }
            };
            log_entry(&entry);
            report.push(entry);
        }
        report
    }
}

/// Moves `source` to `dest` unless `dest` already exists.
///
/// - missing source: [`Outcome::Skipped`]
/// - existing destination: [`Outcome::Conflict`], both files untouched
/// - otherwise: [`Outcome::Moved`], parent directories of `dest` created
pub fn relocate(source: &Utf8Path, dest: &Utf8Path) -> ReportEntry {
    let entry = if !source.is_file() {
        ReportEntry::new(Stage::Normalize, source, Outcome::Skipped).with_detail("source not found")
    } else if dest.exists() {
        ReportEntry::new(Stage::Normalize, source, Outcome::Conflict)
            .with_detail(format!("{dest} already exists, kept both"))
    } else {
        match move_file(source, dest) {
            Ok(()) => ReportEntry::new(Stage::Normalize, source, Outcome::Moved)
                .with_detail(format!("→ {dest}")),
            Err(err) => failed(source, err),
        }
    };
    log_entry(&entry);
    entry
}

/// Writes `body` to `path` only if `path` does not exist.
pub fn ensure_stub(path: &Utf8Path, body: &str) -> ReportEntry {
    let entry = if path.exists() {
        ReportEntry::new(Stage::Normalize, path, Outcome::Unchanged)
    } else {
        let written = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(path, body));
        match written {
            Ok(()) => ReportEntry::new(Stage::Normalize, path, Outcome::Created).with_detail("stub"),
            Err(err) => failed(path, err),
        }
    };
    log_entry(&entry);
    entry
}

/// Moves every module nested below a library directory to the library root
/// and prunes subdirectories left empty.
pub fn flatten_library(library: &Library) -> StageReport {
    let mut report = StageReport::new(Stage::Normalize);
    let walker = match ModuleWalker::new(&library.dir) {
        Ok(walker) => walker,
        Err(err) => {
            report.record(&library.dir, Outcome::Skipped).detail = Some(err.to_string());
            return report;
        }
    };
    debug!(library = %library.name, dir = %library.dir, "flattening library");

    match walker.collect_paths() {
        Ok(paths) => {
            for path in paths.iter().filter(|path| !library.is_flat(path)) {
                if let Some(dest) = library.flat_destination(path) {
                    report.push(relocate(path, &dest));
                }
            }
        }
        Err(err) => {
            warn!(dir = %library.dir, error = %err, "failed to walk library");
            report.record(&library.dir, Outcome::Failed).detail = Some(err.to_string());
            return report;
        }
    }

    match walker.collect_dirs() {
        Ok(dirs) => {
            for dir in dirs {
                if is_empty_dir(&dir) {
                    let entry = match fs::remove_dir(&dir) {
                        Ok(()) => ReportEntry::new(Stage::Normalize, dir, Outcome::Removed)
                            .with_detail("empty directory"),
                        Err(err) => failed(&dir, err),
                    };
                    log_entry(&entry);
                    report.push(entry);
                }
            }
        }
        Err(err) => {
            warn!(dir = %library.dir, error = %err, "failed to list subdirectories");
        }
    }
    report
}

/// Renames `source` to `dest`, falling back to copy-then-remove across
/// filesystems.
fn move_file(source: &Utf8Path, dest: &Utf8Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::rename(source, dest).is_ok() {
        return Ok(());
    }
    fs::copy(source, dest)?;
    fs::remove_file(source)
}

fn is_empty_dir(dir: &Utf8Path) -> bool {
    fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_none())
}

fn failed(path: &Utf8Path, err: io::Error) -> ReportEntry {
    ReportEntry::new(Stage::Normalize, path, Outcome::Failed)
        .with_detail(LayoutError::io(path, err).to_string())
}

fn log_entry(entry: &ReportEntry) {
    if entry.outcome.is_failure() {
        warn!(path = %entry.path, detail = ?entry.detail, "normalize failed");
    } else {
        debug!(path = %entry.path, outcome = entry.outcome.label(), "normalize");
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use tk_core::{RelocationRule, StubRule};

    use super::*;

    fn project() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    fn write(path: &Utf8Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    /// Snapshot of every file below `root` with its contents, sorted.
    fn tree(root: &Utf8Path) -> Vec<(String, String)> {
        let mut out = Vec::new();
        let mut stack = vec![root.to_owned()];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(&dir).unwrap() {
                let path = Utf8PathBuf::from_path_buf(entry.unwrap().path()).unwrap();
                if path.is_dir() {
                    out.push((path.strip_prefix(root).unwrap().to_string(), "<dir>".to_owned()));
                    stack.push(path);
                } else {
                    let contents = fs::read_to_string(&path).unwrap();
                    out.push((path.strip_prefix(root).unwrap().to_string(), contents));
                }
            }
        }
        out.sort();
        out
    }

    fn config(root: &Utf8Path) -> Config {
        Config::default().with_root(root)
    }

    #[test]
    fn test_missing_root_aborts_without_mutation() {
        let (_dir, root) = project();
        let err = TreeNormalizer::from_config(&config(&root)).run().unwrap_err();
        assert!(matches!(err, LayoutError::MissingRoot(_)));
        assert!(tree(&root).is_empty());
    }

    #[test]
    fn test_default_plan() {
        let (_dir, root) = project();
        write(&root.join("src/services/code/codeParser.js"), "legacy parser");
        write(&root.join("src/services/code/generateProjectCode.js"), "gen");

        let report = TreeNormalizer::from_config(&config(&root)).run().unwrap();

        let services = root.join("src/services");
        assert!(services.join("code/parsers").is_dir());
        assert!(services.join("elements").is_dir());
        assert_eq!(
            fs::read_to_string(services.join("code/codeParser.legacy.js")).unwrap(),
            "legacy parser"
        );
        assert!(!services.join("code/codeParser.js").exists());
        assert!(services.join("code/generators/generateProjectCode.js").is_file());
        assert!(services.join("code/parsers/parseTikz.js").is_file());

        let skipped = report.entry_for(&services.join("code/codePrettyPrinter.js")).unwrap();
        assert_eq!(skipped.outcome, Outcome::Skipped);
        assert_eq!(report.with_outcome(Outcome::Moved).count(), 2);
        assert_eq!(report.summary().failures, 0);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let (_dir, root) = project();
        write(&root.join("src/services/code/codePrettyPrinter.js"), "pretty");
        write(&root.join("src/libs/circuittikz/nested/resistor.js"), "r");
        let normalizer = TreeNormalizer::from_config(&config(&root));

        normalizer.run().unwrap();
        let first = tree(&root);
        let second_report = normalizer.run().unwrap();

        assert_eq!(tree(&root), first);
        assert_eq!(second_report.summary().changed, 0);
        assert_eq!(second_report.summary().failures, 0);
    }

    #[test]
    fn test_relocate_conflict_preserves_both() {
        let (_dir, root) = project();
        let source = root.join("code/codeParser.js");
        let dest = root.join("code/codeParser.legacy.js");
        write(&source, "new");
        write(&dest, "hand edited");

        let entry = relocate(&source, &dest);

        assert_eq!(entry.outcome, Outcome::Conflict);
        assert_eq!(fs::read_to_string(&source).unwrap(), "new");
        assert_eq!(fs::read_to_string(&dest).unwrap(), "hand edited");
    }

    #[test]
    fn test_relocate_creates_parents() {
        let (_dir, root) = project();
        let source = root.join("a.js");
        write(&source, "a");
        let dest = root.join("x/y/a.js");

        assert_eq!(relocate(&source, &dest).outcome, Outcome::Moved);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "a");
    }

    #[test]
    fn test_stub_never_overwrites() {
        let (_dir, root) = project();
        let path = root.join("code/parsers/parseTikz.js");
        write(&path, "// partial work");

        let entry = ensure_stub(&path, "export function parseTikz() {}");

        assert_eq!(entry.outcome, Outcome::Unchanged);
        assert_eq!(fs::read_to_string(&path).unwrap(), "// partial work");
    }

    #[test]
    fn test_flat_reorganization() {
        let (_dir, root) = project();
        let lib = Library::new("circuittikz", root.join("libs"));
        write(&root.join("libs/nested/resistor.js"), "resistor");

        let report = flatten_library(&lib);

        assert_eq!(fs::read_to_string(root.join("libs/resistor.js")).unwrap(), "resistor");
        assert!(!root.join("libs/nested/resistor.js").exists());
        assert!(!root.join("libs/nested").exists());
        assert_eq!(report.with_outcome(Outcome::Removed).count(), 1);
    }

    #[test]
    fn test_flatten_conflict_preserved() {
        let (_dir, root) = project();
        let lib = Library::new("circuittikz", root.join("libs"));
        write(&root.join("libs/nested/capacitor.js"), "nested version");
        write(&root.join("libs/capacitor.js"), "flat version");

        let report = flatten_library(&lib);

        assert_eq!(
            fs::read_to_string(root.join("libs/nested/capacitor.js")).unwrap(),
            "nested version"
        );
        assert_eq!(fs::read_to_string(root.join("libs/capacitor.js")).unwrap(), "flat version");
        assert_eq!(report.with_outcome(Outcome::Conflict).count(), 1);
        assert_eq!(report.with_outcome(Outcome::Removed).count(), 0);
    }

    #[test]
    fn test_missing_library_is_skipped() {
        let (_dir, root) = project();
        let report = flatten_library(&Library::new("tikz", root.join("missing")));
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].outcome, Outcome::Skipped);
    }

    #[test]
    fn test_custom_plan() {
        let (_dir, root) = project();
        fs::create_dir_all(root.join("svc")).unwrap();
        write(&root.join("svc/old.js"), "old");
        let layout = LayoutConfig {
            services_root: Utf8PathBuf::from("svc"),
            directories: vec![Utf8PathBuf::from("new")],
            relocations: vec![RelocationRule::new("old.js", "new/old.js")],
            stubs: vec![StubRule::new("new/stub.js", "// stub\n")],
        };
        let normalizer = TreeNormalizer::new(root.join("svc"), layout, Vec::new());

        let report = normalizer.run().unwrap();

        assert_eq!(report.entries.len(), 3);
        assert_eq!(fs::read_to_string(root.join("svc/new/old.js")).unwrap(), "old");
        assert_eq!(fs::read_to_string(root.join("svc/new/stub.js")).unwrap(), "// stub\n");
    }
}
