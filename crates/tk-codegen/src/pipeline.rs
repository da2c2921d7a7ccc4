//! End-to-end migration pipeline.
//!
//! Stages run in a fixed order: normalize, convert, generate, patch, index.
//! Each stage can also be run on its own. The only fatal condition is a
//! missing project (or services) root, checked before anything is touched;
//! every other failure is recorded in the report and the run continues.

use camino::Utf8PathBuf;
use tk_core::{
    Config, FxHashSet, Library, Outcome, ReportEntry, RunReport, SpecTable, Stage, StageReport,
};
use tk_layout::{LayoutError, TreeNormalizer};
use tracing::{info, warn};

use crate::{
    catalog::builtin_table, convert::Converter, error::CodegenError, generate::GenerationWriter,
    index::IndexWriter, patch::Patcher,
};

/// Runs migration stages against a configured project.
///
/// # Examples
///
/// ```no_run
/// use tk_codegen::Pipeline;
/// use tk_core::Config;
///
/// let pipeline = Pipeline::new(Config::default().with_root("/path/to/project"));
/// let report = pipeline.run()?;
/// println!("{} changes", report.summary().changed);
/// # Ok::<(), tk_codegen::CodegenError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    /// Creates a pipeline for a configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// The configuration in use.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Fails with a fatal error if the project root is absent.
    pub fn check_root(&self) -> Result<(), CodegenError> {
        if self.config.root.is_dir() {
            Ok(())
        } else {
            Err(LayoutError::MissingRoot(self.config.root.clone()).into())
        }
    }

    /// Brings the tree into the target layout.
    pub fn normalize(&self) -> Result<StageReport, CodegenError> {
        self.check_root()?;
        Ok(TreeNormalizer::from_config(&self.config).run()?)
    }

    /// Converts every configured library.
    pub fn convert(&self) -> Result<StageReport, CodegenError> {
        self.check_root()?;
        let converter = Converter::from_config(&self.config);
        if let Some(dir) = converter.backup_dir() {
            info!(backup = %dir, "backing up converted modules");
        }

        let mut report = StageReport::new(Stage::Convert);
        for library in self.config.libraries() {
            report.extend(converter.convert_library(&library));
        }
        log_summary(&report);
        Ok(report)
    }

    /// Loads the configured specification table, or the built-in one.
    pub fn spec_table(&self) -> Result<SpecTable, CodegenError> {
        match self.config.table_path() {
            Some(path) => Ok(SpecTable::from_json_file(&path)?),
            None => Ok(builtin_table()),
        }
    }

    /// Generates modules from the specification table.
    pub fn generate(&self) -> Result<StageReport, CodegenError> {
        self.check_root()?;
        let table = match self.spec_table() {
            Ok(table) => table,
            Err(err) => {
                warn!(error = %err, "failed to load specification table");
                let path = self.config.table_path().unwrap_or_default();
                let mut report = StageReport::new(Stage::Generate);
                report.push(
                    ReportEntry::new(Stage::Generate, path, Outcome::Failed)
                        .with_detail(err.to_string()),
                );
                return Ok(report);
            }
        };

        let writer = GenerationWriter::new(self.config.generate_dir())
            .with_overwrite(self.config.generate.overwrite);
        let report = writer.write_table(&table, &self.config.registry);
        log_summary(&report);
        Ok(report)
    }

    /// Directories whose modules are patched: every library plus the
    /// generator output, each once.
    #[must_use]
    pub fn module_dirs(&self) -> Vec<Utf8PathBuf> {
        let mut seen = FxHashSet::default();
        self.config
            .libraries()
            .into_iter()
            .map(|library| library.dir)
            .chain(std::iter::once(self.config.generate_dir()))
            .filter(|dir| seen.insert(dir.clone()))
            .collect()
    }

    /// Normalizes registrations in every module directory.
    pub fn patch(&self) -> Result<StageReport, CodegenError> {
        self.check_root()?;
        let patcher = Patcher::from_config(&self.config);
        let mut report = StageReport::new(Stage::Patch);
        for dir in self.module_dirs() {
            report.extend(patcher.patch_dir(&dir));
        }
        log_summary(&report);
        Ok(report)
    }

    /// Rewrites the index module of every module directory.
    pub fn index(&self) -> Result<StageReport, CodegenError> {
        self.check_root()?;
        let writer = IndexWriter::from_config(&self.config);
        let libraries = self.config.libraries();
        let mut report = StageReport::new(Stage::Index);
        for dir in self.module_dirs() {
            let library = libraries
                .iter()
                .find(|library| library.dir == dir)
                .cloned()
                .unwrap_or_else(|| {
                    let name = dir.file_name().unwrap_or_default().to_owned();
                    Library::new(name, dir.clone())
                });
            report.push(writer.write(&library));
        }
        log_summary(&report);
        Ok(report)
    }

    /// Runs every stage in order.
    ///
    /// # Errors
    ///
    /// Returns a fatal error if the project or services root is missing; the
    /// tree is not modified in that case.
    pub fn run(&self) -> Result<RunReport, CodegenError> {
        self.check_root()?;
        info!(root = %self.config.root, "starting migration");

        let mut report = RunReport::default();
        report.push(self.normalize()?);
        report.push(self.convert()?);
        report.push(self.generate()?);
        report.push(self.patch()?);
        report.push(self.index()?);

        let summary = report.summary();
        info!(
            changed = summary.changed,
            conflicts = summary.conflicts,
            failures = summary.failures,
            "migration finished"
        );
        Ok(report)
    }
}

fn log_summary(report: &StageReport) {
    let summary = report.summary();
    info!(
        stage = report.stage.label(),
        total = summary.total,
        changed = summary.changed,
        failures = summary.failures,
        "stage finished"
    );
}
