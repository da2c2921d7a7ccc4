//! Structured run reports.
//!
//! Every pipeline stage returns a [`StageReport`] listing one [`ReportEntry`]
//! per file or planned operation. Presentation (text lines, JSON) is left to
//! the caller.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Directory layout, relocations, and stubs.
    Normalize,
    /// Conversion of existing modules into descriptors.
    Convert,
    /// Batch generation from a specification table.
    Generate,
    /// Registration statement repair.
    Patch,
    /// Registry index emission.
    Index,
}

impl Stage {
    /// Returns a human-readable label for this stage.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normalize => "Normalize",
            Self::Convert => "Convert",
            Self::Generate => "Generate",
            Self::Patch => "Patch",
            Self::Index => "Index",
        }
    }
}

/// Result of one file-level operation.
///
/// # Examples
///
/// ```
/// use tk_core::Outcome;
///
/// assert!(Outcome::Moved.is_change());
/// assert!(Outcome::Fallback.is_failure());
/// assert!(!Outcome::Conflict.is_change());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Outcome {
    /// A directory or file was created.
    Created,
    /// A file was relocated.
    Moved,
    /// An empty directory was pruned.
    Removed,
    /// A file's content was (re)written.
    Written,
    /// Nothing to do; the target was already in the desired state.
    Unchanged,
    /// A planned operation was skipped because its input is missing.
    Skipped,
    /// The destination already exists; it was left untouched.
    Conflict,
    /// No definition could be recovered; a placeholder was written instead.
    Fallback,
    /// The operation failed; the file was left as it was.
    Failed,
}

impl Outcome {
    /// Returns `true` if the filesystem was modified.
    #[inline]
    #[must_use]
    pub const fn is_change(self) -> bool {
        matches!(
            self,
            Self::Created | Self::Moved | Self::Removed | Self::Written | Self::Fallback
        )
    }

    /// Returns `true` if the outcome should be reported as a failure.
    #[inline]
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Fallback | Self::Failed)
    }

    /// Returns a short marker used in line-oriented output.
    #[inline]
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Created | Self::Written => "✔",
            Self::Moved => "→",
            Self::Removed => "✖",
            Self::Unchanged => "·",
            Self::Skipped | Self::Conflict => "ℹ",
            Self::Fallback => "⚠",
            Self::Failed => "❌",
        }
    }

    /// Returns a human-readable label for this outcome.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Moved => "moved",
            Self::Removed => "removed",
            Self::Written => "written",
            Self::Unchanged => "unchanged",
            Self::Skipped => "skipped",
            Self::Conflict => "conflict",
            Self::Fallback => "fallback",
            Self::Failed => "failed",
        }
    }
}

/// One line of a stage report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Stage that produced the entry.
    pub stage: Stage,
    /// File or directory the entry refers to.
    pub path: Utf8PathBuf,
    /// What happened.
    pub outcome: Outcome,
    /// Optional explanation (destination of a move, error message, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ReportEntry {
    /// Creates an entry without detail.
    #[must_use]
    pub fn new(stage: Stage, path: impl Into<Utf8PathBuf>, outcome: Outcome) -> Self {
        Self {
            stage,
            path: path.into(),
            outcome,
            detail: None,
        }
    }

    /// Attaches a detail message.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:<9} {}", self.outcome.marker(), self.outcome.label(), self.path)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// Counts of outcomes within a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of entries.
    pub total: usize,
    /// Entries that modified the filesystem.
    pub changed: usize,
    /// Entries that needed no work.
    pub unchanged: usize,
    /// Entries skipped for a missing input.
    pub skipped: usize,
    /// Entries blocked by an existing destination.
    pub conflicts: usize,
    /// Entries reported as failures (including placeholder fallbacks).
    pub failures: usize,
}

impl ReportSummary {
    fn record(&mut self, outcome: Outcome) {
        self.total += 1;
        if outcome.is_change() {
            self.changed += 1;
        }
        if outcome.is_failure() {
            self.failures += 1;
        }
        match outcome {
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Conflict => self.conflicts += 1,
            _ => {}
        }
    }

    fn merge(&mut self, other: Self) {
        self.total += other.total;
        self.changed += other.changed;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
        self.conflicts += other.conflicts;
        self.failures += other.failures;
    }
}

/// Entries produced by one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    /// The stage.
    pub stage: Stage,
    /// Entries in the order operations ran.
    pub entries: Vec<ReportEntry>,
}

impl StageReport {
    /// Creates an empty report for a stage.
    #[must_use]
    pub const fn new(stage: Stage) -> Self {
        Self {
            stage,
            entries: Vec::new(),
        }
    }

    /// Records an outcome for a path.
    pub fn record(&mut self, path: impl Into<Utf8PathBuf>, outcome: Outcome) -> &mut ReportEntry {
        self.push(ReportEntry::new(self.stage, path, outcome));
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    /// Appends a pre-built entry.
    pub fn push(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    /// Appends all entries of another report.
    pub fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Returns the first entry for `path`, if any.
    #[must_use]
    pub fn entry_for(&self, path: &Utf8Path) -> Option<&ReportEntry> {
        self.entries.iter().find(|entry| entry.path == path)
    }

    /// Returns the entries with the given outcome.
    pub fn with_outcome(&self, outcome: Outcome) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(move |entry| entry.outcome == outcome)
    }

    /// Summarizes the entries.
    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for entry in &self.entries {
            summary.record(entry.outcome);
        }
        summary
    }
}

/// Reports of a full pipeline run, in stage order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// One report per executed stage.
    pub stages: Vec<StageReport>,
}

impl RunReport {
    /// Appends a stage report.
    pub fn push(&mut self, report: StageReport) {
        self.stages.push(report);
    }

    /// Returns the report of a stage, if it ran.
    #[must_use]
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|report| report.stage == stage)
    }

    /// Summarizes all stages together.
    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for report in &self.stages {
            summary.merge(report.summary());
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_classification() {
        assert!(Outcome::Created.is_change());
        assert!(Outcome::Written.is_change());
        assert!(!Outcome::Unchanged.is_change());
        assert!(!Outcome::Skipped.is_failure());
        assert!(Outcome::Failed.is_failure());
        assert!(!Outcome::Failed.is_change());
    }

    #[test]
    fn test_outcome_serialization() {
        insta::assert_snapshot!(serde_json::to_string(&Outcome::Conflict).unwrap(), @r#""conflict""#);
        insta::assert_snapshot!(serde_json::to_string(&Stage::Normalize).unwrap(), @r#""normalize""#);
    }

    #[test]
    fn test_stage_summary() {
        let mut report = StageReport::new(Stage::Normalize);
        report.record("a", Outcome::Created);
        report.record("b", Outcome::Conflict).detail = Some("exists".to_owned());
        report.record("c", Outcome::Unchanged);
        report.record("d", Outcome::Fallback);

        let summary = report.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.changed, 2);
        assert_eq!(summary.conflicts, 1);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.failures, 1);
        assert_eq!(report.with_outcome(Outcome::Conflict).count(), 1);
    }

    #[test]
    fn test_run_summary_merges_stages() {
        let mut normalize = StageReport::new(Stage::Normalize);
        normalize.record("a", Outcome::Moved);
        let mut patch = StageReport::new(Stage::Patch);
        patch.record("b", Outcome::Failed);

        let mut run = RunReport::default();
        run.push(normalize);
        run.push(patch);

        let summary = run.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.changed, 1);
        assert_eq!(summary.failures, 1);
        assert!(run.stage(Stage::Patch).is_some());
        assert!(run.stage(Stage::Index).is_none());
    }

    #[test]
    fn test_entry_display() {
        let entry = ReportEntry::new(Stage::Normalize, "libs/capacitor.js", Outcome::Conflict)
            .with_detail("destination exists");
        let line = entry.to_string();
        assert!(line.starts_with("ℹ conflict"));
        assert!(line.ends_with("libs/capacitor.js (destination exists)"));
    }
}
