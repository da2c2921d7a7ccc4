//! Conversion of legacy element modules to the canonical frame.
//!
//! A module already exporting `descriptor` is left alone. Anything else is
//! backed up, then rewritten through [`synthesize`]: the first object-literal
//! binding supplies the identifier and body, other imports and statements
//! are carried over, and old registrations, diagnostics, and default exports
//! are replaced by the frame's own.

use std::{
    fs,
    time::{SystemTime, UNIX_EPOCH},
};

use camino::{Utf8Path, Utf8PathBuf};
use tk_core::{
    CategoryMap, Config, Library, Outcome, RegistryConfig, ReportEntry, Stage, StageReport,
    types::file_identifier,
};
use tk_layout::ModuleWalker;
use tk_source::{
    CodeMap, ObjectLiteral, Segment, SegmentKind, Termination, has_descriptor_export, label_for,
    literals_in, segments_in,
};
use tracing::{debug, info, warn};

use crate::{
    error::CodegenError,
    module::{Support, is_diagnostic_log},
    select::{ModuleSelector, NOT_AN_ELEMENT},
    synthesize::{SynthesisInput, synthesize},
};

/// What happened to a converted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Already canonical; not touched.
    Canonical,
    /// Rewritten from a recovered literal.
    Converted,
    /// No usable literal; rewritten with a placeholder body.
    Placeholder,
    /// Not an element module; not touched.
    NotElement,
}

/// Rewrites module text, returning `None` if it is already canonical.
///
/// # Examples
///
/// ```
/// use tk_codegen::convert_text;
/// use tk_core::{CategoryMap, RegistryConfig};
///
/// let registry = RegistryConfig::default();
/// let categories = CategoryMap::default();
/// let text = "const fuse = {\n  type: 'elemento',\n  icon: 'F',\n};\nelementRegistry.register(fuse);\n";
///
/// let (converted, _) = convert_text(text, "fuse", "circuittikz", &categories, &registry).unwrap();
/// assert!(converted.contains("  type: 'fuse',\n"));
/// assert!(convert_text(&converted, "fuse", "circuittikz", &categories, &registry).is_none());
/// ```
#[must_use]
pub fn convert_text(
    text: &str,
    file_id: &str,
    library: &str,
    categories: &CategoryMap,
    registry: &RegistryConfig,
) -> Option<(String, Conversion)> {
    if has_descriptor_export(text) {
        return None;
    }

    let map = CodeMap::new(text);
    let literal = literals_in(&map).next();
    let body = literal.as_ref().and_then(usable_body);
    let identifier = literal.as_ref().map(|literal| literal.identifier);
    let label = identifier.map(label_for);
    let support = collect_support(&map, literal.as_ref(), &registry.receiver);

    let mut input = SynthesisInput::new(file_id, library, categories.category_for(file_id), registry)
        .with_support(support);
    if let Some(label) = &label {
        input = input.with_label(label);
    }
    let conversion = match (literal.as_ref(), body) {
        (Some(literal), Some(body)) => {
            input = input.with_literal(literal.identifier, body, literal.exported);
            Conversion::Converted
        }
        (Some(literal), None) => {
            input = input.with_identifier(literal.identifier);
            Conversion::Placeholder
        }
        (None, _) => Conversion::Placeholder,
    };

    Some((synthesize(&input), conversion))
}

/// The literal body, if it can be embedded safely.
///
/// A heuristically terminated literal is usable only when its text, with or
/// without the trailing closing brace, balances on its own.
fn usable_body<'a>(literal: &ObjectLiteral<'a>) -> Option<&'a str> {
    if literal.termination == Termination::Balanced {
        return Some(literal.body);
    }
    let trimmed = literal.body.trim_end();
    let without_close = trimmed
        .strip_suffix(';')
        .unwrap_or(trimmed)
        .trim_end()
        .strip_suffix('}');
    [Some(literal.body), without_close]
        .into_iter()
        .flatten()
        .find(|body| CodeMap::new(body).is_balanced())
}

/// Gathers the statements that survive conversion.
fn collect_support(map: &CodeMap<'_>, literal: Option<&ObjectLiteral<'_>>, receiver: &str) -> Support {
    let text = map.text();
    let statement = literal.map(|literal| literal.statement.clone());
    let mut support = Support::default();
    let mut leading = Vec::new();
    let mut trailing = Vec::new();
    let mut seen_code = false;
    let mut past_binding = false;
    let mut gap = false;

    for segment in segments_in(map) {
        if statement
            .as_ref()
            .is_some_and(|range| range.start < segment.span.end && segment.span.start < range.end)
        {
            past_binding = true;
            gap = false;
            continue;
        }

        match segment.kind {
            SegmentKind::Blank => {
                gap = true;
                continue;
            }
            SegmentKind::Comment if !seen_code => continue,
            SegmentKind::Import => {
                seen_code = true;
                if !segment.mentions(receiver) {
                    support.imports.push(piece(text, &segment).to_owned());
                }
                continue;
            }
            _ => seen_code = true,
        }
        if is_replaced(&segment, receiver) {
            continue;
        }

        let pieces = if past_binding {
            &mut trailing
        } else {
            &mut leading
        };
        if gap && !pieces.is_empty() {
            pieces.push("");
        }
        pieces.push(piece(text, &segment));
        gap = false;
    }

    support.leading = leading.join("\n");
    support.trailing = trailing.join("\n");
    support
}

/// Segments the canonical frame supersedes.
fn is_replaced(segment: &Segment<'_>, receiver: &str) -> bool {
    match segment.kind {
        SegmentKind::Registration { receiver: r } => r == receiver,
        SegmentKind::Log => is_diagnostic_log(segment.text),
        SegmentKind::ExportDefault | SegmentKind::DescriptorAlias { .. } => true,
        _ => false,
    }
}

/// Segment text without trailing whitespace; leading whitespace is kept only
/// when the segment starts a line.
fn piece<'a>(text: &str, segment: &Segment<'a>) -> &'a str {
    let starts_line = segment.span.start == 0 || text.as_bytes()[segment.span.start - 1] == b'\n';
    if starts_line {
        segment.text.trim_end()
    } else {
        segment.text.trim()
    }
}

/// Converts module files on disk, backing up originals first.
#[derive(Debug, Clone)]
pub struct Converter {
    registry: RegistryConfig,
    categories: CategoryMap,
    root: Utf8PathBuf,
    backup_dir: Option<Utf8PathBuf>,
    selector: ModuleSelector,
}

impl Converter {
    /// Creates a converter without backups or exclusions.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>, registry: RegistryConfig, categories: CategoryMap) -> Self {
        Self {
            selector: ModuleSelector::new(&categories, &registry),
            registry,
            categories,
            root: root.into(),
            backup_dir: None,
        }
    }

    /// Creates a converter from configuration.
    ///
    /// With backups enabled, originals go to `<root>/<prefix>-<unix seconds>/`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let converter = Self::new(
            config.root.clone(),
            config.registry.clone(),
            config.categories.clone(),
        )
        .with_selector(ModuleSelector::from_config(config));
        if config.convert.backup {
            let stamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |elapsed| elapsed.as_secs());
            let dir = config
                .root
                .join(format!("{}-{stamp}", config.convert.backup_dir_prefix));
            converter.with_backup_dir(dir)
        } else {
            converter
        }
    }

    /// Sets where originals are copied before rewriting.
    #[must_use]
    pub fn with_backup_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.backup_dir = Some(dir.into());
        self
    }

    /// Replaces the element selector.
    #[must_use]
    pub fn with_selector(mut self, selector: ModuleSelector) -> Self {
        self.selector = selector;
        self
    }

    /// The backup directory, if backups are enabled.
    #[inline]
    #[must_use]
    pub fn backup_dir(&self) -> Option<&Utf8Path> {
        self.backup_dir.as_deref()
    }

    /// Converts one file, reporting the outcome.
    pub fn convert_file(&self, path: &Utf8Path, library: &Library) -> ReportEntry {
        match self.try_convert(path, library) {
            Ok(conversion) => {
                let entry = match conversion {
                    Conversion::Canonical => ReportEntry::new(Stage::Convert, path, Outcome::Unchanged)
                        .with_detail("already canonical"),
                    Conversion::Converted => ReportEntry::new(Stage::Convert, path, Outcome::Written),
                    Conversion::Placeholder => {
                        warn!(path = %path, "no usable object literal, wrote placeholder");
                        ReportEntry::new(Stage::Convert, path, Outcome::Fallback)
                            .with_detail("no usable object literal, wrote placeholder")
                    }
                    Conversion::NotElement => ReportEntry::new(Stage::Convert, path, Outcome::Skipped)
                        .with_detail(NOT_AN_ELEMENT),
                };
                debug!(path = %path, outcome = entry.outcome.label(), "converted module");
                entry
            }
            Err(err) => {
                warn!(path = %path, error = %err, "failed to convert module");
                ReportEntry::new(Stage::Convert, path, Outcome::Failed).with_detail(err.to_string())
            }
        }
    }

    fn try_convert(&self, path: &Utf8Path, library: &Library) -> Result<Conversion, CodegenError> {
        let text = fs::read_to_string(path).map_err(|err| CodegenError::read(path, err))?;
        let file_id = file_identifier(path).unwrap_or_default();
        if !self.selector.is_element_text(file_id, &text) {
            return Ok(Conversion::NotElement);
        }
        let Some((converted, conversion)) =
            convert_text(&text, file_id, &library.name, &self.categories, &self.registry)
        else {
            return Ok(Conversion::Canonical);
        };

        self.backup(path)?;
        fs::write(path, converted).map_err(|err| CodegenError::write(path, err))?;
        Ok(conversion)
    }

    fn backup(&self, path: &Utf8Path) -> Result<(), CodegenError> {
        let Some(dir) = &self.backup_dir else {
            return Ok(());
        };
        let relative = path
            .strip_prefix(&self.root)
            .ok()
            .or_else(|| path.file_name().map(Utf8Path::new))
            .unwrap_or(path);
        let dest = dir.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|err| CodegenError::write(parent, err))?;
        }
        fs::copy(path, &dest).map_err(|err| CodegenError::write(&dest, err))?;
        Ok(())
    }

    /// Converts every module directly inside a library directory.
    pub fn convert_library(&self, library: &Library) -> StageReport {
        let mut report = StageReport::new(Stage::Convert);
        let walker = match ModuleWalker::new(&library.dir) {
            Ok(walker) => walker
                .with_max_depth(Some(1))
                .with_skip_files(&[self.registry.index_file.as_str()]),
            Err(_) => {
                report.push(
                    ReportEntry::new(Stage::Convert, &library.dir, Outcome::Skipped)
                        .with_detail("library directory not found"),
                );
                return report;
            }
        };

        info!(library = %library.name, dir = %library.dir, "converting modules");
        match walker.collect_paths() {
            Ok(paths) => {
                for path in paths {
                    report.push(self.convert_file(&path, library));
                }
            }
            Err(err) => {
                warn!(dir = %library.dir, error = %err, "failed to list modules");
                report.push(
                    ReportEntry::new(Stage::Convert, &library.dir, Outcome::Failed)
                        .with_detail(err.to_string()),
                );
            }
        }
        report
    }
}
