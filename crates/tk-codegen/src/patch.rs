//! Registration patching.
//!
//! [`patch_text`] rewrites a module so that it carries exactly one
//! `<receiver>.register(<declared identifier>);` call followed by exactly one
//! canonical diagnostic line, and imports the registry. Everything else is
//! left in place. The rewrite converges: patching its own output returns the
//! same text.
//!
//! # Examples
//!
//! ```
//! use tk_codegen::{PatchContext, patch_text};
//! use tk_core::{CategoryMap, RegistryConfig};
//!
//! let registry = RegistryConfig::default();
//! let categories = CategoryMap::default();
//! let ctx = PatchContext::new("circuittikz", "vsource", &categories, &registry);
//!
//! let text = "const vsource = {\n  icon: 'V',\n};\n\nelementRegistry.register('circuittikz:vsource', vsource);\n";
//! let patched = patch_text(text, &ctx)?;
//! assert!(patched.contains("elementRegistry.register(vsource);\nconsole.log('✔ [circuittikz] sources/vsource');\n"));
//! assert_eq!(patch_text(&patched, &ctx)?, patched);
//! # Ok::<(), tk_codegen::CodegenError>(())
//! ```

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tk_core::{
    CategoryMap, Config, FxHashMap, Library, Outcome, RegistryConfig, ReportEntry, Stage,
    StageReport, types::file_identifier,
};
use tk_layout::ModuleWalker;
use tk_source::{CodeMap, Segment, SegmentKind, Termination, literals_in, segments_in};
use tracing::{debug, info, warn};

use crate::{
    error::CodegenError,
    module::{
        is_diagnostic_log, is_generic_type, render_diagnostic, render_import, render_registration,
    },
    select::{ModuleSelector, NOT_AN_ELEMENT},
};

/// Where a module lives, for filling in diagnostic fields its literal lacks.
#[derive(Debug, Clone, Copy)]
pub struct PatchContext<'a> {
    /// Library the module belongs to.
    pub library: &'a str,
    /// File identifier of the module.
    pub file_id: &'a str,
    /// Category lookup.
    pub categories: &'a CategoryMap,
    /// Registry wiring.
    pub registry: &'a RegistryConfig,
}

impl<'a> PatchContext<'a> {
    /// Creates a new context.
    #[must_use]
    pub const fn new(
        library: &'a str,
        file_id: &'a str,
        categories: &'a CategoryMap,
        registry: &'a RegistryConfig,
    ) -> Self {
        Self {
            library,
            file_id,
            categories,
            registry,
        }
    }
}

/// Rewrites the registration statements of a module.
///
/// The declared identifier is the first top-level object-literal binding.
/// Every top-level registration on the configured receiver collapses into a
/// single canonical call at the position of the first one that follows the
/// binding; without one, the call goes after the last `export default` (or
/// the binding itself). Known diagnostic lines are replaced by one canonical
/// line right after the call. Runs of blank lines collapse to one.
///
/// # Errors
///
/// Returns [`CodegenError::NoDeclaredIdentifier`] if the module binds no
/// object literal, and [`CodegenError::UnbalancedLiteral`] if the literal's
/// brackets never balance. The text is not rewritten in either case.
pub fn patch_text(text: &str, ctx: &PatchContext<'_>) -> Result<String, CodegenError> {
    let map = CodeMap::new(text);
    let literal = literals_in(&map)
        .next()
        .ok_or(CodegenError::NoDeclaredIdentifier)?;
    if literal.termination == Termination::Heuristic {
        return Err(CodegenError::UnbalancedLiteral {
            identifier: literal.identifier.to_owned(),
        });
    }

    let declared = literal.identifier;
    let library = literal.string_field("library").unwrap_or(ctx.library);
    let category = literal
        .string_field("category")
        .unwrap_or_else(|| ctx.categories.category_for(ctx.file_id));
    let type_name = literal
        .string_field("type")
        .filter(|value| !is_generic_type(value))
        .unwrap_or(declared);

    let receiver = ctx.registry.receiver.as_str();
    let segments = segments_in(&map);
    let is_registration = |segment: &Segment<'_>| {
        matches!(segment.kind, SegmentKind::Registration { receiver: r } if r == receiver)
    };
    let is_dropped = |segment: &Segment<'_>| {
        is_registration(segment)
            || (segment.kind == SegmentKind::Log && is_diagnostic_log(segment.text))
    };

    let binding = segments
        .iter()
        .position(|segment| segment.span.contains(&literal.statement.start))
        .unwrap_or(0);
    let anchor = segments
        .iter()
        .enumerate()
        .skip(binding + 1)
        .find(|&(_, segment)| is_registration(segment))
        .map(|(index, _)| index)
        .unwrap_or_else(|| {
            segments
                .iter()
                .rposition(|segment| {
                    matches!(
                        segment.kind,
                        SegmentKind::ExportDefault | SegmentKind::DescriptorAlias { .. }
                    )
                })
                .map_or(binding, |index| index.max(binding))
        });

    let import_at = if segments
        .iter()
        .any(|segment| segment.kind == SegmentKind::Import && segment.mentions(receiver))
    {
        None
    } else {
        segments
            .iter()
            .position(|segment| !matches!(segment.kind, SegmentKind::Blank | SegmentKind::Comment))
    };

    let canonical = format!(
        "{}\n{}\n",
        render_registration(receiver, declared),
        render_diagnostic(library, category, type_name)
    );

    let mut out = String::with_capacity(text.len() + canonical.len() + 64);
    for (index, segment) in segments.iter().enumerate() {
        if import_at == Some(index) {
            out.push_str(&render_import(ctx.registry));
            out.push('\n');
            if segment.kind != SegmentKind::Import {
                out.push('\n');
            }
        }

        let dropped = is_dropped(segment);
        if index == anchor {
            if !dropped {
                out.push_str(segment.text);
                end_line(&mut out);
                push_blank(&mut out);
            }
            end_line(&mut out);
            out.push_str(&canonical);
        } else if dropped {
            if segment.ends_line() {
                end_line(&mut out);
            }
        } else if segment.kind == SegmentKind::Blank {
            push_blank(&mut out);
        } else {
            out.push_str(segment.text);
        }
    }

    end_line(&mut out);
    while out.ends_with("\n\n") {
        out.pop();
    }
    Ok(out)
}

/// Terminates the current line, if one is open.
fn end_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Adds a blank line unless the output already ends with one.
fn push_blank(out: &mut String) {
    if !out.is_empty() && !out.ends_with("\n\n") {
        out.push('\n');
    }
}

/// Patches module files on disk.
#[derive(Debug, Clone)]
pub struct Patcher {
    registry: RegistryConfig,
    categories: CategoryMap,
    /// Library name by directory.
    libraries: FxHashMap<Utf8PathBuf, String>,
    selector: ModuleSelector,
}

impl Patcher {
    /// Creates a patcher with no known libraries or exclusions.
    #[must_use]
    pub fn new(registry: RegistryConfig, categories: CategoryMap) -> Self {
        Self {
            selector: ModuleSelector::new(&categories, &registry),
            registry,
            categories,
            libraries: FxHashMap::default(),
        }
    }

    /// Creates a patcher for the configured libraries.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        config.libraries().into_iter().fold(
            Self::new(config.registry.clone(), config.categories.clone())
                .with_selector(ModuleSelector::from_config(config)),
            |patcher, library| patcher.with_library(&library),
        )
    }

    /// Replaces the element selector.
    #[must_use]
    pub fn with_selector(mut self, selector: ModuleSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Registers a library directory.
    #[must_use]
    pub fn with_library(mut self, library: &Library) -> Self {
        self.libraries
            .insert(library.dir.clone(), library.name.clone());
        self
    }

    /// Library name for a module path.
    ///
    /// Unknown directories fall back to the directory's own name.
    #[must_use]
    pub fn library_for<'p>(&'p self, path: &'p Utf8Path) -> &'p str {
        let parent = path.parent();
        parent
            .and_then(|dir| self.libraries.get(dir))
            .map(String::as_str)
            .or_else(|| parent.and_then(Utf8Path::file_name))
            .unwrap_or_default()
    }

    /// Patches one file, returning whether it changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written, or if
    /// [`patch_text`] refuses it. The file is untouched on error.
    pub fn patch_file(&self, path: &Utf8Path) -> Result<bool, CodegenError> {
        let text = fs::read_to_string(path).map_err(|err| CodegenError::read(path, err))?;
        let file_id = file_identifier(path).unwrap_or_default();
        let ctx = PatchContext::new(self.library_for(path), file_id, &self.categories, &self.registry);

        let patched = patch_text(&text, &ctx)?;
        if patched == text {
            return Ok(false);
        }
        fs::write(path, patched).map_err(|err| CodegenError::write(path, err))?;
        Ok(true)
    }

    /// Patches one element module, reporting the outcome.
    ///
    /// Files that are not element modules are skipped untouched.
    pub fn patch(&self, path: &Utf8Path) -> ReportEntry {
        let entry = match self
            .selector
            .is_element(path)
            .and_then(|element| element.then(|| self.patch_file(path)).transpose())
        {
            Ok(None) => {
                ReportEntry::new(Stage::Patch, path, Outcome::Skipped).with_detail(NOT_AN_ELEMENT)
            }
            Ok(Some(true)) => ReportEntry::new(Stage::Patch, path, Outcome::Written),
            Ok(Some(false)) => ReportEntry::new(Stage::Patch, path, Outcome::Unchanged),
            Err(err) => {
                warn!(path = %path, error = %err, "left module unpatched");
                return ReportEntry::new(Stage::Patch, path, Outcome::Failed)
                    .with_detail(err.to_string());
            }
        };
        debug!(path = %path, outcome = entry.outcome.label(), "patched module");
        entry
    }

    /// Patches every module directly inside `dir`, skipping the index file.
    pub fn patch_dir(&self, dir: &Utf8Path) -> StageReport {
        let mut report = StageReport::new(Stage::Patch);
        let walker = match ModuleWalker::new(dir) {
            Ok(walker) => walker
                .with_max_depth(Some(1))
                .with_skip_files(&[self.registry.index_file.as_str()]),
            Err(_) => {
                report.push(
                    ReportEntry::new(Stage::Patch, dir, Outcome::Skipped)
                        .with_detail("directory not found"),
                );
                return report;
            }
        };

        info!(dir = %dir, "patching registrations");
        match walker.collect_paths() {
            Ok(paths) => {
                for path in paths {
                    report.push(self.patch(&path));
                }
            }
            Err(err) => {
                warn!(dir = %dir, error = %err, "failed to list modules");
                report.push(
                    ReportEntry::new(Stage::Patch, dir, Outcome::Failed)
                        .with_detail(err.to_string()),
                );
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const AMMETER: &str = "import { elementRegistry } from '../elementRegistry.js';

        const ammeter = {
        id: 'circuittikz:ammeter',
        type: 'elemento',
  label: 'Ammeter',
        codeGenerator(element) {
            return `\\\\draw (${element.x1},${element.y1}) to[ammeter] (${element.x2},${element.y2});`;
        }
        };


        elementRegistry.register(ammeter);
console.log(\"✅ ammeter registrado\");

        export default ammeter;
";

    fn patch(text: &str, library: &str, file_id: &str) -> Result<String, CodegenError> {
        let registry = RegistryConfig::default();
        let categories = CategoryMap::default();
        patch_text(text, &PatchContext::new(library, file_id, &categories, &registry))
    }

    #[test]
    fn test_replaces_legacy_diagnostic() {
        let patched = patch(AMMETER, "circuittikz", "ammeter").unwrap();
        assert!(patched.contains(
            "        };\n\nelementRegistry.register(ammeter);\nconsole.log('✔ [circuittikz] bipoles/ammeter');\n\n        export default ammeter;\n"
        ));
        assert!(!patched.contains("registrado"));
        assert!(!patched.contains("\n\n\n"));
        assert_eq!(patch(&patched, "circuittikz", "ammeter").unwrap(), patched);
    }

    #[test]
    fn test_diagnostic_tag_from_type_or_identifier() {
        let named = "const node = {\n  type: 'label',\n};\n";
        assert!(patch(named, "tikz", "node").unwrap().contains("'✔ [tikz] shapes/label'"));

        let generic = "const fuse = {\n  type: 'element',\n};\n";
        assert!(patch(generic, "circuittikz", "fuse").unwrap().contains("'✔ [circuittikz] bipoles/fuse'"));
    }

    #[test]
    fn test_repairs_broken_registrations() {
        let text = "import { elementRegistry } from '../elementRegistry.js';\n\nconst vsource = {\n  icon: 'V',\n};\n\nelementRegistry.register('circuittikz:vsource', vsource);\nelementRegistry.register(element);\nelementRegistry.register();\n";
        let patched = patch(text, "circuittikz", "vsource").unwrap();
        assert_eq!(patched.matches(".register(").count(), 1);
        assert!(patched.ends_with(
            "};\n\nelementRegistry.register(vsource);\nconsole.log('✔ [circuittikz] sources/vsource');\n"
        ));
    }

    #[test]
    fn test_adds_missing_registration_and_import() {
        let text = "// src/libs/tikz/circle.js\n\n/**\n * Circle\n */\n\nexport const descriptor = {\n  type: \"circle\",\n  category: \"shapes\",\n}\n\nconsole.log(\"✔ [tikz] shapes/circle\")\n";
        let patched = patch(text, "tikz", "circle").unwrap();
        insta::assert_snapshot!(patched, @r#"
        // src/libs/tikz/circle.js

        /**
         * Circle
         */

        import { elementRegistry } from '../elementRegistry.js';

        export const descriptor = {
          type: "circle",
          category: "shapes",
        }

        elementRegistry.register(descriptor);
        console.log('✔ [tikz] shapes/circle');
        "#);
        assert_eq!(patch(&patched, "tikz", "circle").unwrap(), patched);
    }

    #[test]
    fn test_registration_after_export_default() {
        let text = "const lamp = {\n  icon: 'L',\n};\nexport default lamp;\n";
        let patched = patch(text, "circuittikz", "lamp").unwrap();
        assert!(patched.ends_with(
            "export default lamp;\n\nelementRegistry.register(lamp);\nconsole.log('✔ [circuittikz] other/lamp');\n"
        ));
        assert!(patched.starts_with("import { elementRegistry } from '../elementRegistry.js';\n\nconst lamp"));
    }

    #[test]
    fn test_same_line_statements_split() {
        let text = "const fuse = { icon: 'F' };\nelementRegistry.register(fuse); console.log('✅ fuse registered');\nexport default fuse;\n";
        let patched = patch(text, "circuittikz", "fuse").unwrap();
        assert!(patched.contains(
            "elementRegistry.register(fuse);\nconsole.log('✔ [circuittikz] bipoles/fuse');\nexport default fuse;\n"
        ));
        assert_eq!(patch(&patched, "circuittikz", "fuse").unwrap(), patched);
    }

    #[test]
    fn test_other_receivers_untouched() {
        let text = "const node = { icon: 'N' };\nplugins.register(node);\n";
        let patched = patch(text, "tikz", "node").unwrap();
        assert!(patched.contains("plugins.register(node);\n"));
        assert!(patched.contains("elementRegistry.register(node);\n"));
    }

    #[test]
    fn test_refuses_without_literal() {
        let err = patch("export default function build() {}\n", "tikz", "build").unwrap_err();
        assert!(matches!(err, CodegenError::NoDeclaredIdentifier));
    }

    #[test]
    fn test_refuses_unbalanced_literal() {
        let text = "const broken = {\n  icon: 'B',\n  render() {\n\nelementRegistry.register(broken);\n";
        let err = patch(text, "tikz", "broken").unwrap_err();
        assert!(matches!(err, CodegenError::UnbalancedLiteral { .. }));
    }

    #[test]
    fn test_patcher_reports_outcomes() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let lib = root.join("circuittikz");
        fs::create_dir_all(&lib).unwrap();
        fs::write(lib.join("ammeter.js"), AMMETER).unwrap();
        fs::write(lib.join("helpers.js"), "export function noop() {}\n").unwrap();
        fs::write(lib.join("ground.js"), "export function ground() {}\n").unwrap();
        fs::write(lib.join("index.js"), "import './ammeter.js';\n").unwrap();

        let patcher = Patcher::new(RegistryConfig::default(), CategoryMap::default())
            .with_library(&Library::new("circuittikz", lib.clone()));
        let report = patcher.patch_dir(&lib);
        assert_eq!(report.entries.len(), 3);
        assert_eq!(
            report.entry_for(&lib.join("ammeter.js")).map(|e| e.outcome),
            Some(Outcome::Written)
        );
        assert_eq!(
            report.entry_for(&lib.join("helpers.js")).map(|e| e.outcome),
            Some(Outcome::Skipped)
        );
        assert_eq!(
            report.entry_for(&lib.join("ground.js")).map(|e| e.outcome),
            Some(Outcome::Failed)
        );
        assert_eq!(
            fs::read_to_string(lib.join("helpers.js")).unwrap(),
            "export function noop() {}\n"
        );

        let again = patcher.patch_dir(&lib);
        assert_eq!(again.summary().changed, 0);
    }

    #[test]
    fn test_library_fallback_to_dir_name() {
        let patcher = Patcher::new(RegistryConfig::default(), CategoryMap::default());
        assert_eq!(patcher.library_for(Utf8Path::new("src/libs/extra/a.js")), "extra");
    }

    #[test]
    fn test_missing_dir_skipped() {
        let patcher = Patcher::new(RegistryConfig::default(), CategoryMap::default());
        let report = patcher.patch_dir(Utf8Path::new("/nonexistent/lib"));
        assert_eq!(report.entries[0].outcome, Outcome::Skipped);
    }
}
