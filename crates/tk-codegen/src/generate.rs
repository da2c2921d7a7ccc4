//! Batch element generation from a specification table.
//!
//! Each table entry becomes one module in the canonical frame, with a fixed
//! property schema, an unconditional `validate`, a render procedure, and a
//! code generator emitting a `\draw ... to[...]` directive.

use std::{fs, io};

use camino::{Utf8Path, Utf8PathBuf};
use tk_core::{
    ElementSpec, Outcome, RegistryConfig, ReportEntry, SpecTable, Stage, StageReport,
    types::MODULE_EXTENSION,
};
use tk_source::{is_js_identifier, label_for, quote_js};
use tracing::{debug, info, warn};

use crate::{
    error::CodegenError,
    module::{ModuleFrame, Support, render_module},
};

const PROPERTY_SCHEMA: &str = "  propertySchema: {
    connection: {
      label: 'Connection',
      fields: {
        x1: { type: 'number', label: 'X1' },
        y1: { type: 'number', label: 'Y1' },
        x2: { type: 'number', label: 'X2' },
        y2: { type: 'number', label: 'Y2' },
      },
    },
    value: {
      label: 'Value',
      fields: {
        value: { type: 'text', label: 'Value' },
      },
    },
    label: {
      label: 'Label',
      fields: {
        label: { type: 'text', label: 'Label' },
      },
    },
  },
  validate(element) {
    return { valid: true };
  },
";

/// Placeholder replaced with the quoted icon.
const ICON_SLOT: &str = "__ICON__";

const GENERIC_RENDER: &str = "  svgRender(element, isSelected, zoom) {
    const stroke = isSelected ? '#3b82f6' : (element.stroke || '#000');
    const strokeWidth = (element.strokeWidth || 0.05) / (zoom || 1);
    const mx = (element.x1 + element.x2) / 2;
    const my = (element.y1 + element.y2) / 2;
    return [
      { tag: 'line', x1: element.x1, y1: element.y1, x2: element.x2, y2: element.y2, stroke, strokeWidth },
      { tag: 'rect', x: mx - 0.3, y: my - 0.15, width: 0.6, height: 0.3, fill: '#fff', stroke, strokeWidth },
      { tag: 'text', x: mx, y: my, text: __ICON__, fontSize: 0.2 },
    ];
  },
";

const RESISTOR_RENDER: &str = "  svgRender(element, isSelected, zoom) {
    const stroke = isSelected ? '#3b82f6' : (element.stroke || '#000');
    const strokeWidth = (element.strokeWidth || 0.05) / (zoom || 1);
    const { x1, y1, x2, y2 } = element;
    const length = Math.hypot(x2 - x1, y2 - y1) || 1;
    const ux = (x2 - x1) / length;
    const uy = (y2 - y1) / length;
    const body = Math.min(0.8, length);
    const lead = (length - body) / 2;
    const points = [[x1, y1], [x1 + ux * lead, y1 + uy * lead]];
    for (let i = 1; i <= 6; i += 1) {
      const t = lead + (body * (i - 0.5)) / 6;
      const side = i % 2 === 0 ? -0.12 : 0.12;
      points.push([x1 + ux * t - uy * side, y1 + uy * t + ux * side]);
    }
    points.push([x2 - ux * lead, y2 - uy * lead], [x2, y2]);
    return [{ tag: 'polyline', points, fill: 'none', stroke, strokeWidth }];
  },
";

const CAPACITOR_RENDER: &str = "  svgRender(element, isSelected, zoom) {
    const stroke = isSelected ? '#3b82f6' : (element.stroke || '#000');
    const strokeWidth = (element.strokeWidth || 0.05) / (zoom || 1);
    const { x1, y1, x2, y2 } = element;
    const length = Math.hypot(x2 - x1, y2 - y1) || 1;
    const ux = (x2 - x1) / length;
    const uy = (y2 - y1) / length;
    const mx = (x1 + x2) / 2;
    const my = (y1 + y2) / 2;
    const gap = 0.08;
    const plate = 0.25;
    const ax = mx - ux * gap;
    const ay = my - uy * gap;
    const bx = mx + ux * gap;
    const by = my + uy * gap;
    return [
      { tag: 'line', x1, y1, x2: ax, y2: ay, stroke, strokeWidth },
      { tag: 'line', x1: bx, y1: by, x2, y2, stroke, strokeWidth },
      { tag: 'line', x1: ax - uy * plate, y1: ay + ux * plate, x2: ax + uy * plate, y2: ay - ux * plate, stroke, strokeWidth },
      { tag: 'line', x1: bx - uy * plate, y1: by + ux * plate, x2: bx + uy * plate, y2: by - ux * plate, stroke, strokeWidth },
    ];
  },
";

/// Render procedure used for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTemplate {
    /// Lead wire with a labelled box.
    Generic,
    /// Zigzag.
    Resistor,
    /// Two parallel plates.
    Capacitor,
}

impl RenderTemplate {
    /// Selects the template for an element name.
    #[must_use]
    pub fn for_element(name: &str) -> Self {
        match name {
            "resistor" => Self::Resistor,
            "capacitor" => Self::Capacitor,
            _ => Self::Generic,
        }
    }

    fn render(self, icon: &str) -> String {
        match self {
            Self::Generic => GENERIC_RENDER.replace(ICON_SLOT, &quote_js(icon)),
            Self::Resistor => RESISTOR_RENDER.to_owned(),
            Self::Capacitor => CAPACITOR_RENDER.to_owned(),
        }
    }
}

/// A rendered module ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    /// Declared identifier (the table key).
    pub identifier: String,
    /// File name inside the output directory.
    pub file_name: String,
    /// Full module text.
    pub text: String,
}

/// Renders one module per table entry, in table order.
///
/// Entries whose name is not a valid identifier are logged and left out; use
/// [`generate_module`] to observe the error.
///
/// # Examples
///
/// ```
/// use tk_codegen::{builtin_table, generate};
/// use tk_core::RegistryConfig;
///
/// let modules = generate(&builtin_table(), &RegistryConfig::default());
/// assert_eq!(modules.len(), 23);
/// assert_eq!(modules[0].file_name, "resistor.js");
/// ```
#[must_use]
pub fn generate(table: &SpecTable, registry: &RegistryConfig) -> Vec<GeneratedModule> {
    table
        .iter()
        .filter_map(|(name, spec)| match generate_module(table, name, spec, registry) {
            Ok(module) => Some(module),
            Err(err) => {
                warn!(element = name, error = %err, "skipping table entry");
                None
            }
        })
        .collect()
}

/// Renders the module for a single entry.
///
/// # Errors
///
/// Returns [`CodegenError::InvalidIdentifier`] if `name` cannot be bound, or
/// [`CodegenError::Serialize`] if the defaults cannot be rendered.
pub fn generate_module(
    table: &SpecTable,
    name: &str,
    spec: &ElementSpec,
    registry: &RegistryConfig,
) -> Result<GeneratedModule, CodegenError> {
    if !is_js_identifier(name) {
        return Err(CodegenError::InvalidIdentifier {
            name: name.to_owned(),
        });
    }

    let label = if spec.label.trim().is_empty() {
        label_for(name)
    } else {
        spec.label.clone()
    };
    let body = render_body(&table.library, name, spec)?;
    let frame = ModuleFrame {
        identifier: name,
        exported: false,
        library: &table.library,
        category: &table.category,
        label: &label,
        registry,
    };

    Ok(GeneratedModule {
        identifier: name.to_owned(),
        file_name: format!("{name}.{MODULE_EXTENSION}"),
        text: render_module(&frame, &body, &Support::default()),
    })
}

fn render_body(library: &str, name: &str, spec: &ElementSpec) -> Result<String, CodegenError> {
    let defaults = serde_json::to_string_pretty(&spec.defaults)?.replace('\n', "\n  ");
    let tikz = quote_js(&spec.tikz);

    let mut body = String::with_capacity(4096);
    body.push_str(&format!("  id: {},\n", quote_js(&format!("{library}:{name}"))));
    body.push_str(&format!("  icon: {},\n", quote_js(&spec.icon)));
    body.push_str(&format!("  defaults: {defaults},\n"));
    body.push_str(PROPERTY_SCHEMA);
    body.push_str(&RenderTemplate::for_element(name).render(&spec.icon));
    body.push_str(&format!(
        "  codeGenerator(element) {{
    const options = [{tikz}];
    if (element.value) {{
      options.push(`l=${{element.value}}`);
    }}
    if (element.label) {{
      options.push(`a=${{element.label}}`);
    }}
    return `\\\\draw (${{element.x1}},${{element.y1}}) to[${{options.join(', ')}}] (${{element.x2}},${{element.y2}});`;
  }},
"
    ));
    Ok(body)
}

/// Writes generated modules into an output directory.
///
/// Existing files are never replaced unless overwriting is enabled.
#[derive(Debug, Clone)]
pub struct GenerationWriter {
    dir: Utf8PathBuf,
    overwrite: bool,
}

impl GenerationWriter {
    /// Creates a writer for `dir`.
    #[must_use]
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overwrite: false,
        }
    }

    /// Configures whether differing files are replaced.
    #[must_use]
    pub const fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// The output directory.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Writes one module.
    pub fn write(&self, module: &GeneratedModule) -> ReportEntry {
        let path = self.dir.join(&module.file_name);
        let entry = |outcome| ReportEntry::new(Stage::Generate, path.clone(), outcome);

        let result = match fs::read_to_string(&path) {
            Ok(existing) if existing == module.text => Ok(entry(Outcome::Unchanged)),
            Ok(_) if !self.overwrite => Ok(entry(Outcome::Conflict)
                .with_detail("differs from generated output, use --force to overwrite")),
            Ok(_) => fs::write(&path, &module.text)
                .map(|()| entry(Outcome::Written).with_detail("overwritten")),
            Err(err) if err.kind() == io::ErrorKind::NotFound => fs::create_dir_all(&self.dir)
                .and_then(|()| fs::write(&path, &module.text))
                .map(|()| entry(Outcome::Created)),
            Err(err) => Err(err),
        };

        match result {
            Ok(entry) => {
                debug!(path = %entry.path, outcome = entry.outcome.label(), "generated module");
                entry
            }
            Err(err) => {
                let err = CodegenError::write(path.clone(), err);
                warn!(path = %path, error = %err, "failed to write module");
                entry(Outcome::Failed).with_detail(err.to_string())
            }
        }
    }

    /// Renders and writes every entry of `table`.
    pub fn write_table(&self, table: &SpecTable, registry: &RegistryConfig) -> StageReport {
        info!(dir = %self.dir, entries = table.len(), "generating modules");
        let mut report = StageReport::new(Stage::Generate);
        for (name, spec) in table.iter() {
            match generate_module(table, name, spec, registry) {
                Ok(module) => report.push(self.write(&module)),
                Err(err) => {
                    warn!(element = name, error = %err, "skipping table entry");
                    let path = self.dir.join(format!("{name}.{MODULE_EXTENSION}"));
                    report.push(
                        ReportEntry::new(Stage::Generate, path, Outcome::Failed)
                            .with_detail(err.to_string()),
                    );
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use tk_source::{extract_literal, has_descriptor_export};

    use super::*;
    use crate::builtin_table;

    fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    fn resistor() -> GeneratedModule {
        let table = builtin_table();
        generate_module(
            &table,
            "resistor",
            &table.entries["resistor"],
            &RegistryConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_generates_whole_catalog() {
        let modules = generate(&builtin_table(), &RegistryConfig::default());
        assert_eq!(modules.len(), 23);
        for module in &modules {
            assert!(has_descriptor_export(&module.text), "{}", module.identifier);
            let literal = extract_literal(&module.text).unwrap();
            assert_eq!(literal.identifier, module.identifier);
            assert_eq!(literal.string_field("type"), Some(module.identifier.as_str()));
            let registration = format!("elementRegistry.register({});", module.identifier);
            assert_eq!(module.text.matches(&registration).count(), 1);
        }
    }

    #[test]
    fn test_module_fields() {
        let module = resistor();
        let literal = extract_literal(&module.text).unwrap();
        let keys: Vec<_> = literal.fields().iter().filter_map(|f| f.key).collect();
        assert_eq!(
            keys,
            vec![
                "type",
                "library",
                "category",
                "label",
                "id",
                "icon",
                "defaults",
                "propertySchema",
                "validate",
                "svgRender",
                "codeGenerator",
            ]
        );
        assert_eq!(literal.string_field("id"), Some("circuittikz:resistor"));
        assert!(module.text.contains("    \"value\": \"1k\",\n"));
        assert!(module.text.contains("tag: 'polyline'"));
        assert!(module.text.contains("const options = ['R'];"));
        assert!(module.text.contains("return `\\\\draw (${element.x1},${element.y1}) to["));
    }

    #[test]
    fn test_render_template_selection() {
        assert_eq!(RenderTemplate::for_element("resistor"), RenderTemplate::Resistor);
        assert_eq!(RenderTemplate::for_element("capacitor"), RenderTemplate::Capacitor);
        assert_eq!(RenderTemplate::for_element("lamp"), RenderTemplate::Generic);
        assert!(RenderTemplate::Generic.render("💡").contains("text: '💡'"));
    }

    #[test]
    fn test_invalid_identifier_rejected() {
        let table = SpecTable::new("circuittikz")
            .with_entry("relay-spdt", ElementSpec::new("Relay", "K", "relay"))
            .with_entry("relay", ElementSpec::new("", "K", "relay"));
        let registry = RegistryConfig::default();

        let modules = generate(&table, &registry);
        assert_eq!(modules.len(), 1);
        assert!(modules[0].text.contains("label: 'Relay',"));

        let dir = TempDir::new().unwrap();
        let writer = GenerationWriter::new(utf8_root(&dir));
        let report = writer.write_table(&table, &registry);
        assert_eq!(report.summary().failures, 1);
        assert_eq!(report.with_outcome(Outcome::Created).count(), 1);
    }

    #[test]
    fn test_writer_never_overwrites_by_default() {
        let dir = TempDir::new().unwrap();
        let root = utf8_root(&dir);
        let module = resistor();
        let writer = GenerationWriter::new(root.join("out"));

        assert_eq!(writer.write(&module).outcome, Outcome::Created);
        assert_eq!(writer.write(&module).outcome, Outcome::Unchanged);

        let path = root.join("out/resistor.js");
        fs::write(&path, "// edited by hand\n").unwrap();
        assert_eq!(writer.write(&module).outcome, Outcome::Conflict);
        assert_eq!(fs::read_to_string(&path).unwrap(), "// edited by hand\n");

        let forced = writer.clone().with_overwrite(true);
        assert_eq!(forced.write(&module).outcome, Outcome::Written);
        assert_eq!(fs::read_to_string(&path).unwrap(), module.text);
    }
}
