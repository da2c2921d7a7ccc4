//! Configuration structures for the tk-migrate tool.
//!
//! - [`LayoutConfig`] - Target directories, relocations, and stubs under the services root
//! - [`LibraryConfig`] - Element libraries and their directories
//! - [`RegistryConfig`] - How modules bind to the element registry
//! - [`ConvertConfig`] - Converter behavior (backups)
//! - [`GenerateConfig`] - Batch generator output
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`] with the built-in migration
//! plan. Relative paths are resolved against [`Config::root`].

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::templates;
use crate::types::{CategoryMap, Library};
use crate::{FxHashSet, fx_hash_set};

/// A planned file move, relative to the services root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelocationRule {
    /// Current location.
    pub from: Utf8PathBuf,
    /// Target location.
    pub to: Utf8PathBuf,
}

impl RelocationRule {
    /// Creates a new rule.
    #[must_use]
    pub fn new(from: impl Into<Utf8PathBuf>, to: impl Into<Utf8PathBuf>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// A file created with a fixed body when absent, relative to the services root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StubRule {
    /// Location of the stub.
    pub path: Utf8PathBuf,
    /// Content written when the file does not exist.
    pub body: String,
}

impl StubRule {
    /// Creates a new rule.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            body: body.into(),
        }
    }
}

/// Directory reorganization plan.
///
/// # Examples
///
/// ```
/// use tk_core::LayoutConfig;
///
/// let layout = LayoutConfig::default();
/// assert_eq!(layout.services_root, "src/services");
/// assert_eq!(layout.stubs.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Services directory, relative to the project root.
    pub services_root: Utf8PathBuf,

    /// Directories that must exist under the services root.
    pub directories: Vec<Utf8PathBuf>,

    /// Moves applied in order.
    pub relocations: Vec<RelocationRule>,

    /// Stub files created when absent.
    pub stubs: Vec<StubRule>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            services_root: Utf8PathBuf::from("src/services"),
            directories: ["code", "code/parsers", "code/generators", "code/pretty", "elements"]
                .into_iter()
                .map(Utf8PathBuf::from)
                .collect(),
            relocations: vec![
                RelocationRule::new("code/codeParser.js", "code/codeParser.legacy.js"),
                RelocationRule::new(
                    "code/codePrettyPrinter.js",
                    "code/pretty/codePrettyPrinter.js",
                ),
                RelocationRule::new(
                    "code/generateProjectCode.js",
                    "code/generators/generateProjectCode.js",
                ),
            ],
            stubs: vec![
                StubRule::new(
                    "code/parsers/parseProjectCode.js",
                    templates::PARSE_PROJECT_CODE,
                ),
                StubRule::new("code/parsers/parseTikz.js", templates::PARSE_TIKZ),
                StubRule::new("code/parsers/parseCircuitikz.js", templates::PARSE_CIRCUITIKZ),
            ],
        }
    }
}

/// An element library as configured.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Library name.
    pub name: String,
    /// Directory, relative to the project root.
    pub dir: Utf8PathBuf,
}

impl LibraryConfig {
    /// Creates a new library entry.
    #[must_use]
    pub fn new(name: impl Into<String>, dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
        }
    }
}

fn default_libraries() -> Vec<LibraryConfig> {
    vec![
        LibraryConfig::new("tikz", "src/libs/tikz"),
        LibraryConfig::new("circuittikz", "src/libs/circuittikz"),
    ]
}

/// How element modules bind to the external registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Name of the registry object modules register with.
    pub receiver: String,

    /// Import specifier of the registry, as seen from a library directory.
    pub import_path: String,

    /// File name of the per-library registry index.
    pub index_file: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            receiver: "elementRegistry".to_owned(),
            import_path: "../elementRegistry.js".to_owned(),
            index_file: "index.js".to_owned(),
        }
    }
}

/// Converter settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Copy each file into a backup directory before rewriting it.
    pub backup: bool,

    /// Prefix of the per-run backup directory created under the project root.
    pub backup_dir_prefix: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            backup: true,
            backup_dir_prefix: ".backup".to_owned(),
        }
    }
}

/// Element module selection.
///
/// A library file is an element module when its identifier has a category,
/// or when it exports `descriptor` or registers with the registry receiver.
/// Listed identifiers are never treated as elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementsConfig {
    /// File identifiers left untouched by convert, patch, and index.
    pub exclude: Vec<String>,
}

/// Batch generator settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Directory generated modules are written to, relative to the project root.
    pub output_dir: Utf8PathBuf,

    /// Replace existing modules whose content differs.
    pub overwrite: bool,

    /// JSON specification table; the built-in catalog is used when unset.
    pub table: Option<Utf8PathBuf>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            output_dir: Utf8PathBuf::from("src/libs/circuittikz"),
            overwrite: false,
            table: None,
        }
    }
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use tk_core::Config;
///
/// let config = Config::default().with_root("/app");
/// assert_eq!(config.services_root().as_str(), "/app/src/services");
/// assert_eq!(config.libraries().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project root all relative paths are resolved against.
    pub root: Utf8PathBuf,

    /// Directory reorganization plan.
    pub layout: LayoutConfig,

    /// Element libraries.
    pub libraries: Vec<LibraryConfig>,

    /// Registry binding.
    pub registry: RegistryConfig,

    /// Converter settings.
    pub convert: ConvertConfig,

    /// Generator settings.
    pub generate: GenerateConfig,

    /// Element module selection.
    pub elements: ElementsConfig,

    /// File identifier to category table.
    pub categories: CategoryMap,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: Utf8PathBuf::from("."),
            layout: LayoutConfig::default(),
            libraries: default_libraries(),
            registry: RegistryConfig::default(),
            convert: ConvertConfig::default(),
            generate: GenerateConfig::default(),
            elements: ElementsConfig::default(),
            categories: CategoryMap::default(),
        }
    }
}

impl Config {
    /// Parses a configuration from JSON text and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn from_json_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_owned()));
        }
        let contents = fs::read_to_string(path.as_std_path())?;
        Self::from_json_str(&contents)
    }

    /// Replaces the project root, returning `self` for chaining.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Checks option values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_plain_identifier(&self.registry.receiver) {
            return Err(ConfigError::invalid_option(
                "registry.receiver",
                format!("'{}' is not a valid identifier", self.registry.receiver),
            ));
        }
        if self.registry.index_file.is_empty() || self.registry.index_file.contains('/') {
            return Err(ConfigError::invalid_option(
                "registry.index_file",
                "must be a bare file name",
            ));
        }

        let mut names: FxHashSet<&str> = fx_hash_set();
        for library in &self.libraries {
            if library.name.is_empty() {
                return Err(ConfigError::invalid_option(
                    "libraries",
                    "library names must not be empty",
                ));
            }
            if !names.insert(library.name.as_str()) {
                return Err(ConfigError::invalid_option(
                    "libraries",
                    format!("library '{}' is declared twice", library.name),
                ));
            }
        }
        Ok(())
    }

    /// Resolves a path against the project root.
    #[must_use]
    pub fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.root.join(path)
        }
    }

    /// Absolute services directory.
    #[must_use]
    pub fn services_root(&self) -> Utf8PathBuf {
        self.resolve(&self.layout.services_root)
    }

    /// Configured libraries with resolved directories.
    #[must_use]
    pub fn libraries(&self) -> Vec<Library> {
        self.libraries
            .iter()
            .map(|lib| Library::new(lib.name.clone(), self.resolve(&lib.dir)))
            .collect()
    }

    /// Resolved generator output directory.
    #[must_use]
    pub fn generate_dir(&self) -> Utf8PathBuf {
        self.resolve(&self.generate.output_dir)
    }

    /// Resolved specification table path, if one is configured.
    #[must_use]
    pub fn table_path(&self) -> Option<Utf8PathBuf> {
        self.generate.table.as_deref().map(|path| self.resolve(path))
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_defaults() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.directories.len(), 5);
        assert_eq!(
            layout.relocations[0],
            RelocationRule::new("code/codeParser.js", "code/codeParser.legacy.js")
        );
        assert!(layout.stubs[1].body.contains("export function parseTikz(code)"));
    }

    #[test]
    fn test_registry_defaults() {
        let registry = RegistryConfig::default();
        assert_eq!(registry.receiver, "elementRegistry");
        assert_eq!(registry.import_path, "../elementRegistry.js");
        assert_eq!(registry.index_file, "index.js");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let json = r#"{"root": "/proj", "convert": {"backup": false}}"#;
        let config = Config::from_json_str(json).unwrap();
        assert!(!config.convert.backup);
        assert_eq!(config.convert.backup_dir_prefix, ".backup");
        assert_eq!(config.libraries.len(), 2);
        assert_eq!(config.categories.category_for("vsource"), "sources");
    }

    #[test]
    fn test_elements_exclude() {
        let config = Config::from_json_str(r#"{"elements": {"exclude": ["tikzParser"]}}"#).unwrap();
        assert_eq!(config.elements.exclude, vec!["tikzParser".to_owned()]);
        assert!(Config::default().elements.exclude.is_empty());
    }

    #[test]
    fn test_resolve_paths() {
        let config = Config::default().with_root("/proj");
        assert_eq!(config.generate_dir(), "/proj/src/libs/circuittikz");
        assert_eq!(config.resolve(Utf8Path::new("/abs/x")), "/abs/x");
        let libs = config.libraries();
        assert_eq!(libs[0].name, "tikz");
        assert_eq!(libs[0].dir, "/proj/src/libs/tikz");
        assert!(config.table_path().is_none());
    }

    #[test]
    fn test_validate_rejects_bad_receiver() {
        let json = r#"{"registry": {"receiver": "element-registry"}}"#;
        let err = Config::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOption { ref option, .. } if option == "registry.receiver"));
    }

    #[test]
    fn test_validate_rejects_duplicate_library() {
        let json = r#"{"libraries": [{"name": "tikz", "dir": "a"}, {"name": "tikz", "dir": "b"}]}"#;
        let err = Config::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("tk-migrate.json")).unwrap();
        fs::write(&path, r#"{"generate": {"overwrite": true, "table": "table.json"}}"#).unwrap();

        let config = Config::from_json_file(&path).unwrap().with_root("/proj");
        assert!(config.generate.overwrite);
        assert_eq!(config.table_path(), Some(Utf8PathBuf::from("/proj/table.json")));
    }

    #[test]
    fn test_from_missing_json_file() {
        let err = Config::from_json_file(Utf8Path::new("/nonexistent/tk-migrate.json")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile(_)));
    }
}
