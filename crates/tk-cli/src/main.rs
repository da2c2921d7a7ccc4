//! CLI entry point for the tk-migrate tool.
//!
//! Migrates a drawing application's element libraries to self-describing,
//! self-registering descriptor modules.
//!
//! # Usage
//!
//! ```bash
//! tk-migrate [OPTIONS] <COMMAND>
//!
//! # Run every stage against the current directory
//! tk-migrate run
//!
//! # Regenerate the circuit library, replacing modules that differ
//! tk-migrate --root /path/to/app generate --force
//!
//! # Machine-readable report
//! tk-migrate --format json patch > patch.json
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use tk_codegen::{CodegenError, Pipeline};
use tk_core::{Config, RunReport, StageReport};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Configuration file looked up in the project root when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "tk-migrate.json";

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Migrates element modules to self-registering descriptors.
///
/// Normalizes the project layout, converts legacy modules, generates the
/// circuit library, repairs registrations, and writes per-library indices.
#[derive(Parser)]
#[command(name = "tk-migrate", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Project root.
    ///
    /// Defaults to the current directory.
    #[arg(short = 'p', long, global = true, env = "TK_MIGRATE_ROOT")]
    root: Option<Utf8PathBuf>,

    /// JSON configuration file.
    ///
    /// Defaults to `tk-migrate.json` in the project root when present.
    #[arg(short, long, global = true, env = "TK_MIGRATE_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Report format.
    #[arg(short, long, global = true, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Create directories, relocate files, and write stubs.
    Normalize,

    /// Rewrite legacy modules into descriptor modules.
    Convert {
        /// Skip the backup copy of rewritten modules.
        #[arg(long)]
        no_backup: bool,
    },

    /// Generate modules from the specification table.
    Generate {
        /// Replace existing modules that differ from the generated output.
        #[arg(long)]
        force: bool,

        /// Specification table (JSON) used instead of the built-in catalog.
        #[arg(long)]
        table: Option<Utf8PathBuf>,
    },

    /// Collapse registrations to one canonical statement per module.
    Patch,

    /// Write each library's index module.
    Index,

    /// Run every stage in order.
    Run {
        /// Replace generated modules that differ from the generated output.
        #[arg(long)]
        force: bool,

        /// Skip the backup copy of converted modules.
        #[arg(long)]
        no_backup: bool,
    },
}

/// Report output format.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum ReportFormat {
    /// One line per entry, with a summary per stage.
    Text,
    /// The full run report as JSON.
    Json,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
/// Logs go to stderr so reports on stdout stay parseable.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(level)
    });

    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Builds a [`Config`] from CLI arguments.
///
/// An explicit `--config` file must exist; the default file is optional.
/// `--root` overrides the root named in the file. A missing root is
/// reported by the pipeline.
///
/// # Errors
///
/// Returns an error if a configuration file cannot be read or is invalid.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let root = cli.root.as_deref().unwrap_or_else(|| Utf8Path::new("."));
            let path = root.join(DEFAULT_CONFIG_FILE);
            if path.is_file() {
                load_config(&path)?
            } else {
                Config::default()
            }
        }
    };

    let mut config = match &cli.root {
        Some(root) => config.with_root(root.clone()),
        None => config,
    };
    match &cli.command {
        Commands::Convert { no_backup } => config.convert.backup &= !*no_backup,
        Commands::Generate { force, table } => {
            config.generate.overwrite |= *force;
            if table.is_some() {
                config.generate.table.clone_from(table);
            }
        }
        Commands::Run { force, no_backup } => {
            config.generate.overwrite |= *force;
            config.convert.backup &= !*no_backup;
        }
        Commands::Normalize | Commands::Patch | Commands::Index => {}
    }
    Ok(config)
}

fn load_config(path: &Utf8Path) -> color_eyre::Result<Config> {
    debug!(path = %path, "loading configuration");
    Config::from_json_file(path)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load configuration {}: {}", path, e))
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs the selected command and collects its report.
///
/// # Errors
///
/// Returns the fatal pipeline error (missing project root).
fn execute(command: &Commands, pipeline: &Pipeline) -> Result<RunReport, CodegenError> {
    let single = |report: StageReport| {
        let mut run = RunReport::default();
        run.push(report);
        run
    };

    match command {
        Commands::Normalize => pipeline.normalize().map(single),
        Commands::Convert { .. } => pipeline.convert().map(single),
        Commands::Generate { .. } => pipeline.generate().map(single),
        Commands::Patch => pipeline.patch().map(single),
        Commands::Index => pipeline.index().map(single),
        Commands::Run { .. } => pipeline.run(),
    }
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Writes a report as text: one line per entry, a summary per stage, and an
/// overall summary when more than one stage ran.
fn write_text_report(handle: &mut impl Write, report: &RunReport) -> std::io::Result<()> {
    for stage in &report.stages {
        writeln!(handle)?;
        writeln!(handle, "{}", stage.stage.label())?;
        writeln!(handle, "{}", "=".repeat(stage.stage.label().len()))?;
        for entry in &stage.entries {
            writeln!(handle, "  {entry}")?;
        }
        let summary = stage.summary();
        writeln!(
            handle,
            "  {} entries: {} changed, {} unchanged, {} skipped, {} conflicts, {} failures",
            summary.total,
            summary.changed,
            summary.unchanged,
            summary.skipped,
            summary.conflicts,
            summary.failures
        )?;
    }

    if report.stages.len() > 1 {
        let summary = report.summary();
        writeln!(handle)?;
        writeln!(
            handle,
            "Total: {} changed, {} conflicts, {} failures",
            summary.changed, summary.conflicts, summary.failures
        )?;
    }
    Ok(())
}

/// Writes a report as pretty-printed JSON.
fn write_json_report(handle: &mut impl Write, report: &RunReport) -> color_eyre::Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to serialize JSON: {}", e))?;
    writeln!(handle, "{json}")?;
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Resolve configuration
    let config = build_config(&cli)?;
    info!(root = %config.root, "Resolved project root");
    let pipeline = Pipeline::new(config);

    // 5. Run the command; a missing root is reported, not propagated
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let report = match execute(&cli.command, &pipeline) {
        Ok(report) => report,
        Err(err) if err.is_fatal() => {
            writeln!(handle, "❌ {err}")?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    match cli.format {
        ReportFormat::Text => write_text_report(&mut handle, &report)?,
        ReportFormat::Json => write_json_report(&mut handle, &report)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;
    use tk_core::{Outcome, ReportEntry, Stage};

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tk-migrate").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_apply_to_config() {
        let cli = parse(&["--root", "/nonexistent", "run", "--force", "--no-backup"]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.root, "/nonexistent");
        assert!(config.generate.overwrite);
        assert!(!config.convert.backup);
    }

    #[test]
    fn test_defaults_without_config_file() {
        let cli = parse(&["--root", "/nonexistent", "patch"]);
        let config = build_config(&cli).unwrap();
        assert!(!config.generate.overwrite);
        assert!(config.convert.backup);
        assert_eq!(cli.format, ReportFormat::Text);
    }

    #[test]
    fn test_config_file_in_root_is_loaded() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        fs::write(
            root.join(DEFAULT_CONFIG_FILE),
            r#"{ "generate": { "overwrite": true } }"#,
        )
        .unwrap();

        let cli = parse(&["--root", root.as_str(), "generate"]);
        let config = build_config(&cli).unwrap();
        assert!(config.generate.overwrite);
        assert_eq!(config.root, root);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let cli = parse(&["--config", "/nonexistent/tk-migrate.json", "index"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_missing_root_is_fatal_not_error() {
        let cli = parse(&["--root", "/nonexistent/project", "run"]);
        let pipeline = Pipeline::new(build_config(&cli).unwrap());
        let err = execute(&cli.command, &pipeline).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_text_report() {
        let mut stage = StageReport::new(Stage::Index);
        stage.push(ReportEntry::new(Stage::Index, "lib/index.js", Outcome::Created));
        let mut report = RunReport::default();
        report.push(stage);

        let mut out = Vec::new();
        write_text_report(&mut out, &report).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\nIndex\n=====\n"));
        assert!(text.contains("✔ created   lib/index.js\n"));
        assert!(text.contains("1 entries: 1 changed"));
        assert!(!text.contains("Total:"));
    }

    #[test]
    fn test_json_report() {
        let mut stage = StageReport::new(Stage::Patch);
        stage.push(
            ReportEntry::new(Stage::Patch, "lib/lamp.js", Outcome::Failed)
                .with_detail("no object literal"),
        );
        let mut report = RunReport::default();
        report.push(stage);

        let mut out = Vec::new();
        write_json_report(&mut out, &report).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["stages"][0]["stage"], "patch");
        assert_eq!(value["stages"][0]["entries"][0]["outcome"], "failed");
        assert_eq!(value["stages"][0]["entries"][0]["detail"], "no object literal");
    }
}
