//! docscout - find markdown documents under a directory tree.
//!
//! Usage:
//!   docscout find [PATH]     List matching documents
//!   docscout ls [PATH]       List one directory
//!   docscout --help          Show help

mod settings;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use docscout_scan::{
    CancelReason, CancellationToken, DirEntryInfo, DiscoverConfig, DiscoverError,
    DiscoveryEngine, DiscoveryReport, Document, EntryErrorPolicy, FilterSpec, ScanRequest,
};

use crate::settings::Settings;

/// Exit code for a root that is missing or not a directory.
const EXIT_INVALID_ROOT: u8 = 2;
/// Exit code for a scan that hit its deadline.
const EXIT_TIMEOUT: u8 = 124;
/// Exit code for a scan interrupted by the user.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(
    name = "docscout",
    version,
    about = "Find markdown documents under a directory tree",
    long_about = "docscout walks a directory tree and lists the documents that match \
                  its include/exclude rules.\n\n\
                  Without filter flags it looks for `.md` files and skips `.git`, \
                  `node_modules` and `.Trash`."
)]
struct Cli {
    /// Settings file (defaults to <config dir>/docscout/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List documents under a directory
    Find {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// Number of filter workers
        #[arg(short = 'j', long)]
        workers: Option<usize>,

        /// Abort on the first unreadable entry instead of skipping it
        #[arg(long)]
        strict: bool,

        /// Give up after this long (e.g., "500ms", "30s", "2m")
        #[arg(short, long)]
        timeout: Option<String>,

        /// Maximum depth to descend
        #[arg(long)]
        max_depth: Option<usize>,

        /// Follow symbolic links
        #[arg(long)]
        follow_symlinks: bool,

        /// Print scan statistics to stderr
        #[arg(long)]
        stats: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List the entries of a single directory
    Ls {
        /// Directory to list
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Extension to include (repeatable)
    #[arg(short = 'e', long = "ext", value_name = "EXT")]
    include_extensions: Vec<String>,

    /// Parent directory pattern to include (repeatable, `*` for any)
    #[arg(long = "include-dir", value_name = "PATTERN")]
    include_dir_names: Vec<String>,

    /// Extension to exclude (repeatable)
    #[arg(long = "exclude-ext", value_name = "EXT")]
    exclude_extensions: Vec<String>,

    /// Directory pattern whose subtree is skipped (repeatable)
    #[arg(short = 'x', long = "exclude-dir", value_name = "PATTERN")]
    exclude_dir_names: Vec<String>,
}

impl FilterArgs {
    /// Flags win over the settings file, which wins over the built-in default.
    fn resolve(self, from_settings: Option<FilterSpec>) -> FilterSpec {
        let flags = FilterSpec {
            include_extensions: self.include_extensions,
            include_dir_names: self.include_dir_names,
            exclude_extensions: self.exclude_extensions,
            exclude_dir_names: self.exclude_dir_names,
        };
        if !flags.is_empty() {
            return flags;
        }
        from_settings.unwrap_or_else(FilterSpec::default_documents)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct DocumentsOutput<'a> {
    documents: &'a [Document],
}

#[derive(Serialize)]
struct ListingOutput<'a> {
    path: &'a Path,
    items: &'a [DirEntryInfo],
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Find {
            path,
            filter,
            workers,
            strict,
            timeout,
            max_depth,
            follow_symlinks,
            stats,
            format,
        } => {
            let mut config = settings.discover;
            apply_overrides(&mut config, workers, strict, max_depth, follow_symlinks);
            let filter = filter.resolve(settings.filter);
            let timeout = timeout.as_deref().map(parse_duration).transpose()?;

            run_find(&path, config, filter, timeout, stats, format).await
        }
        Command::Ls { path, format } => run_ls(&path, format).await,
    }
}

fn setup_logging(verbose: bool) {
    let default = if verbose {
        "docscout=debug,docscout_scan=debug,warn"
    } else {
        "docscout=info,docscout_scan=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn apply_overrides(
    config: &mut DiscoverConfig,
    workers: Option<usize>,
    strict: bool,
    max_depth: Option<usize>,
    follow_symlinks: bool,
) {
    if let Some(workers) = workers {
        config.workers = workers;
    }
    if strict {
        config.entry_errors = EntryErrorPolicy::FailFast;
    }
    if max_depth.is_some() {
        config.max_depth = max_depth;
    }
    if follow_symlinks {
        config.follow_symlinks = true;
    }
}

/// Run a discovery and print the documents.
async fn run_find(
    path: &Path,
    config: DiscoverConfig,
    filter: FilterSpec,
    timeout: Option<Duration>,
    show_stats: bool,
    format: OutputFormat,
) -> Result<ExitCode> {
    let engine = DiscoveryEngine::with_config(config).wrap_err("Invalid configuration")?;
    tracing::debug!(
        workers = engine.config().workers,
        strict = engine.config().is_strict(),
        "engine ready"
    );

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let mut request = ScanRequest::new(path, filter).with_cancel(cancel);
    if let Some(timeout) = timeout {
        request = request.with_timeout(timeout);
    }

    let report = match engine.discover_report(request).await {
        Ok(report) => report,
        Err(err) => return exit_for(err),
    };

    match format {
        OutputFormat::Text => {
            for doc in &report.documents {
                println!("{}", doc.relative_path.display());
            }
        }
        OutputFormat::Json => {
            let output = DocumentsOutput {
                documents: &report.documents,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    if report.is_empty() {
        tracing::info!(root = %report.root.display(), "no documents found");
    }

    if show_stats {
        print_stats(&report);
    } else if report.has_warnings() {
        eprintln!("{} entr(ies) skipped during scan", report.warnings.len());
    }

    Ok(ExitCode::SUCCESS)
}

/// List one directory.
async fn run_ls(path: &Path, format: OutputFormat) -> Result<ExitCode> {
    let engine = DiscoveryEngine::new();
    let items = match engine.list_directory(path).await {
        Ok(items) => items,
        Err(err) => return exit_for(err),
    };

    match format {
        OutputFormat::Text => {
            for item in &items {
                let marker = if item.is_dir { "/" } else { "" };
                println!("{}{}", item.name, marker);
            }
        }
        OutputFormat::Json => {
            let output = ListingOutput {
                path,
                items: &items,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Exit code for caller-facing failures. Anything else is reported as an error.
fn exit_code(err: &DiscoverError) -> Option<u8> {
    match err {
        DiscoverError::InvalidRoot { .. } => Some(EXIT_INVALID_ROOT),
        DiscoverError::Cancelled {
            reason: CancelReason::DeadlineExceeded,
        } => Some(EXIT_TIMEOUT),
        DiscoverError::Cancelled {
            reason: CancelReason::Requested,
        } => Some(EXIT_INTERRUPTED),
        _ => None,
    }
}

fn exit_for(err: DiscoverError) -> Result<ExitCode> {
    match exit_code(&err) {
        Some(code) => {
            eprintln!("docscout: {err}");
            Ok(ExitCode::from(code))
        }
        None => Err(color_eyre::eyre::Report::new(err).wrap_err("Discovery failed")),
    }
}

fn print_stats(report: &DiscoveryReport) {
    let stats = &report.stats;
    eprintln!("{}", "─".repeat(50));
    eprintln!(" {}", report.root.display());
    eprintln!(
        " {} documents from {} files ({} entries visited)",
        report.len(),
        stats.files_evaluated,
        stats.entries_visited
    );
    eprintln!(
        " {} directories pruned, {} entries skipped",
        stats.dirs_pruned, stats.entries_skipped
    );
    eprintln!(" Scanned in {:.2}s", report.duration.as_secs_f64());
    eprintln!("{}", "─".repeat(50));

    for warning in &report.warnings {
        eprintln!(" skipped {}: {}", warning.path.display(), warning.message);
    }
}

/// Parse a duration string (e.g., "250ms", "30s", "5m", "1h").
fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();

    let (num, multiplier) = if let Some(n) = s.strip_suffix("ms") {
        (n.trim().parse::<f64>()?, 0.001)
    } else if let Some(n) = s.strip_suffix('s') {
        (n.trim().parse::<f64>()?, 1.0)
    } else if let Some(n) = s.strip_suffix('m') {
        (n.trim().parse::<f64>()?, 60.0)
    } else if let Some(n) = s.strip_suffix('h') {
        (n.trim().parse::<f64>()?, 60.0 * 60.0)
    } else {
        (s.parse::<f64>()?, 1.0) // Default to seconds
    };

    if !num.is_finite() || num < 0.0 {
        bail!("Invalid duration: {s}");
    }

    match Duration::try_from_secs_f64(num * multiplier) {
        Ok(duration) => Ok(duration),
        Err(_) => bail!("Duration out of range: {s}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("5").unwrap(), Duration::from_secs(5));
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("1e20s").is_err());
        assert!(parse_duration("1e300h").is_err());
    }

    #[test]
    fn test_filter_flags_override_settings() {
        let args = FilterArgs {
            include_extensions: vec!["txt".to_string()],
            ..FilterArgs::default()
        };
        let from_settings = FilterSpec::new().include_extension("md");

        let filter = args.resolve(Some(from_settings));
        assert_eq!(filter.include_extensions, vec!["txt"]);
        assert!(filter.exclude_dir_names.is_empty());
    }

    #[test]
    fn test_filter_falls_back_to_settings_then_default() {
        let from_settings = FilterSpec::new().include_extension("rst");
        let filter = FilterArgs::default().resolve(Some(from_settings.clone()));
        assert_eq!(filter, from_settings);

        let filter = FilterArgs::default().resolve(None);
        assert_eq!(filter, FilterSpec::default_documents());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = DiscoverConfig::default();
        apply_overrides(&mut config, Some(3), true, Some(2), false);
        assert_eq!(config.workers, 3);
        assert_eq!(config.entry_errors, EntryErrorPolicy::FailFast);
        assert_eq!(config.max_depth, Some(2));
        assert!(!config.follow_symlinks);

        let mut config = DiscoverConfig::default();
        apply_overrides(&mut config, None, false, None, true);
        assert_eq!(config, DiscoverConfig {
            follow_symlinks: true,
            ..DiscoverConfig::default()
        });
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code(&DiscoverError::not_a_directory("/x")),
            Some(EXIT_INVALID_ROOT)
        );
        assert_eq!(
            exit_code(&DiscoverError::Cancelled {
                reason: CancelReason::DeadlineExceeded,
            }),
            Some(EXIT_TIMEOUT)
        );
        assert_eq!(
            exit_code(&DiscoverError::Cancelled {
                reason: CancelReason::Requested,
            }),
            Some(EXIT_INTERRUPTED)
        );

        let internal = DiscoverError::Internal {
            message: "boom".to_string(),
        };
        assert_eq!(exit_code(&internal), None);
        assert!(exit_for(internal).is_err());
    }

    #[test]
    fn test_cli_parses_find() {
        let cli = Cli::try_parse_from([
            "docscout", "find", "/notes", "-e", "md", "-x", ".git", "--strict", "-t", "10s",
        ])
        .unwrap();
        match cli.command {
            Command::Find {
                path,
                filter,
                strict,
                timeout,
                ..
            } => {
                assert_eq!(path, PathBuf::from("/notes"));
                assert_eq!(filter.include_extensions, vec!["md"]);
                assert_eq!(filter.exclude_dir_names, vec![".git"]);
                assert!(strict);
                assert_eq!(timeout.as_deref(), Some("10s"));
            }
            Command::Ls { .. } => panic!("expected find"),
        }
    }
}
