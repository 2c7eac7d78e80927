//! Command-line interface module for mediasort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Configuration and MIME table setup
//! - Orchestrating scan and relocation on a tokio runtime
//! - Interrupt handling and the final report

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigError};
use crate::destinations::{DestinationMap, resolve_dir};
use crate::error::{Error, Result};
use crate::logging::Verbosity;
use crate::metrics::RunMetrics;
use crate::mime_download::{IMAGEMAGICK_MIME_XML_URL, download_mime_types};
use crate::mime_table::{LOCAL_TABLE_NAME, MimeTable};
use crate::output::OutputFormatter;
use crate::relocator::{RelocationMode, Relocator, TaskStatus};
use crate::scanner::TreeScanner;

/// Move or copy files into per-type destination trees.
///
/// Example: mediasort ~/Pictures/import image=~/Photos video=~/Videos
#[derive(Debug, Clone, Parser)]
#[command(name = "mediasort", version, about)]
pub struct Cli {
    /// List actions
    #[arg(short, long)]
    pub verbose: bool,

    /// Debug level logging
    #[arg(short, long)]
    pub debug: bool,

    /// Download the mime types reference into ./mime.types and exit
    #[arg(short = 'm', long = "mt-download")]
    pub mt_download: bool,

    /// Dry run
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Copy, don't move
    #[arg(short, long)]
    pub copy: bool,

    /// Files relocated concurrently per batch
    #[arg(short = 'j', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// MIME table override in mime.types format
    #[arg(long, value_name = "FILE")]
    pub mime_types: Option<PathBuf>,

    /// Configuration file (default: ./.mediasortrc.toml, ~/.config/mediasort/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Source directory
    #[arg(value_name = "SOURCE_DIR", required_unless_present = "mt_download")]
    pub source: Option<String>,

    /// Destination patterns in TYPE=DIRECTORY format
    #[arg(value_name = "TYPE=DIR", required_unless_present = "mt_download")]
    pub destinations: Vec<String>,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.debug)
    }

    pub fn mode(&self) -> RelocationMode {
        if self.copy {
            RelocationMode::Copy
        } else {
            RelocationMode::Move
        }
    }
}

/// What a finished invocation did.
#[derive(Debug)]
pub enum RunReport {
    /// `--mt-download` wrote this many entries.
    MimeTableDownloaded { path: PathBuf, entries: usize },
    Relocated(RunMetrics),
}

impl RunReport {
    pub fn interrupted(&self) -> bool {
        matches!(self, RunReport::Relocated(metrics) if metrics.interrupted)
    }
}

/// Runs the CLI application.
///
/// Setup failures (bad configuration, destination or source) are returned
/// before any file is touched. Per-file failures are only counted.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use mediasort::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["mediasort", "/import", "image=/photos", "--dry-run"]);
/// match run_cli(&cli) {
///     Ok(report) => println!("{report:?}"),
///     Err(e) => eprintln!("Error: {e}"),
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<RunReport> {
    if cli.mt_download {
        let path = PathBuf::from(LOCAL_TABLE_NAME);
        let entries = download_mime_types(IMAGEMAGICK_MIME_XML_URL, &path)?;
        OutputFormatter::success(&format!(
            "Generated '{}' with {} entries",
            path.display(),
            entries
        ));
        return Ok(RunReport::MimeTableDownloaded { path, entries });
    }

    let source = resolve_dir(cli.source.as_deref().unwrap_or_default(), "Source directory")?;
    let destinations = DestinationMap::parse(&cli.destinations)?;
    info!(source = %source.display(), rules = %destinations, "moving files");

    let config = Config::load(cli.config.as_deref())?;
    let mut table_options = config.mime_table_options();
    if let Some(path) = &cli.mime_types {
        table_options.override_file = Some(path.clone());
    }
    let table = MimeTable::load(&table_options)?;
    let classifier = config.classifier(table)?;
    let filters = config.compile_filters()?;
    let concurrency = match cli.concurrency {
        Some(0) => return Err(ConfigError::InvalidConcurrency.into()),
        Some(n) => n,
        None => config.concurrency()?,
    };

    let scanner = TreeScanner::new(&source, &destinations, &classifier)?.with_filters(&filters);
    let relocator = Relocator::new(cli.mode())
        .dry_run(cli.dry_run)
        .concurrency(concurrency);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(Error::Runtime)?;

    let list_actions = cli.dry_run || cli.verbosity().lists_actions();
    let spinner = (!list_actions && !cli.json).then(OutputFormatter::create_spinner);
    let start = Instant::now();

    let metrics = runtime.block_on(async {
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing current batch");
                on_signal.cancel();
            }
        });

        relocator
            .relocate(scanner, &cancel, |outcome| {
                if let Some(pb) = &spinner {
                    pb.inc(1);
                    if let TaskStatus::Failed(_) = outcome.status {
                        pb.suspend(|| OutputFormatter::action(outcome));
                    }
                } else if list_actions || matches!(outcome.status, TaskStatus::Failed(_)) {
                    OutputFormatter::action(outcome);
                }
            })
            .await
    });
    let elapsed = start.elapsed();
    runtime.shutdown_background();

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    debug!(?metrics, "run finished");

    if cli.json {
        match serde_json::to_string_pretty(&metrics) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!(error = %e, "could not serialise summary"),
        }
    } else {
        OutputFormatter::summary(&metrics, elapsed, cli.dry_run);
    }

    Ok(RunReport::Relocated(metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "mediasort", "-n", "-c", "-v", "-j", "3", "/src", "image=/a", "video=/b",
        ]);
        assert!(cli.dry_run);
        assert_eq!(cli.mode(), RelocationMode::Copy);
        assert_eq!(cli.verbosity(), Verbosity::Verbose);
        assert_eq!(cli.concurrency, Some(3));
        assert_eq!(cli.source.as_deref(), Some("/src"));
        assert_eq!(cli.destinations, vec!["image=/a", "video=/b"]);
    }

    #[test]
    fn test_destinations_required() {
        assert!(Cli::try_parse_from(["mediasort", "/src"]).is_err());
        assert!(Cli::try_parse_from(["mediasort"]).is_err());
    }

    #[test]
    fn test_mt_download_needs_no_positionals() {
        let cli = Cli::try_parse_from(["mediasort", "--mt-download"]).unwrap();
        assert!(cli.mt_download);
        assert!(cli.source.is_none());
    }

    #[test]
    fn test_default_mode_is_move() {
        let cli = Cli::parse_from(["mediasort", "/src", "image=/a"]);
        assert_eq!(cli.mode(), RelocationMode::Move);
        assert_eq!(cli.verbosity(), Verbosity::Quiet);
    }
}
