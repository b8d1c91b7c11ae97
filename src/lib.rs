//! dupescan - duplicate file finder
//!
//! Finds files with identical content beneath a directory. Every file is
//! cataloged by size; only files whose size collides with another file are
//! hashed (BLAKE3, streamed in 64 KiB chunks); files sharing a digest are
//! reported as duplicate groups.
//!
//! ```no_run
//! use clap::Parser;
//! use dupescan::cli::Cli;
//!
//! let cli = Cli::parse_from(["dupescan", "/srv/photos", "--output", "json"]);
//! let exit_code = dupescan::run_app(cli).unwrap();
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::Write;
use std::sync::Arc;

use crate::catalog::CatalogBackend;
use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::output::OutputFormat;
use crate::progress::Progress;
use crate::scanner::WalkerConfig;

/// Run one scan as described by `cli` and write the report to stdout.
///
/// Logging must already be initialized.
///
/// # Errors
///
/// Returns an error if the scan fails or is interrupted
/// ([`duplicates::FinderError`]), or if the report cannot be written.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).with_overrides(&cli);
    log::debug!("Effective configuration: {:?}", config);

    let handler = signal::install_handler();

    let walker_config = WalkerConfig::default()
        .with_skip_hidden(config.skip_hidden)
        .with_size_range(cli.min_size, cli.max_size)
        .with_ignore_patterns(config.ignore_patterns.clone());

    let backend = CatalogBackend {
        kind: config.store,
        db_path: cli.db_path.clone(),
    };

    let mut finder_config = FinderConfig::default()
        .with_io_threads(config.io_threads)
        .with_backend(backend)
        .with_walker_config(walker_config)
        .with_shutdown_flag(handler.get_flag());

    let show_progress = !cli.quiet && !cli.no_progress && config.output == OutputFormat::Text;
    if show_progress {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let finder = DuplicateFinder::new(finder_config);
    let (groups, summary) = finder.find_duplicates(&cli.path)?;
    let exit_code = ExitCode::for_scan(&groups, &summary);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    config
        .output
        .write_report(&mut out, &groups, &summary, exit_code)?;
    out.flush()?;

    if config.output == OutputFormat::Text && !cli.quiet {
        eprintln!(
            "{} duplicate groups, {} reclaimable, {} files skipped ({:.2?})",
            summary.duplicate_groups,
            summary.reclaimable_display(),
            summary.warnings.len(),
            summary.scan_duration
        );
    }

    Ok(exit_code)
}
