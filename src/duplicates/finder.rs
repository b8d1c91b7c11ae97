//! Duplicate finder: the scan pipeline.
//!
//! # Overview
//!
//! A scan runs four phases in order, never returning to an earlier one:
//! 1. **Traverse** - insert every discovered file into a fresh catalog
//! 2. **Select candidates** - take the size groups with 2+ members
//! 3. **Hash** - hash each candidate once and store the digest
//! 4. **Report** - read back the hash groups with 2+ members
//!
//! Files with a unique size are never opened. Per-file failures in the
//! traverse and hash phases become [`ScanWarning`]s and the scan carries on;
//! catalog contract violations abort the scan. The catalog is owned by the
//! scan and dropped when it returns, whatever the outcome.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(8));
//! let (groups, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! for group in &groups {
//!     println!("{}: {} copies", group.hash_hex(), group.len());
//! }
//! println!("Reclaimable: {}", summary.reclaimable_display());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::{GroupingStats, HashGroup};
use crate::catalog::{Catalog, CatalogBackend, CatalogError, FileRecord};
use crate::progress::ProgressCallback;
use crate::scanner::{ContentHasher, FileEntry, Hash, HashError, Hasher, ScanError, Walker, WalkerConfig};

/// The phases of a scan, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Walk the tree and catalog every file
    Traverse,
    /// Pick files whose size collides with another file
    SelectCandidates,
    /// Hash the candidates
    Hash,
    /// Collect hash groups
    Report,
}

impl ScanPhase {
    /// All phases in execution order.
    pub const ALL: [ScanPhase; 4] = [
        ScanPhase::Traverse,
        ScanPhase::SelectCandidates,
        ScanPhase::Hash,
        ScanPhase::Report,
    ];

    /// Human-readable phase name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ScanPhase::Traverse => "Walking directories",
            ScanPhase::SelectCandidates => "Selecting size candidates",
            ScanPhase::Hash => "Calculating hashes",
            ScanPhase::Report => "Collecting duplicates",
        }
    }

    /// The phase that follows this one, if any.
    #[must_use]
    pub fn next(self) -> Option<ScanPhase> {
        match self {
            ScanPhase::Traverse => Some(ScanPhase::SelectCandidates),
            ScanPhase::SelectCandidates => Some(ScanPhase::Hash),
            ScanPhase::Hash => Some(ScanPhase::Report),
            ScanPhase::Report => None,
        }
    }
}

impl std::fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of threads used for hashing.
    pub io_threads: usize,
    /// Catalog backend opened for each scan.
    pub backend: CatalogBackend,
    /// Directory walker options.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("backend", &self.backend)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            backend: CatalogBackend::default(),
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the hashing thread count (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the catalog backend.
    #[must_use]
    pub fn with_backend(mut self, backend: CatalogBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// A file skipped during a scan.
#[derive(thiserror::Error, Debug)]
pub enum ScanWarning {
    /// The walker could not read the entry.
    #[error("{0}")]
    Traverse(#[from] ScanError),

    /// The catalog refused the entry (duplicate or unstorable location).
    #[error("{0}")]
    Catalog(CatalogError),

    /// The file could not be hashed and is excluded from all hash groups.
    #[error("{0}")]
    Hash(#[from] HashError),
}

impl ScanWarning {
    /// The phase in which the file was skipped.
    #[must_use]
    pub fn phase(&self) -> ScanPhase {
        match self {
            Self::Traverse(_) | Self::Catalog(_) => ScanPhase::Traverse,
            Self::Hash(_) => ScanPhase::Hash,
        }
    }

    /// The skipped path, when known.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Traverse(e) => Some(e.path()),
            Self::Hash(e) => Some(e.path()),
            Self::Catalog(CatalogError::DuplicateKey(p) | CatalogError::UnrepresentablePath(p)) => {
                Some(p)
            }
            Self::Catalog(_) => None,
        }
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Number of files cataloged
    pub total_files: usize,
    /// Total size of all cataloged files in bytes
    pub total_size: u64,
    /// Files whose size collided with another file
    pub size_candidates: usize,
    /// Files eliminated without hashing (unique size)
    pub eliminated_by_size: usize,
    /// Candidates hashed successfully
    pub hashed_files: usize,
    /// Candidates that could not be hashed
    pub failed_files: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Space held by the extra copies
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Files skipped during the scan
    pub warnings: Vec<ScanWarning>,
}

impl ScanSummary {
    /// Format reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as a human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }

    /// Whether any file was skipped.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The catalog broke its contract or its storage failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Runs the scan pipeline against a fresh catalog per call.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Arc<dyn ContentHasher>,
}

impl DuplicateFinder {
    /// Create a finder that hashes with BLAKE3.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new();
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        Self {
            config,
            hasher: Arc::new(hasher),
        }
    }

    /// Create a finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Replace the content hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Find all duplicate files beneath `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError`] if the path is missing or not a directory, the
    /// scan is interrupted, or the catalog fails.
    pub fn find_duplicates(&self, path: &Path) -> Result<(Vec<HashGroup>, ScanSummary), FinderError> {
        if !path.exists() {
            return Err(FinderError::PathNotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(FinderError::NotADirectory(path.to_path_buf()));
        }

        log::info!("Starting duplicate scan of {}", path.display());

        let mut walker = Walker::new(path, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }

        self.run(walker.walk())
    }

    /// Find duplicates among entries produced by an external walker.
    ///
    /// Error items are recorded as warnings, exactly like walker errors.
    ///
    /// # Errors
    ///
    /// See [`DuplicateFinder::find_duplicates`].
    pub fn find_duplicates_from_entries<I>(
        &self,
        entries: I,
    ) -> Result<(Vec<HashGroup>, ScanSummary), FinderError>
    where
        I: IntoIterator<Item = Result<FileEntry, ScanError>>,
    {
        self.run(entries)
    }

    /// Find duplicates from a pre-collected list of files.
    ///
    /// # Errors
    ///
    /// See [`DuplicateFinder::find_duplicates`].
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<(Vec<HashGroup>, ScanSummary), FinderError> {
        self.run(files.into_iter().map(Ok))
    }

    fn run<I>(&self, entries: I) -> Result<(Vec<HashGroup>, ScanSummary), FinderError>
    where
        I: IntoIterator<Item = Result<FileEntry, ScanError>>,
    {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();
        let mut catalog = self.config.backend.open()?;

        self.traverse(catalog.as_mut(), entries, &mut summary)?;
        self.check_shutdown()?;

        let candidates = self.select_candidates(catalog.as_ref(), &mut summary)?;
        self.check_shutdown()?;

        self.hash_candidates(catalog.as_mut(), candidates, &mut summary)?;
        self.check_shutdown()?;

        let groups = self.report(catalog.as_ref(), &mut summary)?;
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable, {} skipped",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display(),
            summary.warnings.len()
        );

        Ok((groups, summary))
    }

    fn check_shutdown(&self) -> Result<(), FinderError> {
        if self.config.is_shutdown_requested() {
            log::info!("Shutdown requested, discarding catalog");
            Err(FinderError::Interrupted)
        } else {
            Ok(())
        }
    }

    fn phase_start(&self, phase: ScanPhase, total: usize) {
        log::debug!("Entering phase: {}", phase);
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(phase, total);
        }
    }

    fn phase_end(&self, phase: ScanPhase) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(phase);
        }
    }

    fn report_progress(&self, current: usize, path: &Path) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_progress(current, path.to_string_lossy().as_ref());
        }
    }

    fn skip(summary: &mut ScanSummary, warning: ScanWarning) {
        log::warn!("Skipping file: {}", warning);
        summary.warnings.push(warning);
    }

    fn traverse<I>(
        &self,
        catalog: &mut dyn Catalog,
        entries: I,
        summary: &mut ScanSummary,
    ) -> Result<(), FinderError>
    where
        I: IntoIterator<Item = Result<FileEntry, ScanError>>,
    {
        self.phase_start(ScanPhase::Traverse, 0);

        for (seen, result) in entries.into_iter().enumerate() {
            if self.config.is_shutdown_requested() {
                break;
            }
            match result {
                Ok(entry) => {
                    self.report_progress(seen + 1, &entry.path);
                    match catalog.insert(&entry.path, entry.size) {
                        Ok(()) => {
                            summary.total_files += 1;
                            summary.total_size += entry.size;
                        }
                        Err(e) if e.is_per_file() => Self::skip(summary, ScanWarning::Catalog(e)),
                        Err(e) => return Err(e.into()),
                    }
                }
                Err(e) => Self::skip(summary, ScanWarning::Traverse(e)),
            }
        }

        self.phase_end(ScanPhase::Traverse);
        log::info!(
            "Cataloged {} files ({})",
            summary.total_files,
            summary.total_size_display()
        );
        Ok(())
    }

    fn select_candidates(
        &self,
        catalog: &dyn Catalog,
        summary: &mut ScanSummary,
    ) -> Result<Vec<FileRecord>, FinderError> {
        self.phase_start(ScanPhase::SelectCandidates, 0);

        let groups = catalog.group_by_size()?;
        for group in &groups {
            log::debug!("Size group {} bytes: {} candidates", group.size, group.len());
        }

        let stats = GroupingStats::from_size_groups(summary.total_files, &groups);
        summary.size_candidates = stats.potential_duplicates;
        summary.eliminated_by_size = stats.eliminated_unique;

        log::info!(
            "Size selection: {} files → {} candidates ({:.1}% eliminated)",
            stats.total_files,
            stats.potential_duplicates,
            stats.elimination_rate()
        );

        self.phase_end(ScanPhase::SelectCandidates);
        Ok(groups.into_iter().flat_map(|g| g.files).collect())
    }

    fn hash_candidates(
        &self,
        catalog: &mut dyn Catalog,
        candidates: Vec<FileRecord>,
        summary: &mut ScanSummary,
    ) -> Result<(), FinderError> {
        if candidates.is_empty() {
            log::debug!("No size candidates, nothing to hash");
            return Ok(());
        }

        self.phase_start(ScanPhase::Hash, candidates.len());
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_message(&format!(
                "{} on {} threads",
                ScanPhase::Hash.label(),
                self.config.io_threads
            ));
        }
        log::info!(
            "Hashing {} files on {} threads",
            candidates.len(),
            self.config.io_threads
        );

        let completed = AtomicUsize::new(0);
        let compute = || -> Vec<Result<Hash, HashError>> {
            candidates
                .par_iter()
                .map(|record| {
                    if self.config.is_shutdown_requested() {
                        return Err(HashError::Interrupted(record.path.clone()));
                    }
                    let result = self.hasher.hash(&record.path);
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    self.report_progress(done, &record.path);
                    result
                })
                .collect()
        };

        let results = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()
        {
            Ok(pool) => pool.install(compute),
            Err(e) => {
                log::warn!("Failed to create hashing thread pool, using global pool: {}", e);
                compute()
            }
        };

        self.phase_end(ScanPhase::Hash);
        self.check_shutdown()?;

        // Digests are written back one at a time, in candidate order.
        for (record, result) in candidates.into_iter().zip(results) {
            match result {
                Ok(hash) => {
                    catalog.set_hash(&record.path, hash)?;
                    summary.hashed_files += 1;
                }
                Err(e) => {
                    summary.failed_files += 1;
                    Self::skip(summary, ScanWarning::Hash(e));
                }
            }
        }

        log::info!(
            "Hashed {} files, {} failed",
            summary.hashed_files,
            summary.failed_files
        );
        Ok(())
    }

    fn report(
        &self,
        catalog: &dyn Catalog,
        summary: &mut ScanSummary,
    ) -> Result<Vec<HashGroup>, FinderError> {
        self.phase_start(ScanPhase::Report, 0);

        let groups = catalog.group_by_hash()?;
        for group in &groups {
            log::debug!(
                "Duplicate group {}: {} files, {} bytes each",
                group.hash_hex(),
                group.len(),
                group.size
            );
        }

        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(HashGroup::duplicate_count).sum();
        summary.reclaimable_space = groups.iter().map(HashGroup::wasted_space).sum();

        self.phase_end(ScanPhase::Report);
        Ok(groups)
    }
}
