//! Scan-scoped file catalog.
//!
//! The catalog records every discovered file as a [`FileRecord`] keyed by its
//! full path, and answers the two grouping queries the duplicate finder is
//! built on: which sizes collide, and which digests collide.
//!
//! # Architecture
//!
//! * [`memory`]: the default backend, a record vector with incrementally
//!   maintained size and digest indexes.
//! * [`sqlite`]: a SQLite table, in memory or at a throwaway file path.
//!
//! Both backends implement [`Catalog`] and must produce identical results for
//! the same sequence of operations.
//!
//! # Ordering
//!
//! Groups are returned in ascending key order (size, or digest in hex
//! order). Members within a group keep their insertion order.

pub mod memory;
pub mod sqlite;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::duplicates::{HashGroup, SizeGroup};
use crate::scanner::{hash_to_hex, Hash};

pub use memory::MemoryCatalog;
pub use sqlite::SqliteCatalog;

/// One cataloged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Full path, unique within a catalog
    pub path: PathBuf,
    /// Size in bytes, fixed at insertion
    pub size: u64,
    /// Content digest, present once computed
    pub hash: Option<Hash>,
}

impl FileRecord {
    /// Create a record with no digest.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            hash: None,
        }
    }
}

/// Errors raised by catalog operations.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    /// A record already exists for this path.
    #[error("Location already cataloged: {0}")]
    DuplicateKey(PathBuf),

    /// No record exists for this path.
    #[error("Location not in catalog: {0}")]
    NotFound(PathBuf),

    /// A different digest was already stored for this path.
    #[error("Conflicting hash for {path}: stored {existing}, attempted {attempted}")]
    HashConflict {
        /// Path of the record
        path: PathBuf,
        /// Digest already stored (hex)
        existing: String,
        /// Digest that was rejected (hex)
        attempted: String,
    },

    /// The path cannot be represented by this backend.
    #[error("Path cannot be stored in the catalog: {0}")]
    UnrepresentablePath(PathBuf),

    /// The stored data could not be decoded.
    #[error("Corrupt catalog entry: {0}")]
    Corrupt(String),

    /// The storage engine failed.
    #[error("Catalog storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl CatalogError {
    pub(crate) fn conflict(path: &Path, existing: &Hash, attempted: &Hash) -> Self {
        Self::HashConflict {
            path: path.to_path_buf(),
            existing: hash_to_hex(existing),
            attempted: hash_to_hex(attempted),
        }
    }

    /// Whether the error concerns a single file rather than the catalog as a whole.
    ///
    /// Per-file errors are skipped during traversal; everything else aborts the scan.
    #[must_use]
    pub fn is_per_file(&self) -> bool {
        matches!(self, Self::DuplicateKey(_) | Self::UnrepresentablePath(_))
    }
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Record store read and written by the duplicate finder.
pub trait Catalog {
    /// Add a record for `path` with no digest.
    ///
    /// # Errors
    ///
    /// [`CatalogError::DuplicateKey`] if `path` is already present.
    fn insert(&mut self, path: &Path, size: u64) -> CatalogResult<()>;

    /// Store the digest for `path`.
    ///
    /// Storing the digest a record already has is a no-op.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] if `path` is absent and
    /// [`CatalogError::HashConflict`] if a different digest is already stored.
    fn set_hash(&mut self, path: &Path, hash: Hash) -> CatalogResult<()>;

    /// Records grouped by size, only for sizes shared by two or more records.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend cannot be read.
    fn group_by_size(&self) -> CatalogResult<Vec<SizeGroup>>;

    /// Records grouped by digest, only for digests shared by two or more records.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend cannot be read.
    fn group_by_hash(&self) -> CatalogResult<Vec<HashGroup>>;

    /// Look up a single record.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend cannot be read.
    fn get(&self, path: &Path) -> CatalogResult<Option<FileRecord>>;

    /// Number of records.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend cannot be read.
    fn len(&self) -> CatalogResult<usize>;

    /// Whether the catalog holds no records.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend cannot be read.
    fn is_empty(&self) -> CatalogResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Which catalog backend a scan uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// In-memory maps
    #[default]
    Memory,
    /// SQLite table
    Sqlite,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::Memory => write!(f, "memory"),
            StoreKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Backend selection plus the database location for SQLite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogBackend {
    /// Backend kind
    pub kind: StoreKind,
    /// Database file for SQLite; `None` keeps it in memory
    pub db_path: Option<PathBuf>,
}

impl CatalogBackend {
    /// Open a fresh, empty catalog for one scan.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Storage`] if the SQLite database cannot be created.
    pub fn open(&self) -> CatalogResult<Box<dyn Catalog>> {
        match (self.kind, &self.db_path) {
            (StoreKind::Memory, _) => Ok(Box::new(MemoryCatalog::new())),
            (StoreKind::Sqlite, None) => Ok(Box::new(SqliteCatalog::open_in_memory()?)),
            (StoreKind::Sqlite, Some(path)) => Ok(Box::new(SqliteCatalog::create(path)?)),
        }
    }
}
