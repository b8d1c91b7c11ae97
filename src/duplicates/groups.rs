//! Size and hash groupings of cataloged files.
//!
//! # Overview
//!
//! A [`SizeGroup`] holds records that share a byte size and therefore need
//! their content hashed. A [`HashGroup`] holds records that share a digest:
//! a confirmed set of duplicates. The catalog only materializes groups with
//! two or more members.
//!
//! # Example
//!
//! ```
//! use dupescan::catalog::{Catalog, MemoryCatalog};
//! use dupescan::duplicates::GroupingStats;
//! use std::path::Path;
//!
//! let mut catalog = MemoryCatalog::new();
//! catalog.insert(Path::new("/file1.txt"), 1024).unwrap();
//! catalog.insert(Path::new("/file2.txt"), 1024).unwrap();
//! catalog.insert(Path::new("/file3.txt"), 2048).unwrap();
//!
//! let groups = catalog.group_by_size().unwrap();
//! let stats = GroupingStats::from_size_groups(3, &groups);
//!
//! assert_eq!(groups.len(), 1);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(stats.eliminated_unique, 1);
//! ```

use std::path::PathBuf;

use crate::catalog::FileRecord;
use crate::scanner::Hash;

/// A group of records with the same size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeGroup {
    /// File size in bytes (shared by all files in this group)
    pub size: u64,
    /// Records with this exact size, in insertion order
    pub files: Vec<FileRecord>,
}

impl SizeGroup {
    /// Create a size group with initial files.
    #[must_use]
    pub fn with_files(size: u64, files: Vec<FileRecord>) -> Self {
        Self { size, files }
    }

    /// Add a record to this group.
    ///
    /// # Panics
    ///
    /// Debug assertion fails if the record size doesn't match the group size.
    pub fn add(&mut self, file: FileRecord) {
        debug_assert_eq!(
            file.size, self.size,
            "File size {} doesn't match group size {}",
            file.size, self.size
        );
        self.files.push(file);
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Confirmed duplicates: records sharing a content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashGroup {
    /// BLAKE3 digest of the shared content
    pub hash: Hash,
    /// File size in bytes
    pub size: u64,
    /// Duplicate records, in insertion order
    pub files: Vec<FileRecord>,
}

impl HashGroup {
    /// Create a hash group; the size is taken from the first member.
    #[must_use]
    pub fn new(hash: Hash, files: Vec<FileRecord>) -> Self {
        let size = files.first().map_or(0, |f| f.size);
        Self { hash, size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Space held by the extra copies (all copies minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Digest as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        crate::scanner::hash_to_hex(&self.hash)
    }

    /// Paths of the files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Statistics from the size selection phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of cataloged files
    pub total_files: usize,
    /// Files sharing a size with at least one other file
    pub potential_duplicates: usize,
    /// Files with a unique size, never hashed
    pub eliminated_unique: usize,
    /// Number of size groups with 2+ files
    pub size_groups: usize,
}

impl GroupingStats {
    /// Derive statistics from the size groups of a catalog holding `total_files`.
    #[must_use]
    pub fn from_size_groups(total_files: usize, groups: &[SizeGroup]) -> Self {
        let potential_duplicates = groups.iter().map(SizeGroup::len).sum();
        Self {
            total_files,
            potential_duplicates,
            eliminated_unique: total_files.saturating_sub(potential_duplicates),
            size_groups: groups.len(),
        }
    }

    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}
