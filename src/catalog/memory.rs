//! In-memory catalog backend.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use super::{Catalog, CatalogError, CatalogResult, FileRecord};
use crate::duplicates::{HashGroup, SizeGroup};
use crate::scanner::Hash;

/// Catalog held entirely in memory.
///
/// Records live in insertion order; the size and digest indexes store record
/// positions in ascending order, so group members come out in insertion order
/// without sorting at query time.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    records: Vec<FileRecord>,
    index: HashMap<PathBuf, usize>,
    by_size: BTreeMap<u64, Vec<usize>>,
    by_hash: BTreeMap<Hash, Vec<usize>>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn members(&self, positions: &[usize]) -> Vec<FileRecord> {
        positions.iter().map(|&i| self.records[i].clone()).collect()
    }
}

impl Catalog for MemoryCatalog {
    fn insert(&mut self, path: &Path, size: u64) -> CatalogResult<()> {
        if self.index.contains_key(path) {
            return Err(CatalogError::DuplicateKey(path.to_path_buf()));
        }
        let position = self.records.len();
        self.records.push(FileRecord::new(path.to_path_buf(), size));
        self.index.insert(path.to_path_buf(), position);
        self.by_size.entry(size).or_default().push(position);
        Ok(())
    }

    fn set_hash(&mut self, path: &Path, hash: Hash) -> CatalogResult<()> {
        let position = *self
            .index
            .get(path)
            .ok_or_else(|| CatalogError::NotFound(path.to_path_buf()))?;

        let record = &mut self.records[position];
        match record.hash {
            Some(existing) if existing == hash => return Ok(()),
            Some(existing) => return Err(CatalogError::conflict(path, &existing, &hash)),
            None => record.hash = Some(hash),
        }

        // Hashes may be stored out of insertion order; keep positions sorted.
        let positions = self.by_hash.entry(hash).or_default();
        let at = positions.partition_point(|&p| p < position);
        positions.insert(at, position);
        Ok(())
    }

    fn group_by_size(&self) -> CatalogResult<Vec<SizeGroup>> {
        Ok(self
            .by_size
            .iter()
            .filter(|(_, positions)| positions.len() > 1)
            .map(|(&size, positions)| SizeGroup::with_files(size, self.members(positions)))
            .collect())
    }

    fn group_by_hash(&self) -> CatalogResult<Vec<HashGroup>> {
        Ok(self
            .by_hash
            .iter()
            .filter(|(_, positions)| positions.len() > 1)
            .map(|(&hash, positions)| HashGroup::new(hash, self.members(positions)))
            .collect())
    }

    fn get(&self, path: &Path) -> CatalogResult<Option<FileRecord>> {
        Ok(self.index.get(path).map(|&i| self.records[i].clone()))
    }

    fn len(&self) -> CatalogResult<usize> {
        Ok(self.records.len())
    }
}
