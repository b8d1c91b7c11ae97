//! SQLite-backed catalog.
//!
//! Records live in a single `files` table. Grouping is done in SQL: a
//! `GROUP BY ... HAVING COUNT(*) > 1` subquery selects colliding keys and the
//! outer query returns their members ordered by key, then `rowid`.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use super::{Catalog, CatalogError, CatalogResult, FileRecord};
use crate::duplicates::{HashGroup, SizeGroup};
use crate::scanner::{hash_to_hex, hex_to_hash, Hash};

const SCHEMA: &str = "
    DROP TABLE IF EXISTS files;
    CREATE TABLE files (
        dir_name    TEXT    NOT NULL,
        file_name   TEXT    NOT NULL,
        file_size   INTEGER NOT NULL,
        file_hash   TEXT
    );
    CREATE UNIQUE INDEX idx_files_location ON files(dir_name, file_name);
    CREATE INDEX idx_files_size ON files(file_size);
    CREATE INDEX idx_files_hash ON files(file_hash);
";

const SELECT_SIZE_GROUPS: &str = "
    SELECT dir_name, file_name, file_size, file_hash
    FROM files
    WHERE file_size IN (
        SELECT file_size FROM files GROUP BY file_size HAVING COUNT(*) > 1
    )
    ORDER BY file_size, rowid
";

const SELECT_HASH_GROUPS: &str = "
    SELECT dir_name, file_name, file_size, file_hash
    FROM files
    WHERE file_hash IN (
        SELECT file_hash FROM files
        WHERE file_hash IS NOT NULL
        GROUP BY file_hash HAVING COUNT(*) > 1
    )
    ORDER BY file_hash, rowid
";

/// Removes the database file once the connection has closed.
#[derive(Debug)]
struct DatabaseFile(PathBuf);

impl Drop for DatabaseFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.0) {
            Ok(()) => log::debug!("Removed catalog database {}", self.0.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove catalog database {}: {}",
                self.0.display(),
                e
            ),
        }
    }
}

/// Catalog stored in a SQLite table.
#[derive(Debug)]
pub struct SqliteCatalog {
    conn: Connection,
    // Declared after `conn` so the connection closes before the file is removed.
    _file: Option<DatabaseFile>,
}

impl SqliteCatalog {
    /// Open a catalog in a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Storage`] if the schema cannot be created.
    pub fn open_in_memory() -> CatalogResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, _file: None })
    }

    /// Create a catalog at `path`, clearing any table left by an earlier run.
    ///
    /// The database file is deleted when the catalog is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Storage`] if the database cannot be opened.
    pub fn create(path: &Path) -> CatalogResult<Self> {
        if path.exists() {
            log::info!("Clearing existing catalog database {}", path.display());
        } else {
            log::debug!("Creating catalog database {}", path.display());
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            _file: Some(DatabaseFile(path.to_path_buf())),
        })
    }

    fn split(path: &Path) -> CatalogResult<(&str, &str)> {
        let unrepresentable = || CatalogError::UnrepresentablePath(path.to_path_buf());
        let dir = path.parent().ok_or_else(unrepresentable)?;
        let name = path.file_name().ok_or_else(unrepresentable)?;
        Ok((
            dir.to_str().ok_or_else(unrepresentable)?,
            name.to_str().ok_or_else(unrepresentable)?,
        ))
    }

    fn read_record(row: &Row<'_>) -> rusqlite::Result<(String, String, i64, Option<String>)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }

    fn to_record(raw: (String, String, i64, Option<String>)) -> CatalogResult<FileRecord> {
        let (dir, name, size, hash) = raw;
        let size = u64::try_from(size)
            .map_err(|_| CatalogError::Corrupt(format!("negative size {size} for {name}")))?;
        let hash = hash.map(|hex| decode_hash(&hex)).transpose()?;
        Ok(FileRecord {
            path: PathBuf::from(dir).join(name),
            size,
            hash,
        })
    }

    fn query_records(&self, sql: &str) -> CatalogResult<Vec<FileRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], Self::read_record)?;
        rows.map(|row| Self::to_record(row?)).collect()
    }
}

fn decode_hash(hex: &str) -> CatalogResult<Hash> {
    hex_to_hash(hex).ok_or_else(|| CatalogError::Corrupt(format!("invalid hash '{hex}'")))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl Catalog for SqliteCatalog {
    fn insert(&mut self, path: &Path, size: u64) -> CatalogResult<()> {
        let (dir, name) = Self::split(path)?;
        let size = i64::try_from(size)
            .map_err(|_| CatalogError::UnrepresentablePath(path.to_path_buf()))?;

        let result = self.conn.execute(
            "INSERT INTO files (dir_name, file_name, file_size, file_hash)
             VALUES (?1, ?2, ?3, NULL)",
            params![dir, name, size],
        );
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(CatalogError::DuplicateKey(path.to_path_buf())),
            Err(e) => Err(e.into()),
        }
    }

    fn set_hash(&mut self, path: &Path, hash: Hash) -> CatalogResult<()> {
        let (dir, name) = Self::split(path).map_err(|_| CatalogError::NotFound(path.to_path_buf()))?;

        let stored: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT file_hash FROM files WHERE dir_name = ?1 AND file_name = ?2",
                params![dir, name],
                |row| row.get(0),
            )
            .optional()?;

        match stored {
            None => Err(CatalogError::NotFound(path.to_path_buf())),
            Some(Some(existing)) => {
                let existing = decode_hash(&existing)?;
                if existing == hash {
                    Ok(())
                } else {
                    Err(CatalogError::conflict(path, &existing, &hash))
                }
            }
            Some(None) => {
                self.conn.execute(
                    "UPDATE files SET file_hash = ?1 WHERE dir_name = ?2 AND file_name = ?3",
                    params![hash_to_hex(&hash), dir, name],
                )?;
                Ok(())
            }
        }
    }

    fn group_by_size(&self) -> CatalogResult<Vec<SizeGroup>> {
        let mut groups: Vec<SizeGroup> = Vec::new();
        for record in self.query_records(SELECT_SIZE_GROUPS)? {
            match groups.last_mut() {
                Some(group) if group.size == record.size => group.add(record),
                _ => groups.push(SizeGroup::with_files(record.size, vec![record])),
            }
        }
        Ok(groups)
    }

    fn group_by_hash(&self) -> CatalogResult<Vec<HashGroup>> {
        let mut groups: Vec<HashGroup> = Vec::new();
        for record in self.query_records(SELECT_HASH_GROUPS)? {
            let hash = record
                .hash
                .ok_or_else(|| CatalogError::Corrupt("hash group member without hash".into()))?;
            match groups.last_mut() {
                Some(group) if group.hash == hash => group.files.push(record),
                _ => groups.push(HashGroup::new(hash, vec![record])),
            }
        }
        Ok(groups)
    }

    fn get(&self, path: &Path) -> CatalogResult<Option<FileRecord>> {
        let Ok((dir, name)) = Self::split(path) else {
            return Ok(None);
        };
        let raw = self
            .conn
            .query_row(
                "SELECT dir_name, file_name, file_size, file_hash
                 FROM files WHERE dir_name = ?1 AND file_name = ?2",
                params![dir, name],
                Self::read_record,
            )
            .optional()?;
        raw.map(Self::to_record).transpose()
    }

    fn len(&self) -> CatalogResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| CatalogError::Corrupt(format!("row count {count}")))
    }
}
