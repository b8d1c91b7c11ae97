//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//! Files are read in fixed 64 KiB chunks so memory use stays bounded
//! regardless of file size. The digest depends only on the byte content,
//! never on how the reads happened to be split.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::HashError;

/// Size of each read when streaming a file into the hasher.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// A 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

/// Computes a content digest for a file.
///
/// Implementations must be deterministic: identical bytes yield identical
/// digests. The duplicate finder holds one behind an `Arc` and calls it from
/// its hashing pool.
pub trait ContentHasher: Send + Sync {
    /// Hash the full content of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or a read fails.
    fn hash(&self, path: &Path) -> Result<Hash, HashError>;
}

/// Streaming BLAKE3 hasher.
#[derive(Debug, Default, Clone)]
pub struct Hasher {
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Hasher {
    /// Create a new hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort in-progress reads once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Hash the entire content of a file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::NotFound`] or [`HashError::PermissionDenied`] when
    /// the file cannot be opened, [`HashError::Io`] when a read fails midway,
    /// and [`HashError::Interrupted`] when shutdown is requested.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.hash_reader(path, file)
    }

    /// Hash everything readable from `reader`. `path` is only used for errors.
    ///
    /// # Errors
    ///
    /// See [`Hasher::full_hash`].
    pub fn hash_reader<R: Read>(&self, path: &Path, mut reader: R) -> Result<Hash, HashError> {
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; CHUNK_SIZE];

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            hasher.update(&buffer[..n]);
        }

        Ok(*hasher.finalize().as_bytes())
    }
}

impl ContentHasher for Hasher {
    fn hash(&self, path: &Path) -> Result<Hash, HashError> {
        log::trace!("Hashing {}", path.display());
        self.full_hash(path)
    }
}

/// Render a digest as 64 lowercase hex characters.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from_bytes(*hash).to_hex().to_string()
}

/// Parse 64 hex characters back into a digest.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Hash> {
    blake3::Hash::from_hex(hex).ok().map(|h| *h.as_bytes())
}
