//! Content hashing for duplicate reports
//!
//! Hashes never cause a track to be skipped or merged. They only feed
//! warnings about files whose content is already in the library.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::Mutex;
use tunekeep_core::{ContentHasher, Result, Track, TuneError};

/// Buffer size for hashing (1MB)
const BUFFER_SIZE: usize = 1024 * 1024;

/// SHA-256 over the whole file, hex encoded
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn hash_file(&self, path: &Path) -> Result<String> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; BUFFER_SIZE];

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hex::encode(hasher.finalize()))
    }
}

/// Run a hasher on the blocking pool
pub async fn hash_file(hasher: Arc<dyn ContentHasher>, path: &Path) -> Result<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || hasher.hash_file(&path))
        .await
        .map_err(|e| TuneError::Io(std::io::Error::other(e)))?
}

#[derive(Debug, Clone)]
struct CachedHash {
    len: u64,
    modified: Option<SystemTime>,
    hash: String,
}

/// Finds files with identical content, caching hashes by size and mtime
pub struct DuplicateFinder {
    hasher: Arc<dyn ContentHasher>,
    cache: Mutex<HashMap<PathBuf, CachedHash>>,
}

impl DuplicateFinder {
    pub fn new(hasher: Arc<dyn ContentHasher>) -> Self {
        Self {
            hasher,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn sha256() -> Self {
        Self::new(Arc::new(Sha256Hasher))
    }

    /// Hash of a file, reusing the cached value while size and mtime match
    pub async fn hash(&self, path: &Path) -> Result<String> {
        let meta = tokio::fs::metadata(path).await?;
        let len = meta.len();
        let modified = meta.modified().ok();

        if let Some(cached) = self.cache.lock().await.get(path) {
            if cached.len == len && cached.modified == modified {
                return Ok(cached.hash.clone());
            }
        }

        let hash = hash_file(Arc::clone(&self.hasher), path).await?;
        self.cache.lock().await.insert(
            path.to_path_buf(),
            CachedHash {
                len,
                modified,
                hash: hash.clone(),
            },
        );
        Ok(hash)
    }

    /// Hash `candidate` and list the tracks in `pool` with the same content
    pub async fn duplicates_of(&self, candidate: &Path, pool: &[Track]) -> Result<(String, Vec<Track>)> {
        let hash = self.hash(candidate).await?;
        let mut duplicates = Vec::new();

        for track in pool {
            if track.path() == candidate {
                continue;
            }
            match self.hash(track.path()).await {
                Ok(other) if other == hash => duplicates.push(track.clone()),
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(track = %track, error = %e, "Could not hash track");
                }
            }
        }

        Ok((hash, duplicates))
    }
}
