//! Result cache for raw classification documents.
//!
//! Entries are keyed by the normalized InChIKey (no `InChIKey=` prefix) and
//! never expire. [`DiskCache`] stores one `<INCHIKEY>.json` file per entry;
//! [`MemoryCache`] keeps entries for the lifetime of the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::identifier::{is_valid_inchikey, normalize_inchikey};

/// Errors raised by a [`ResultCache`].
#[derive(Debug, Error)]
pub enum CacheError {
    /// File system error reading or writing an entry.
    #[error("IO error on cache entry {path}: {source}")]
    Io {
        /// The entry path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// An entry exists but does not hold valid JSON.
    #[error("corrupt cache entry {path}: {source}")]
    Corrupt {
        /// The entry path.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The key is not an InChIKey, so it has no entry path.
    #[error("invalid cache key '{key}'")]
    InvalidKey {
        /// The rejected key.
        key: String,
    },

    /// The value could not be serialized.
    #[error("failed to serialize cache entry for {key}: {source}")]
    Serialize {
        /// The entry key.
        key: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Storage for raw classification documents.
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Returns the stored document for `inchikey`, if any.
    async fn get(&self, inchikey: &str) -> Result<Option<Value>, CacheError>;

    /// Stores `value` under `inchikey`, replacing any previous entry.
    async fn put(&self, inchikey: &str, value: &Value) -> Result<(), CacheError>;
}

fn cache_key(inchikey: &str) -> Result<&str, CacheError> {
    let key = normalize_inchikey(inchikey);
    if is_valid_inchikey(key) {
        Ok(key)
    } else {
        Err(CacheError::InvalidKey {
            key: inchikey.to_string(),
        })
    }
}

/// On-disk cache holding one JSON file per InChIKey.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Creates a cache rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for `inchikey`'s entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidKey`] when `inchikey` is not an InChIKey.
    pub fn path_for(&self, inchikey: &str) -> Result<PathBuf, CacheError> {
        let key = cache_key(inchikey)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl ResultCache for DiskCache {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn get(&self, inchikey: &str) -> Result<Option<Value>, CacheError> {
        let path = self.path_for(inchikey)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        let value = serde_json::from_str(&raw).map_err(|source| CacheError::Corrupt {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "cache hit");
        Ok(Some(value))
    }

    #[instrument(skip(self, value), fields(dir = %self.dir.display()))]
    async fn put(&self, inchikey: &str, value: &Value) -> Result<(), CacheError> {
        let path = self.path_for(inchikey)?;
        let body = serde_json::to_vec(value).map_err(|source| CacheError::Serialize {
            key: inchikey.to_string(),
            source,
        })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| CacheError::Io {
                path: self.dir.clone(),
                source,
            })?;

        // Readers never see a partially written entry.
        let tmp = path.with_extension("json.tmp");
        if let Err(source) = tokio::fs::write(&tmp, &body).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CacheError::Io { path: tmp, source });
        }
        if let Err(source) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CacheError::Io { path, source });
        }

        debug!(path = %path.display(), "cached classification");
        Ok(())
    }
}

/// In-process cache, mainly for tests and short-lived runs.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, inchikey: &str) -> Result<Option<Value>, CacheError> {
        let key = cache_key(inchikey)?;
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, inchikey: &str, value: &Value) -> Result<(), CacheError> {
        let key = cache_key(inchikey)?;
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }
}
