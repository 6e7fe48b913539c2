//! Write-once page memo: an on-disk JSON file per request, fronted by `DashMap`.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use md5::{Digest, Md5};
use patent_client_api::RequestParams;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::error::PatentClientError;

/// Memo of raw responses keyed by namespace and request parameters.
///
/// Entries never expire. The first response stored for a key is the one
/// served from then on, for this process and every later one sharing the
/// directory.
pub struct PageCache {
    dir: PathBuf,
    memory: DashMap<String, String>,
}

impl PageCache {
    /// Opens (creating if needed) a cache rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PatentClientError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            PatentClientError::Cache(format!(
                "cannot create cache directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self {
            dir,
            memory: DashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<namespace>-<md5 of the sorted parameter JSON>`.
    pub fn key(namespace: &str, params: &RequestParams) -> String {
        // RequestParams is a BTreeMap, so its JSON form is key-sorted.
        let canonical = serde_json::to_string(params).unwrap_or_default();
        let digest = Md5::digest(canonical.as_bytes());
        format!("{}-{}", namespace, hex::encode(digest))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>, PatentClientError> {
        if let Some(text) = self.memory.get(key) {
            tracing::debug!("Cache hit (memory): {}", key);
            return decode(key, &text).map(Some);
        }
        let path = self.path_for(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value = match decode(key, &text) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Discarding {}: {}", path.display(), e);
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
                return Ok(None);
            }
        };
        tracing::debug!("Cache hit (disk): {}", path.display());
        self.memory.insert(key.to_string(), text);
        Ok(Some(value))
    }

    /// Stores `value` unless an entry already exists for `key`.
    ///
    /// The entry is written to a temporary file and linked into place, so a
    /// reader never sees a partial entry.
    pub fn put(&self, key: &str, value: &Value) -> Result<(), PatentClientError> {
        let text = serde_json::to_string_pretty(value)?;
        let path = self.path_for(key);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(text.as_bytes())?;
        match tmp.persist_noclobber(&path) {
            Ok(_) => tracing::debug!("Cached {}", path.display()),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!("Cache entry {} already written", key);
            }
            Err(e) => return Err(e.error.into()),
        }
        self.memory.entry(key.to_string()).or_insert(text);
        Ok(())
    }

    /// Returns the memoized value for `key`, running `fetch` on a miss.
    pub fn get_or_fetch<F>(&self, key: &str, fetch: F) -> Result<Value, PatentClientError>
    where
        F: FnOnce() -> Result<Value, PatentClientError>,
    {
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }
        tracing::debug!("Cache miss: {}", key);
        let value = fetch()?;
        self.put(key, &value)?;
        Ok(value)
    }
}

fn decode(key: &str, text: &str) -> Result<Value, PatentClientError> {
    serde_json::from_str(text)
        .map_err(|e| PatentClientError::Cache(format!("corrupt cache entry {}: {}", key, e)))
}
