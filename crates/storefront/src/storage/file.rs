//! Filesystem storage backend.
//!
//! Each key maps to one JSON file in a directory. Writes go to a temporary
//! file that is renamed over the target, so a crash never leaves a
//! half-written cart behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tracing::debug;

use super::{CartStorage, StorageError, StorageKey};

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the cart files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &StorageKey) -> Result<PathBuf, StorageError> {
        Ok(self.dir.join(format!("{}.json", file_stem(key)?)))
    }
}

/// Map a key onto a safe file name.
///
/// `:` is not portable in file names and is escaped as `%3A`. Anything else
/// outside `[A-Za-z0-9._-]` is rejected, as are keys starting with `.`.
fn file_stem(key: &StorageKey) -> Result<String, StorageError> {
    let raw = key.as_str();
    if raw.is_empty() || raw.starts_with('.') {
        return Err(StorageError::InvalidKey(raw.to_string()));
    }

    let mut stem = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            ':' => stem.push_str("%3A"),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => stem.push(c),
            _ => return Err(StorageError::InvalidKey(raw.to_string())),
        }
    }
    Ok(stem)
}

#[async_trait]
impl CartStorage for FileStorage {
    async fn load(&self, key: &StorageKey) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    async fn save(&self, key: &StorageKey, value: Value) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(&value).map_err(StorageError::Serialize)?;

        fs::create_dir_all(&self.dir).await?;
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &path).await?;
        debug!(key = %key, path = %path.display(), "Saved cart file");
        Ok(())
    }

    async fn remove(&self, key: &StorageKey) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
