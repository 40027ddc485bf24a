//! Durable storage for documents.
//!
//! [`DocumentStore`] is the single seam between the editor and wherever
//! documents live. The autosave bridge talks only to this trait, so a local
//! file and a remote service are driven the same way.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::DocumentState;

/// Storage key used when none is given.
pub const DEFAULT_STORAGE_KEY: &str = "image-text-composer-state";

/// Errors that can occur while saving or loading a document.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The stored document could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The backend refused the request.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A place documents are saved to and loaded from.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist `document`, replacing whatever was stored before.
    ///
    /// # Errors
    ///
    /// Returns an error if the document could not be stored. The previously
    /// stored document must remain readable in that case.
    async fn save(&self, document: &DocumentState) -> Result<(), PersistError>;

    /// Load the stored document, or `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored data cannot be read or parsed.
    async fn load(&self) -> Result<Option<DocumentState>, PersistError>;
}

/// Stores one document as a JSON file.
///
/// Writes go to a sibling temp file that is then renamed over the target, so
/// a failed save never leaves a truncated document behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store at an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under `dir`, in a file named after `key`.
    #[must_use]
    pub fn for_key(dir: impl AsRef<Path>, key: &str) -> Self {
        Self::new(dir.as_ref().join(format!("{}.json", sanitize_filename(key))))
    }

    /// Store under `dir` with the default key.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::for_key(dir, DEFAULT_STORAGE_KEY)
    }

    /// The file this store writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn save(&self, document: &DocumentState) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(document)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
                tracing::warn!("Failed to remove {}: {cleanup}", temp.display());
            }
            return Err(e.into());
        }
        Ok(())
    }

    async fn load(&self) -> Result<Option<DocumentState>, PersistError> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut document: DocumentState = serde_json::from_str(&json)?;
        document.sanitize();
        Ok(Some(document))
    }
}

#[derive(Debug, Default)]
struct MemorySlot {
    json: Mutex<Option<String>>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

/// Keeps the saved document in memory.
///
/// Clones share the same slot, so a test can hand one clone to the autosave
/// bridge and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<MemorySlot>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.slot.saves.load(Ordering::SeqCst)
    }

    /// Make every following save and load fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.slot.failing.store(failing, Ordering::SeqCst);
    }

    /// The stored document, parsed.
    #[must_use]
    pub fn stored(&self) -> Option<DocumentState> {
        let json = self
            .slot
            .json
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()?;
        DocumentState::from_json(&json).ok()
    }

    fn check_available(&self) -> Result<(), PersistError> {
        if self.slot.failing.load(Ordering::SeqCst) {
            return Err(PersistError::Unavailable("memory store is failing".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn save(&self, document: &DocumentState) -> Result<(), PersistError> {
        self.check_available()?;
        let json = serde_json::to_string(document)?;
        *self
            .slot
            .json
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(json);
        self.slot.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self) -> Result<Option<DocumentState>, PersistError> {
        self.check_available()?;
        let json = self
            .slot
            .json
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match json {
            Some(json) => {
                let mut document: DocumentState = serde_json::from_str(&json)?;
                document.sanitize();
                Ok(Some(document))
            }
            None => Ok(None),
        }
    }
}

/// Sanitize a storage key for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Layer, TextStyle};

    fn sample() -> DocumentState {
        let mut doc = DocumentState::default();
        doc.add_layer(Layer::text(TextStyle::new("Saved")).with_id("t1"))
            .expect("add");
        doc
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("image-text-composer-state"), "image-text-composer-state");
        assert_eq!(sanitize_filename("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_filename("a b"), "a_b");
    }

    #[test]
    fn test_for_key_builds_json_path() {
        let store = FileStore::in_dir("/tmp/composer");
        assert_eq!(
            store.path(),
            Path::new("/tmp/composer/image-text-composer-state.json")
        );
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::for_key(dir.path().join("nested"), "project 1");

        assert!(store.load().await.expect("load empty").is_none());
        store.save(&sample()).await.expect("save");

        let loaded = store.load().await.expect("load").expect("document");
        assert_eq!(loaded, sample());
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::in_dir(dir.path());
        std::fs::write(store.path(), "not json").expect("write");
        assert!(matches!(
            store.load().await,
            Err(PersistError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_store_failure_injection() {
        let store = MemoryStore::new();
        store.save(&sample()).await.expect("save");
        assert_eq!(store.saves(), 1);

        store.set_failing(true);
        assert!(store.save(&DocumentState::default()).await.is_err());
        assert_eq!(store.saves(), 1);
        assert_eq!(store.stored(), Some(sample()));

        store.set_failing(false);
        let shared = store.clone();
        assert_eq!(shared.load().await.expect("load"), Some(sample()));
    }
}
