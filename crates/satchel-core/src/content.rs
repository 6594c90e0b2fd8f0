//! # Content Storage Port
//!
//! Where file bytes live. The vault records the location token a backend
//! hands out and never interprets it.
//!
//! Encryption is the storage device's business. The backends here keep a
//! BLAKE3 digest of the passphrase next to each payload and refuse to hand
//! the bytes back under a different passphrase.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Errors raised by a content storage backend.
#[derive(Debug, Error)]
pub enum ContentError {
    /// No payload is stored under the location token.
    #[error("No content at location {0}")]
    NotFound(String),

    /// The passphrase does not match the one the payload was stored with.
    #[error("Passphrase rejected for location {0}")]
    PassphraseRejected(String),

    /// The backend failed.
    #[error("Content I/O error: {0}")]
    Io(String),
}

/// The byte-storage collaborator.
pub trait ContentStorage: Send + Sync {
    /// Store a payload and return its location token.
    fn store_bytes(&self, payload: &[u8], passphrase: &str) -> Result<String, ContentError>;

    /// Fetch the payload stored under `location`.
    fn retrieve_bytes(&self, location: &str, passphrase: &str) -> Result<Vec<u8>, ContentError>;

    /// Remove the payload stored under `location`.
    fn delete_bytes(&self, location: &str) -> Result<(), ContentError>;
}

impl<T: ContentStorage + ?Sized> ContentStorage for Arc<T> {
    fn store_bytes(&self, payload: &[u8], passphrase: &str) -> Result<String, ContentError> {
        (**self).store_bytes(payload, passphrase)
    }

    fn retrieve_bytes(&self, location: &str, passphrase: &str) -> Result<Vec<u8>, ContentError> {
        (**self).retrieve_bytes(location, passphrase)
    }

    fn delete_bytes(&self, location: &str) -> Result<(), ContentError> {
        (**self).delete_bytes(location)
    }
}

fn passphrase_digest(passphrase: &str) -> [u8; 32] {
    *blake3::hash(passphrase.as_bytes()).as_bytes()
}

// =============================================================================
// IN-MEMORY BACKEND
// =============================================================================

#[derive(Debug, Default)]
struct MemoryContents {
    next_token: u64,
    payloads: BTreeMap<String, ([u8; 32], Vec<u8>)>,
}

/// Volatile content storage.
#[derive(Debug, Default)]
pub struct MemoryContentStorage {
    inner: Mutex<MemoryContents>,
}

impl MemoryContentStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of payloads currently held.
    pub fn len(&self) -> Result<usize, ContentError> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| ContentError::Io(e.to_string()))?;
        Ok(inner.payloads.len())
    }

    pub fn is_empty(&self) -> Result<bool, ContentError> {
        Ok(self.len()? == 0)
    }
}

impl ContentStorage for MemoryContentStorage {
    fn store_bytes(&self, payload: &[u8], passphrase: &str) -> Result<String, ContentError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| ContentError::Io(e.to_string()))?;
        inner.next_token = inner.next_token.saturating_add(1);
        let token = format!("mem-{:016x}", inner.next_token);
        inner
            .payloads
            .insert(token.clone(), (passphrase_digest(passphrase), payload.to_vec()));
        Ok(token)
    }

    fn retrieve_bytes(&self, location: &str, passphrase: &str) -> Result<Vec<u8>, ContentError> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| ContentError::Io(e.to_string()))?;
        let (digest, payload) = inner
            .payloads
            .get(location)
            .ok_or_else(|| ContentError::NotFound(location.to_string()))?;
        if *digest != passphrase_digest(passphrase) {
            return Err(ContentError::PassphraseRejected(location.to_string()));
        }
        Ok(payload.clone())
    }

    fn delete_bytes(&self, location: &str) -> Result<(), ContentError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| ContentError::Io(e.to_string()))?;
        inner
            .payloads
            .remove(location)
            .map(|_| ())
            .ok_or_else(|| ContentError::NotFound(location.to_string()))
    }
}

// =============================================================================
// DIRECTORY BACKEND
// =============================================================================

/// Content storage writing one file per payload into a directory.
///
/// Each file is the 32-byte passphrase digest followed by the payload.
#[derive(Debug)]
pub struct DirectoryContentStorage {
    root: PathBuf,
    counter: AtomicU64,
}

impl DirectoryContentStorage {
    /// Use `root` as the content directory, creating it if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ContentError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| ContentError::Io(e.to_string()))?;
        Ok(Self {
            root,
            counter: AtomicU64::new(0),
        })
    }

    fn path_of(&self, location: &str) -> Result<PathBuf, ContentError> {
        // Tokens are hex; anything else could escape the root
        if location.is_empty() || !location.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ContentError::NotFound(location.to_string()));
        }
        Ok(self.root.join(location))
    }

    fn fresh_token(&self, payload: &[u8]) -> String {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut hasher = blake3::Hasher::new();
        hasher.update(&nanos.to_le_bytes());
        hasher.update(&count.to_le_bytes());
        hasher.update(payload);
        hasher.finalize().to_hex()[..32].to_string()
    }
}

impl ContentStorage for DirectoryContentStorage {
    fn store_bytes(&self, payload: &[u8], passphrase: &str) -> Result<String, ContentError> {
        let token = self.fresh_token(payload);
        let mut bytes = Vec::with_capacity(payload.len().saturating_add(32));
        bytes.extend_from_slice(&passphrase_digest(passphrase));
        bytes.extend_from_slice(payload);
        fs::write(self.path_of(&token)?, bytes).map_err(|e| ContentError::Io(e.to_string()))?;
        Ok(token)
    }

    fn retrieve_bytes(&self, location: &str, passphrase: &str) -> Result<Vec<u8>, ContentError> {
        let path = self.path_of(location)?;
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ContentError::NotFound(location.to_string()),
            _ => ContentError::Io(e.to_string()),
        })?;
        let (digest, payload) = bytes
            .split_at_checked(32)
            .ok_or_else(|| ContentError::Io(format!("truncated content file {}", location)))?;
        if digest != passphrase_digest(passphrase).as_slice() {
            return Err(ContentError::PassphraseRejected(location.to_string()));
        }
        Ok(payload.to_vec())
    }

    fn delete_bytes(&self, location: &str) -> Result<(), ContentError> {
        fs::remove_file(self.path_of(location)?).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ContentError::NotFound(location.to_string()),
            _ => ContentError::Io(e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_round_trip_and_delete() {
        let storage = MemoryContentStorage::new();
        assert!(storage.is_empty().expect("empty"));
        let token = storage.store_bytes(b"hello", "pw").expect("store");

        assert_eq!(storage.len().expect("len"), 1);
        assert_eq!(storage.retrieve_bytes(&token, "pw").expect("get"), b"hello");
        storage.delete_bytes(&token).expect("delete");
        assert!(storage.is_empty().expect("empty"));
        assert!(matches!(
            storage.retrieve_bytes(&token, "pw"),
            Err(ContentError::NotFound(_))
        ));
    }

    #[test]
    fn wrong_passphrase_rejected() {
        let storage = MemoryContentStorage::new();
        let token = storage.store_bytes(b"secret", "right").expect("store");
        assert!(matches!(
            storage.retrieve_bytes(&token, "wrong"),
            Err(ContentError::PassphraseRejected(_))
        ));
    }

    #[test]
    fn directory_backend_stores_files() {
        let temp = tempdir().expect("temp dir");
        let storage = DirectoryContentStorage::open(temp.path().join("content")).expect("open");

        let a = storage.store_bytes(b"same", "pw").expect("store");
        let b = storage.store_bytes(b"same", "pw").expect("store");
        assert_ne!(a, b);

        assert_eq!(storage.retrieve_bytes(&a, "pw").expect("get"), b"same");
        storage.delete_bytes(&a).expect("delete");
        assert!(storage.retrieve_bytes(&a, "pw").is_err());
        assert_eq!(storage.retrieve_bytes(&b, "pw").expect("get"), b"same");
    }

    #[test]
    fn directory_backend_rejects_path_tokens() {
        let temp = tempdir().expect("temp dir");
        let storage = DirectoryContentStorage::open(temp.path()).expect("open");
        assert!(matches!(
            storage.retrieve_bytes("../etc/passwd", ""),
            Err(ContentError::NotFound(_))
        ));
    }
}
