//! Key/value storage backends available to a preview client.
//!
//! A browser offers three places to keep a credential: cookies, persistent
//! storage (survives restarts, often blocked in private browsing) and
//! session-scoped storage. Each is a [`StorageBackend`] tagged with a
//! [`BackendKind`] so callers can poll them as a priority-ordered list.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use cadenza_core::types::Timestamp;

/// Capability tag of a storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Cookies: usable in private mode, expiry enforced by the jar itself.
    Cookie,
    /// Persistent storage: unusable in private/restricted mode.
    Persistent,
    /// Session-scoped storage: last resort, cleared with the tab.
    Session,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cookie => "cookie",
            Self::Persistent => "persistent",
            Self::Session => "session",
        }
    }

    /// Whether the backend must be skipped when private mode is detected.
    pub fn needs_persistent_storage(self) -> bool {
        matches!(self, Self::Persistent)
    }

    /// Whether the backend drops expired entries on its own.
    ///
    /// Backends without native expiry need an explicit expiry key next to
    /// each record.
    pub fn has_native_expiry(self) -> bool {
        matches!(self, Self::Cookie)
    }
}

/// A storage backend refused an operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("{0} storage is unavailable")]
    Unavailable(&'static str),

    #[error("{0} storage quota exceeded")]
    QuotaExceeded(&'static str),
}

/// Synchronous key/value store with an optional per-entry expiry.
///
/// Backends without native expiry ignore `expires_at`.
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn write(&self, key: &str, value: &str, expires_at: Option<Timestamp>)
        -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// In-process key/value storage standing in for persistent or session storage.
///
/// Can be switched to "unavailable" to reproduce private-browsing behaviour,
/// where every call fails.
pub struct MemoryStorage {
    kind: BackendKind,
    entries: Mutex<HashMap<String, String>>,
    available: AtomicBool,
    capacity: Option<usize>,
    reads: AtomicUsize,
}

impl MemoryStorage {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            entries: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            capacity: None,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn persistent() -> Self {
        Self::new(BackendKind::Persistent)
    }

    pub fn session() -> Self {
        Self::new(BackendKind::Session)
    }

    /// Storage that rejects every operation, as in private browsing.
    pub fn restricted(kind: BackendKind) -> Self {
        let storage = Self::new(kind);
        storage.set_available(false);
        storage
    }

    /// Limit the number of distinct keys; further inserts fail with
    /// [`StorageError::QuotaExceeded`].
    pub fn with_capacity(mut self, max_entries: usize) -> Self {
        self.capacity = Some(max_entries);
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of `read` calls served or refused so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Inspect a raw entry without going through the backend contract.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    /// Place a raw entry without going through the backend contract.
    pub fn seed(&self, key: &str, value: &str) {
        self.entries().insert(key.to_string(), value.to_string());
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_available(&self) -> Result<(), StorageError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable(self.kind.as_str()))
        }
    }
}

impl StorageBackend for MemoryStorage {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;
        Ok(self.entries().get(key).cloned())
    }

    fn write(
        &self,
        key: &str,
        value: &str,
        _expires_at: Option<Timestamp>,
    ) -> Result<(), StorageError> {
        self.ensure_available()?;
        let mut entries = self.entries();
        if let Some(capacity) = self.capacity {
            if !entries.contains_key(key) && entries.len() >= capacity {
                return Err(StorageError::QuotaExceeded(self.kind.as_str()));
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.ensure_available()?;
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn memory_storage_round_trip() {
        let storage = MemoryStorage::persistent();
        storage.write("k", "v", None).unwrap();
        assert_eq!(storage.read("k").unwrap().as_deref(), Some("v"));
        storage.remove("k").unwrap();
        assert_eq!(storage.read("k").unwrap(), None);
        assert_eq!(storage.read_count(), 2);
    }

    #[test]
    fn restricted_storage_fails_every_call() {
        let storage = MemoryStorage::restricted(BackendKind::Persistent);
        assert_matches!(storage.write("k", "v", None), Err(StorageError::Unavailable("persistent")));
        assert_matches!(storage.read("k"), Err(StorageError::Unavailable(_)));
        assert_matches!(storage.remove("k"), Err(StorageError::Unavailable(_)));
    }

    #[test]
    fn capacity_limits_new_keys_only() {
        let storage = MemoryStorage::session().with_capacity(1);
        storage.write("a", "1", None).unwrap();
        storage.write("a", "2", None).unwrap();
        assert_matches!(storage.write("b", "1", None), Err(StorageError::QuotaExceeded("session")));
    }

    #[test]
    fn kind_capabilities() {
        assert!(BackendKind::Persistent.needs_persistent_storage());
        assert!(!BackendKind::Cookie.needs_persistent_storage());
        assert!(BackendKind::Cookie.has_native_expiry());
        assert!(!BackendKind::Session.has_native_expiry());
    }
}
