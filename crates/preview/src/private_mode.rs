//! Private-browsing detection.
//!
//! Probes the persistent storage backend once with a write-then-delete. Any
//! failure means persistent storage is unusable; the answer is cached for
//! the lifetime of the detector (one page load).

use std::sync::{Arc, OnceLock};

use crate::storage::StorageBackend;

const PROBE_KEY: &str = "__cadenza_storage_probe__";

pub struct PrivateModeDetector {
    probe: Arc<dyn StorageBackend>,
    cached: OnceLock<bool>,
}

impl PrivateModeDetector {
    /// Detector probing `persistent`, normally the persistent storage backend.
    pub fn new(persistent: Arc<dyn StorageBackend>) -> Self {
        Self {
            probe: persistent,
            cached: OnceLock::new(),
        }
    }

    /// `true` when persistent storage is unusable. Never fails.
    pub fn detect(&self) -> bool {
        *self.cached.get_or_init(|| self.probe_once())
    }

    fn probe_once(&self) -> bool {
        let result = self
            .probe
            .write(PROBE_KEY, "1", None)
            .and_then(|()| self.probe.remove(PROBE_KEY));

        match result {
            Ok(()) => {
                tracing::debug!(backend = self.probe.kind().as_str(), "Persistent storage usable");
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "Persistent storage unusable, assuming private mode");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BackendKind, MemoryStorage};

    #[test]
    fn usable_storage_is_not_private() {
        let storage = Arc::new(MemoryStorage::persistent());
        let detector = PrivateModeDetector::new(storage.clone());
        assert!(!detector.detect());
        assert!(storage.peek(PROBE_KEY).is_none(), "probe must clean up after itself");
    }

    #[test]
    fn failing_storage_is_private() {
        let storage = Arc::new(MemoryStorage::restricted(BackendKind::Persistent));
        assert!(PrivateModeDetector::new(storage).detect());
    }

    #[test]
    fn quota_error_counts_as_private() {
        let storage = Arc::new(MemoryStorage::persistent().with_capacity(0));
        assert!(PrivateModeDetector::new(storage).detect());
    }

    #[test]
    fn result_is_cached_for_the_session() {
        let storage = Arc::new(MemoryStorage::persistent());
        let detector = PrivateModeDetector::new(storage.clone());
        assert!(!detector.detect());

        storage.set_available(false);
        assert!(!detector.detect(), "second call must reuse the first probe");
    }
}
