//! Instrumented secret stores.

use std::sync::atomic::{AtomicUsize, Ordering};

use layered_config::{Mapping, MemorySecretStore, SecretStore, StoreError};

/// A store whose every read fails with a fixed message.
#[derive(Clone, Debug)]
pub struct FailingStore {
    message: String,
}

impl FailingStore {
    /// Create a store failing with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl SecretStore for FailingStore {
    fn read(&self, _path: &str) -> Result<Option<Mapping>, StoreError> {
        Err(self.message.clone().into())
    }
}

/// Wraps a [`MemorySecretStore`] and counts the reads made against it.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemorySecretStore,
    reads: AtomicUsize,
}

impl CountingStore {
    /// Count reads made against `inner`.
    #[must_use]
    pub const fn new(inner: MemorySecretStore) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
        }
    }

    /// Number of reads so far.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl SecretStore for CountingStore {
    fn read(&self, path: &str) -> Result<Option<Mapping>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(path)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn failing_store_reports_its_message() {
        let err = FailingStore::new("sealed").read("secret/app").err();
        assert_eq!(err.map(|e| e.to_string()).as_deref(), Some("sealed"));
    }

    #[test]
    fn counting_store_delegates_and_counts() {
        let store = CountingStore::new(
            MemorySecretStore::new().with_secret("secret/app", [("token", json!("t"))]),
        );
        assert!(matches!(store.read("secret/app"), Ok(Some(_))));
        assert!(matches!(store.read("secret/none"), Ok(None)));
        assert_eq!(store.reads(), 2);
    }
}
