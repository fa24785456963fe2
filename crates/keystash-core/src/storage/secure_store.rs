use tracing::{instrument, warn};

use super::{Namespace, StorageBackend, StoreError};

/// String key/value store over one namespace of a `StorageBackend`.
///
/// The backend handle is acquired in [`SecureStore::open`] and released when
/// the store is dropped. Operations are synchronous and may block on backend
/// I/O; callers that need non-blocking behavior offload them to a worker.
pub struct SecureStore<B: StorageBackend> {
    backend: B,
    handle: B::Handle,
    namespace: Namespace,
}

impl<B: StorageBackend> SecureStore<B> {
    #[instrument(skip(backend), fields(namespace = %namespace))]
    pub fn open(backend: B, namespace: Namespace) -> Result<Self, StoreError> {
        let handle = backend.open(&namespace).inspect_err(|err| {
            warn!(error = %err, "failed to open backend");
        })?;
        Ok(Self {
            backend,
            handle,
            namespace,
        })
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Persist `value` under `key`, replacing any existing value.
    #[instrument(skip(self, value), fields(namespace = %self.namespace))]
    pub fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.backend
            .write(&self.handle, key, value)
            .inspect_err(|err| warn!(error = %err, "write failed"))?;
        Ok(())
    }

    /// Look up `key`. Absence is `Ok(None)`; only backend failures are errors.
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        self.backend
            .read(&self.handle, key)
            .inspect_err(|err| warn!(error = %err, "read failed"))
            .map_err(StoreError::from)
    }

    /// Remove `key` (idempotent).
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.backend
            .delete(&self.handle, key)
            .inspect_err(|err| warn!(error = %err, "delete failed"))?;
        Ok(())
    }
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.contains('\0') {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryBackend;

    fn store() -> SecureStore<InMemoryBackend> {
        let namespace = Namespace::new("test").expect("namespace");
        SecureStore::open(InMemoryBackend::new(), namespace).expect("open")
    }

    #[test]
    fn round_trip_and_overwrite() {
        let store = store();
        store.put("token", "abc123").expect("put");
        assert_eq!(store.get("token").expect("get").as_deref(), Some("abc123"));

        store.put("token", "def456").expect("overwrite");
        assert_eq!(store.get("token").expect("get").as_deref(), Some("def456"));
    }

    #[test]
    fn empty_value_is_stored() {
        let store = store();
        store.put("blank", "").expect("put");
        assert_eq!(store.get("blank").expect("get"), Some(String::new()));
    }

    #[test]
    fn rejects_empty_and_nul_keys() {
        let store = store();
        for key in ["", "a\0b"] {
            let err = store.put(key, "x").expect_err("invalid key");
            assert!(matches!(err, StoreError::InvalidKey { .. }));
        }
        assert!(matches!(
            store.get("").expect_err("invalid key"),
            StoreError::InvalidKey { .. }
        ));
        assert!(matches!(
            store.remove("").expect_err("invalid key"),
            StoreError::InvalidKey { .. }
        ));
    }

    #[test]
    fn remove_is_idempotent() {
        let store = store();
        store.remove("never-written").expect("remove missing");
        store.put("k", "v").expect("put");
        store.remove("k").expect("remove");
        store.remove("k").expect("remove again");
        assert_eq!(store.get("k").expect("get"), None);
    }

    #[test]
    fn open_fails_when_backend_unavailable() {
        let backend = InMemoryBackend::new();
        backend.set_available(false);
        let namespace = Namespace::new("test").expect("namespace");
        let err = SecureStore::open(backend, namespace)
            .err()
            .expect("open should fail");
        assert!(matches!(err, StoreError::BackendUnavailable(_)));
    }
}
