use super::{BackendError, Namespace};

/// Capability set a persistence medium must provide to back a `SecureStore`.
///
/// Implementations must make `write` and `delete` atomic per key: a reader
/// sees either the previous value or the new one, never a partial write.
/// The store adds no locking of its own.
pub trait StorageBackend: Send + Sync {
    /// Resource acquired once per namespace and held for the store's lifetime.
    type Handle: Send + Sync;

    fn open(&self, namespace: &Namespace) -> Result<Self::Handle, BackendError>;

    /// Persist `value` under `key`, replacing any existing value.
    fn write(&self, handle: &Self::Handle, key: &str, value: &str) -> Result<(), BackendError>;

    /// Look up `key`; `Ok(None)` when it is absent.
    fn read(&self, handle: &Self::Handle, key: &str) -> Result<Option<String>, BackendError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn delete(&self, handle: &Self::Handle, key: &str) -> Result<(), BackendError>;
}
