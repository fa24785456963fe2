use keyring::Entry;
use keystash_core::storage::{BackendError, Namespace, StorageBackend};
use tracing::instrument;

/// Backend storing each entry as an OS keyring item: the namespace is the
/// keyring service and the entry key is the account.
#[derive(Debug, Default, Clone)]
pub struct KeyringBackend;

impl KeyringBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Keyring service name a namespace was opened as.
#[derive(Debug, Clone)]
pub struct KeyringService {
    service: String,
}

impl KeyringService {
    fn entry(&self, key: &str) -> Result<Entry, keyring::Error> {
        Entry::new(&self.service, key)
    }
}

impl StorageBackend for KeyringBackend {
    type Handle = KeyringService;

    fn open(&self, namespace: &Namespace) -> Result<Self::Handle, BackendError> {
        Ok(KeyringService {
            service: namespace.to_string(),
        })
    }

    #[instrument(skip_all)]
    fn write(&self, handle: &Self::Handle, key: &str, value: &str) -> Result<(), BackendError> {
        handle
            .entry(key)
            .and_then(|entry| entry.set_password(value))
            .map_err(BackendError::write)
    }

    #[instrument(skip_all)]
    fn read(&self, handle: &Self::Handle, key: &str) -> Result<Option<String>, BackendError> {
        let entry = handle.entry(key).map_err(BackendError::read)?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(BackendError::read(err)),
        }
    }

    #[instrument(skip_all)]
    fn delete(&self, handle: &Self::Handle, key: &str) -> Result<(), BackendError> {
        let entry = handle.entry(key).map_err(BackendError::write)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(BackendError::write(err)),
        }
    }
}
