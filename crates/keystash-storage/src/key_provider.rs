use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

pub const DATA_KEY_LEN: usize = 32;

/// AES-256 data key. `Debug` prints a fingerprint, never the key bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct DataKey([u8; DATA_KEY_LEN]);

impl DataKey {
    pub fn generate() -> Self {
        let mut bytes = [0u8; DATA_KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DATA_KEY_LEN] {
        &self.0
    }

    /// First four bytes of the key's SHA-256, hex encoded; safe to log.
    pub fn fingerprint(&self) -> String {
        hex::encode(&Sha256::digest(self.0)[..4])
    }

    fn to_secret(&self) -> String {
        STANDARD.encode(self.0)
    }

    fn from_secret(secret: &str) -> Result<Self, KeyError> {
        let raw = STANDARD.decode(secret.trim())?;
        let bytes: [u8; DATA_KEY_LEN] = raw
            .try_into()
            .map_err(|raw: Vec<u8>| KeyError::Length(raw.len()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DataKey").field(&self.fingerprint()).finish()
    }
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("keyring: {0}")]
    Keyring(#[from] keyring::Error),
    #[error("stored data key is not base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("stored data key has {0} bytes, expected {DATA_KEY_LEN}")]
    Length(usize),
}

/// Source of the data key for encryption at rest.
pub trait KeyProvider: Send + Sync {
    /// Return the persisted key, creating and persisting one on first use.
    fn load_or_generate(&self) -> Result<DataKey, KeyError>;
}

/// Keeps the data key in the OS keystore under `service`/`account`.
pub struct KeyringProvider {
    service: String,
    account: String,
}

impl KeyringProvider {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }
}

impl KeyProvider for KeyringProvider {
    fn load_or_generate(&self) -> Result<DataKey, KeyError> {
        let entry = keyring::Entry::new(&self.service, &self.account)?;
        match entry.get_password() {
            Ok(secret) => DataKey::from_secret(&secret),
            // Only a missing entry gets a fresh key.
            Err(keyring::Error::NoEntry) => {
                let key = DataKey::generate();
                entry.set_password(&key.to_secret())?;
                debug!(service = %self.service, fingerprint = %key.fingerprint(), "stored new data key");
                Ok(key)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Process-local provider for tests and ephemeral sessions. Clones share the key.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyProvider {
    key: Arc<OnceLock<DataKey>>,
}

impl KeyProvider for InMemoryKeyProvider {
    fn load_or_generate(&self) -> Result<DataKey, KeyError> {
        Ok(self.key.get_or_init(DataKey::generate).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_provider_is_stable_across_clones() {
        let provider = InMemoryKeyProvider::default();
        let first = provider.load_or_generate().unwrap();
        let second = provider.clone().load_or_generate().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn separate_memory_providers_differ() {
        let a = InMemoryKeyProvider::default().load_or_generate().unwrap();
        let b = InMemoryKeyProvider::default().load_or_generate().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn debug_hides_key_bytes() {
        let key = DataKey([0xAB; DATA_KEY_LEN]);
        assert_eq!(
            format!("{key:?}"),
            format!("DataKey({:?})", key.fingerprint())
        );
        assert_eq!(key.fingerprint().len(), 8);
    }

    #[test]
    fn secret_with_wrong_length_is_rejected() {
        let err = DataKey::from_secret("abcd").expect_err("three bytes");
        assert!(matches!(err, KeyError::Length(3)));
        assert!(matches!(
            DataKey::from_secret("not base64!"),
            Err(KeyError::Encoding(_))
        ));
    }

    #[test]
    #[ignore = "needs an OS keystore"]
    fn keyring_provider_returns_the_persisted_key() {
        let service = format!("keystash-test-{}", std::process::id());
        let first = KeyringProvider::new(&service, "data-key")
            .load_or_generate()
            .expect("generate");
        // A fresh provider stands in for a restarted process.
        let second = KeyringProvider::new(&service, "data-key")
            .load_or_generate()
            .expect("load");
        assert_eq!(first, second);

        keyring::Entry::new(&service, "data-key")
            .and_then(|entry| entry.delete_credential())
            .expect("cleanup");
    }
}
