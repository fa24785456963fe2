//! Username/password pairs stored as JSON documents in a `SecureStore`.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::storage::{SecureStore, StorageBackend, StoreError};

const DEFAULT_SERVICE: &str = "default";

/// Stored login combination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Where a set of credentials lives in the key space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSlot {
    /// Generic password for a service; `None` selects the default service.
    Generic { service: Option<String> },
    /// Credentials for a remote server.
    Internet { server: String },
}

impl CredentialSlot {
    pub fn generic(service: Option<impl Into<String>>) -> Self {
        Self::Generic {
            service: service.map(Into::into),
        }
    }

    pub fn internet(server: impl Into<String>) -> Self {
        Self::Internet {
            server: server.into(),
        }
    }

    /// Store key backing this slot.
    pub fn storage_key(&self) -> String {
        match self {
            Self::Generic { service } => {
                let service = service
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .unwrap_or(DEFAULT_SERVICE);
                format!("generic-{service}")
            }
            Self::Internet { server } => format!("internet-{server}"),
        }
    }
}

impl<B: StorageBackend> SecureStore<B> {
    /// Save credentials into `slot`, replacing whatever was there.
    #[instrument(skip(self, credentials))]
    pub fn set_credentials(
        &self,
        slot: &CredentialSlot,
        credentials: &Credentials,
    ) -> Result<(), StoreError> {
        let key = slot.storage_key();
        let body = serde_json::to_string(credentials).map_err(|e| StoreError::CorruptEntry {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.put(&key, &body)
    }

    /// Load credentials from `slot`; `Ok(None)` when nothing is stored.
    #[instrument(skip(self))]
    pub fn credentials(&self, slot: &CredentialSlot) -> Result<Option<Credentials>, StoreError> {
        let key = slot.storage_key();
        let Some(body) = self.get(&key)? else {
            return Ok(None);
        };
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| StoreError::CorruptEntry {
                key,
                reason: e.to_string(),
            })
    }

    /// Clear `slot` (idempotent).
    #[instrument(skip(self))]
    pub fn reset_credentials(&self, slot: &CredentialSlot) -> Result<(), StoreError> {
        self.remove(&slot.storage_key())
    }
}
