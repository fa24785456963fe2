use std::{path::PathBuf, sync::Arc};

use crate::{
    bridge::{BlockingBridge, KeychainBridge},
    config::{BackendKind, Config},
};
use color_eyre::Result;
use dirs::data_dir;
use keystash_core::storage::{Namespace, SecureStore};
use keystash_storage::{
    encrypted_file::EncryptedFileBackend, key_provider::KeyringProvider,
    keyring_backend::KeyringBackend,
};
use tracing::debug;

const APPLICATION_ID: &str = "keystash";
const DATA_KEY_ACCOUNT: &str = "data-key";
const HEALTH_SUFFIX: &str = ".health";

/// Resolve the default data directory for Keystash.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join(APPLICATION_ID))
}

/// Namespace from config, or the one derived from the application id.
pub fn namespace_from_config(config: &Config) -> Result<Namespace> {
    let namespace = match &config.namespace {
        Some(name) => Namespace::new(name.clone())?,
        None => Namespace::for_application(APPLICATION_ID)?,
    };
    Ok(namespace)
}

/// Namespace the health probe writes to, next to the user's own.
pub fn health_namespace(config: &Config) -> Result<Namespace> {
    let namespace = namespace_from_config(config)?;
    Ok(Namespace::new(format!("{namespace}{HEALTH_SUFFIX}"))?)
}

/// Open the configured store and wrap it for async callers.
pub fn bridge_from_config(config: &Config) -> Result<Arc<dyn KeychainBridge>> {
    open_bridge(config, namespace_from_config(config)?)
}

/// Same backend as `bridge_from_config`, over the health namespace, so a
/// probe never touches user entries.
pub fn health_bridge_from_config(config: &Config) -> Result<Arc<dyn KeychainBridge>> {
    open_bridge(config, health_namespace(config)?)
}

fn open_bridge(config: &Config, namespace: Namespace) -> Result<Arc<dyn KeychainBridge>> {
    match config.backend {
        BackendKind::EncryptedFile => {
            let root = match &config.data_dir {
                Some(root) => root.clone(),
                None => default_data_dir()?,
            };
            debug!(?root, %namespace, "initializing encrypted store");
            let backend = EncryptedFileBackend::new(
                root,
                KeyringProvider::new(APPLICATION_ID, DATA_KEY_ACCOUNT),
            );
            let store = SecureStore::open(backend, namespace)?;
            Ok(Arc::new(BlockingBridge::new(store)))
        }
        BackendKind::Keyring => {
            debug!(%namespace, "initializing keyring store");
            let store = SecureStore::open(KeyringBackend::new(), namespace)?;
            Ok(Arc::new(BlockingBridge::new(store)))
        }
    }
}

/// Helper for tests to construct a bridge over a temp dir with an in-memory key.
#[cfg(test)]
pub fn test_bridge(
    root: impl Into<PathBuf>,
) -> BlockingBridge<EncryptedFileBackend<keystash_storage::key_provider::InMemoryKeyProvider>> {
    let backend = EncryptedFileBackend::new(
        root,
        keystash_storage::key_provider::InMemoryKeyProvider::default(),
    );
    let namespace = Namespace::for_application(APPLICATION_ID).expect("namespace");
    BlockingBridge::new(SecureStore::open(backend, namespace).expect("open test store"))
}
