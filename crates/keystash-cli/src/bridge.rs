use std::sync::Arc;

use async_trait::async_trait;
use color_eyre::Result;
use keystash_core::{
    credentials::{CredentialSlot, Credentials},
    storage::{SecureStore, StorageBackend, StoreError},
};

/// Async face of the store for the command layer. Every call completes on a
/// worker thread so backend I/O never blocks the runtime.
#[async_trait]
pub trait KeychainBridge: Send + Sync {
    async fn protect(&self, key: String, value: String) -> Result<()>;

    async fn unprotect(&self, key: String) -> Result<Option<String>>;

    async fn remove(&self, key: String) -> Result<()>;

    async fn save_credentials(&self, slot: CredentialSlot, credentials: Credentials)
        -> Result<()>;

    async fn load_credentials(&self, slot: CredentialSlot) -> Result<Option<Credentials>>;

    async fn reset_credentials(&self, slot: CredentialSlot) -> Result<()>;
}

/// Runs a synchronous `SecureStore` on tokio's blocking pool.
pub struct BlockingBridge<B: StorageBackend> {
    store: Arc<SecureStore<B>>,
}

impl<B> BlockingBridge<B>
where
    B: StorageBackend + 'static,
    B::Handle: 'static,
{
    pub fn new(store: SecureStore<B>) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&SecureStore<B>) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let value = tokio::task::spawn_blocking(move || op(&*store)).await??;
        Ok(value)
    }
}

#[async_trait]
impl<B> KeychainBridge for BlockingBridge<B>
where
    B: StorageBackend + 'static,
    B::Handle: 'static,
{
    async fn protect(&self, key: String, value: String) -> Result<()> {
        self.run(move |store| store.put(&key, &value)).await
    }

    async fn unprotect(&self, key: String) -> Result<Option<String>> {
        self.run(move |store| store.get(&key)).await
    }

    async fn remove(&self, key: String) -> Result<()> {
        self.run(move |store| store.remove(&key)).await
    }

    async fn save_credentials(
        &self,
        slot: CredentialSlot,
        credentials: Credentials,
    ) -> Result<()> {
        self.run(move |store| store.set_credentials(&slot, &credentials))
            .await
    }

    async fn load_credentials(&self, slot: CredentialSlot) -> Result<Option<Credentials>> {
        self.run(move |store| store.credentials(&slot)).await
    }

    async fn reset_credentials(&self, slot: CredentialSlot) -> Result<()> {
        self.run(move |store| store.reset_credentials(&slot)).await
    }
}

#[cfg(test)]
mod tests {
    use keystash_core::storage::{InMemoryBackend, Namespace};

    use super::*;

    fn bridge(backend: InMemoryBackend) -> BlockingBridge<InMemoryBackend> {
        let namespace = Namespace::new("bridge-test").expect("namespace");
        BlockingBridge::new(SecureStore::open(backend, namespace).expect("open"))
    }

    #[tokio::test]
    async fn protect_unprotect_remove() {
        let bridge = bridge(InMemoryBackend::new());
        bridge
            .protect("token".into(), "abc123".into())
            .await
            .expect("protect");
        assert_eq!(
            bridge.unprotect("token".into()).await.expect("unprotect"),
            Some("abc123".to_string())
        );

        bridge.remove("token".into()).await.expect("remove");
        bridge.remove("token".into()).await.expect("remove again");
        assert_eq!(bridge.unprotect("token".into()).await.expect("unprotect"), None);
    }

    #[tokio::test]
    async fn store_errors_surface_as_typed_reports() {
        let backend = InMemoryBackend::new();
        let bridge = bridge(backend.clone());
        backend.set_writable(false);

        let report = bridge
            .protect("k".into(), "v".into())
            .await
            .expect_err("read-only backend");
        assert!(matches!(
            report.downcast_ref::<StoreError>(),
            Some(StoreError::BackendUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn credentials_through_bridge() {
        let bridge = bridge(InMemoryBackend::new());
        let slot = CredentialSlot::generic(None::<String>);
        bridge
            .save_credentials(slot.clone(), Credentials::new("sam", "pw"))
            .await
            .expect("save");
        assert_eq!(
            bridge.load_credentials(slot.clone()).await.expect("load"),
            Some(Credentials::new("sam", "pw"))
        );
        bridge.reset_credentials(slot.clone()).await.expect("reset");
        assert_eq!(bridge.load_credentials(slot).await.expect("load"), None);
    }
}
