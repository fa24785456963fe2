//! Namespaced string key/value storage over a pluggable backend.

mod backend;
mod error;
mod memory;
mod namespace;
mod secure_store;

pub use backend::StorageBackend;
pub use error::{BackendError, StoreError};
pub use memory::{InMemoryBackend, MemoryHandle};
pub use namespace::Namespace;
pub use secure_store::SecureStore;
