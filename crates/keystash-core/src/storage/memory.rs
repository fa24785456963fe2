use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use super::{BackendError, Namespace, StorageBackend};

type Entries = HashMap<String, String>;

/// Process-local backend for tests and ephemeral sessions.
///
/// Clones share the same namespaces, so two stores opened over clones of one
/// backend observe each other's writes the way two instances over the same
/// preference file would. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBackend {
    inner: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    namespaces: Mutex<HashMap<String, Entries>>,
    available: AtomicBool,
    writable: AtomicBool,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            namespaces: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            writable: AtomicBool::new(true),
        }
    }
}

/// Handle naming the namespace a store was opened on.
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    namespace: String,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// When false, `open`, `read`, `write` and `delete` all fail.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// When false, `write` and `delete` fail while reads keep working.
    pub fn set_writable(&self, writable: bool) {
        self.inner.writable.store(writable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.inner.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::read("backend offline"))
        }
    }

    fn check_writable(&self) -> Result<(), BackendError> {
        self.check_available().map_err(|_| BackendError::write("backend offline"))?;
        if self.inner.writable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::write("backend is read-only"))
        }
    }

    /// Run `f` under the namespace lock; `on_poison` shapes the error for the
    /// calling operation.
    fn with_namespaces<T>(
        &self,
        on_poison: impl FnOnce(String) -> BackendError,
        f: impl FnOnce(&mut HashMap<String, Entries>) -> T,
    ) -> Result<T, BackendError> {
        let mut guard = self
            .inner
            .namespaces
            .lock()
            .map_err(|err| on_poison(format!("lock poisoned: {err}")))?;
        Ok(f(&mut guard))
    }
}

impl StorageBackend for InMemoryBackend {
    type Handle = MemoryHandle;

    fn open(&self, namespace: &Namespace) -> Result<Self::Handle, BackendError> {
        self.check_available().map_err(|err| BackendError::Open {
            namespace: namespace.to_string(),
            reason: err.to_string(),
        })?;
        let on_poison = |reason| BackendError::Open {
            namespace: namespace.to_string(),
            reason,
        };
        self.with_namespaces(on_poison, |namespaces| {
            namespaces.entry(namespace.to_string()).or_default();
        })?;
        Ok(MemoryHandle {
            namespace: namespace.to_string(),
        })
    }

    fn write(&self, handle: &Self::Handle, key: &str, value: &str) -> Result<(), BackendError> {
        self.check_writable()?;
        self.with_namespaces(BackendError::write, |namespaces| {
            namespaces
                .entry(handle.namespace.clone())
                .or_default()
                .insert(key.to_string(), value.to_string());
        })
    }

    fn read(&self, handle: &Self::Handle, key: &str) -> Result<Option<String>, BackendError> {
        self.check_available()?;
        self.with_namespaces(BackendError::read, |namespaces| {
            namespaces
                .get(&handle.namespace)
                .and_then(|entries| entries.get(key))
                .cloned()
        })
    }

    fn delete(&self, handle: &Self::Handle, key: &str) -> Result<(), BackendError> {
        self.check_writable()?;
        self.with_namespaces(BackendError::write, |namespaces| {
            if let Some(entries) = namespaces.get_mut(&handle.namespace) {
                entries.remove(key);
            }
        })
    }
}
