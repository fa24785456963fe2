use thiserror::Error;

/// Failures reported by a `StorageBackend`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The namespace could not be opened (missing key material, bad root, ...).
    #[error("cannot open namespace {namespace}: {reason}")]
    Open { namespace: String, reason: String },
    /// Reading an entry failed for a reason other than absence.
    #[error("read failed: {reason}")]
    Read { reason: String },
    /// Writing or deleting an entry failed.
    #[error("write failed: {reason}")]
    Write { reason: String },
}

impl BackendError {
    pub fn read(reason: impl ToString) -> Self {
        Self::Read {
            reason: reason.to_string(),
        }
    }

    pub fn write(reason: impl ToString) -> Self {
        Self::Write {
            reason: reason.to_string(),
        }
    }
}

/// Errors produced by `SecureStore` operations.
///
/// A missing key is not an error: lookups report absence as `Ok(None)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Key was empty or contained a NUL character; the backend was not touched.
    #[error("invalid key: {key:?}")]
    InvalidKey { key: String },
    /// Namespace name was empty.
    #[error("invalid namespace name: {name:?}")]
    InvalidNamespace { name: String },
    /// The underlying persistence layer could not be opened, read or written.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[from] BackendError),
    /// A stored value could not be decoded into the expected shape.
    #[error("corrupt entry for key {key}: {reason}")]
    CorruptEntry { key: String, reason: String },
}
