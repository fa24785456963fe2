//! Core abstractions for Keystash: the namespaced key/value store contract,
//! the backend interface it persists through, and the credential layer on top.
//! Concrete durable backends live in `keystash-storage`.

pub mod credentials;
pub mod storage;
