//! Durable `StorageBackend` implementations.
//! The encrypted file backend uses AES-GCM with a data key sourced from the OS
//! keyring (or a test double); the keyring backend stores entries in the
//! keyring directly.

pub mod encrypted_file;
pub mod key_provider;
pub mod keyring_backend;
