use std::{
    fs::{self, File},
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
};

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use keystash_core::storage::{BackendError, Namespace, StorageBackend};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::key_provider::{DataKey, KeyProvider};

/// AES-GCM encrypted file-backed `StorageBackend`.
///
/// Layout: `<root>/<namespace>/<key>`, each path component the hex SHA-256 of
/// the name, so every key maps to a fixed-length, valid file name. The data
/// key is fetched from the `KeyProvider` (OS keyring in production) when a
/// namespace is opened.
pub struct EncryptedFileBackend<P: KeyProvider> {
    root: PathBuf,
    key_provider: P,
}

impl<P: KeyProvider> EncryptedFileBackend<P> {
    pub fn new(root: impl Into<PathBuf>, key_provider: P) -> Self {
        Self {
            root: root.into(),
            key_provider,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Open namespace: its directory and a cipher keyed for it.
pub struct FileNamespace {
    name: String,
    dir: PathBuf,
    cipher: Aes256Gcm,
}

impl FileNamespace {
    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(encode_component(key))
    }

    /// Associated data binding a blob to its namespace and key. Keys never
    /// contain NUL, so the split point is unambiguous.
    fn aad_for(&self, key: &str) -> Vec<u8> {
        let mut aad = Vec::with_capacity(self.name.len() + 1 + key.len());
        aad.extend_from_slice(self.name.as_bytes());
        aad.push(0);
        aad.extend_from_slice(key.as_bytes());
        aad
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredBlob {
    nonce: String,
    ciphertext: String,
}

impl<P: KeyProvider> StorageBackend for EncryptedFileBackend<P> {
    type Handle = FileNamespace;

    #[instrument(skip(self), fields(root = ?self.root))]
    fn open(&self, namespace: &Namespace) -> Result<Self::Handle, BackendError> {
        let open_err = |reason: String| BackendError::Open {
            namespace: namespace.to_string(),
            reason,
        };

        let dir = self.root.join(encode_component(namespace.as_str()));
        fs::create_dir_all(&dir).map_err(|e| open_err(e.to_string()))?;

        let data_key = self
            .key_provider
            .load_or_generate()
            .map_err(|e| open_err(format!("key provider: {e}")))?;
        let cipher = build_cipher(&data_key).map_err(open_err)?;

        debug!(?dir, fingerprint = %data_key.fingerprint(), "opened encrypted namespace");
        Ok(FileNamespace {
            name: namespace.to_string(),
            dir,
            cipher,
        })
    }

    #[instrument(skip_all)]
    fn write(&self, handle: &Self::Handle, key: &str, value: &str) -> Result<(), BackendError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let aad = handle.aad_for(key);
        let payload = Payload {
            msg: value.as_bytes(),
            aad: &aad,
        };
        let ciphertext = handle
            .cipher
            .encrypt(&nonce, payload)
            .map_err(|e| BackendError::write(format!("encrypt failed: {e}")))?;

        let blob = StoredBlob {
            nonce: URL_SAFE_NO_PAD.encode(nonce.as_slice()),
            ciphertext: URL_SAFE_NO_PAD.encode(ciphertext),
        };
        write_blob(&handle.path_for(key), &blob)
    }

    #[instrument(skip_all)]
    fn read(&self, handle: &Self::Handle, key: &str) -> Result<Option<String>, BackendError> {
        let Some(blob) = read_blob(&handle.path_for(key))? else {
            return Ok(None);
        };

        let nonce_bytes = URL_SAFE_NO_PAD
            .decode(blob.nonce)
            .map_err(|e| BackendError::read(format!("nonce decode failed: {e}")))?;
        if nonce_bytes.len() != 12 {
            return Err(BackendError::read(format!(
                "nonce must be 12 bytes, got {}",
                nonce_bytes.len()
            )));
        }
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = URL_SAFE_NO_PAD
            .decode(blob.ciphertext)
            .map_err(|e| BackendError::read(format!("ciphertext decode failed: {e}")))?;

        let aad = handle.aad_for(key);
        let payload = Payload {
            msg: ciphertext.as_ref(),
            aad: &aad,
        };
        let plaintext = handle
            .cipher
            .decrypt(nonce, payload)
            .map_err(|e| BackendError::read(format!("decrypt failed: {e}")))?;

        String::from_utf8(plaintext)
            .map(Some)
            .map_err(|e| BackendError::read(format!("value is not utf-8: {e}")))
    }

    #[instrument(skip_all)]
    fn delete(&self, handle: &Self::Handle, key: &str) -> Result<(), BackendError> {
        match fs::remove_file(handle.path_for(key)) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(BackendError::write(err)),
        }
    }
}

/// Write through a temp file in the same directory, then rename over the
/// destination so readers never observe a partial blob.
fn write_blob(path: &Path, blob: &StoredBlob) -> Result<(), BackendError> {
    let parent = path
        .parent()
        .ok_or_else(|| BackendError::write("invalid storage path"))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(BackendError::write)?;
    let json = serde_json::to_vec(blob).map_err(BackendError::write)?;
    tmp.write_all(&json).map_err(BackendError::write)?;
    tmp.as_file().sync_all().map_err(BackendError::write)?;
    tmp.persist(path).map_err(|e| BackendError::write(e.error))?;
    Ok(())
}

fn read_blob(path: &Path) -> Result<Option<StoredBlob>, BackendError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(BackendError::read(err)),
    };

    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(BackendError::read)?;
    serde_json::from_slice(&buf)
        .map(Some)
        .map_err(BackendError::read)
}

fn build_cipher(data_key: &DataKey) -> Result<Aes256Gcm, String> {
    Aes256Gcm::new_from_slice(data_key.as_bytes()).map_err(|e| format!("cipher init failed: {e}"))
}

fn encode_component(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
