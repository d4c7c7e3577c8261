//! Encrypted single-file credential store
//!
//! The whole record table is kept in memory and rewritten on every mutation as
//! one AES-256-GCM blob (`nonce ‖ ciphertext`, Base64URL). Writes go to a
//! sibling temp file which is then renamed over the store file.

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use super::record::CredentialRecord;
use super::store::{CredentialStore, RecordTable, StoreError};
use crate::utils::crypto::{decrypt_data, derive_encryption_key, encrypt_data, ENCRYPTION_KEY_SIZE};

const FORMAT_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct StoredTable {
    version: u8,
    records: Vec<CredentialRecord>,
}

/// Credential store persisted to an encrypted file
pub struct EncryptedFileStore {
    path: PathBuf,
    key: [u8; ENCRYPTION_KEY_SIZE],
    table: RwLock<RecordTable>,
}

impl EncryptedFileStore {
    /// Open the store at `path`, decrypting it with a key derived from `key_material`
    ///
    /// A missing file is an empty store; it is created on the first write.
    ///
    /// # Errors
    /// Returns `StoreError` if the file exists but cannot be read, decrypted or parsed
    pub fn open(path: impl Into<PathBuf>, key_material: &[u8]) -> Result<Self, StoreError> {
        let path = path.into();
        let key = derive_encryption_key(key_material);

        let table = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let stored: StoredTable = decrypt_data(&contents, &key)
                .map_err(|e| StoreError::Encryption(format!("{e:#}")))?;
            if stored.version != FORMAT_VERSION {
                return Err(StoreError::Serialization(format!(
                    "Unsupported store version {}",
                    stored.version
                )));
            }
            info!(
                "🔐 Loaded {} passkey record(s) from {}",
                stored.records.len(),
                path.display()
            );
            RecordTable::from_records(stored.records)
        } else {
            info!("🔐 No passkey store at {}, starting empty", path.display());
            RecordTable::default()
        };

        Ok(Self {
            path,
            key,
            table: RwLock::new(table),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encrypt `table` and replace the store file with it
    ///
    /// Callers hold the table write guard across this call so file writes
    /// never interleave.
    async fn persist(&self, table: &RecordTable) -> Result<(), StoreError> {
        let stored = StoredTable {
            version: FORMAT_VERSION,
            records: table.to_records(),
        };
        let encrypted = encrypt_data(&stored, &self.key)
            .map_err(|e| StoreError::Encryption(format!("{e:#}")))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, encrypted.as_bytes()))
            .await
            .map_err(|e| StoreError::Unavailable(format!("Store writer failed: {e}")))??;

        debug!("Persisted {} passkey record(s)", table.len());
        Ok(())
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl CredentialStore for EncryptedFileStore {
    async fn get_by_normalized_id(
        &self,
        id: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.table.read().await.get(id))
    }

    async fn get_all_by_rp_id(&self, rp_id: &str) -> Result<Vec<CredentialRecord>, StoreError> {
        Ok(self.table.read().await.query(|r| r.rp_id == rp_id))
    }

    async fn get_all_discoverable(&self) -> Result<Vec<CredentialRecord>, StoreError> {
        Ok(self.table.read().await.query(|r| r.is_discoverable))
    }

    async fn get_all(&self) -> Result<Vec<CredentialRecord>, StoreError> {
        Ok(self.table.read().await.to_records())
    }

    async fn insert(&self, record: CredentialRecord) -> Result<(), StoreError> {
        let mut table = self.table.write().await;
        let mut updated = table.clone();
        updated.insert(record);
        self.persist(&updated).await?;
        *table = updated;
        Ok(())
    }

    async fn increment_sign_count(&self, id: &str, timestamp: i64) -> Result<u32, StoreError> {
        let mut table = self.table.write().await;
        let mut updated = table.clone();
        let sign_count = updated.increment_sign_count(id, timestamp)?;
        self.persist(&updated).await?;
        *table = updated;
        Ok(sign_count)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut table = self.table.write().await;
        let mut updated = table.clone();
        if !updated.remove(id) {
            return Ok(false);
        }
        self.persist(&updated).await?;
        *table = updated;
        Ok(true)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        drop(self.table.read().await);
        Ok(())
    }
}
