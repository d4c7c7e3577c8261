//! Credential storage port and the in-memory adapter
//!
//! Stores key records by normalized credential ID. Query results come back in
//! the natural order of the bundled stores: most recently used first.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::record::CredentialRecord;
use crate::webauthn::credential_id::normalize;

/// Errors raised by credential stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialize: {0}")]
    Serialization(String),
    #[error("Encrypt: {0}")]
    Encryption(String),
    #[error("Credential not found: {0}")]
    NotFound(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Signature counter exhausted: {0}")]
    CounterExhausted(String),
}

/// Persistence port for passkey records
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact lookup by normalized credential ID
    async fn get_by_normalized_id(&self, id: &str)
        -> Result<Option<CredentialRecord>, StoreError>;

    async fn get_all_by_rp_id(&self, rp_id: &str) -> Result<Vec<CredentialRecord>, StoreError>;

    async fn get_all_discoverable(&self) -> Result<Vec<CredentialRecord>, StoreError>;

    async fn get_all(&self) -> Result<Vec<CredentialRecord>, StoreError>;

    /// Insert a record, replacing any record with the same credential ID
    async fn insert(&self, record: CredentialRecord) -> Result<(), StoreError>;

    /// Reserve the next signature counter value for an assertion
    ///
    /// Increments `sign_count` and `use_count` and sets `last_used_at` in one
    /// step under the store's write lock, returning the new `sign_count`.
    /// Concurrent callers for the same credential always get distinct values.
    async fn increment_sign_count(&self, id: &str, timestamp: i64) -> Result<u32, StoreError>;

    /// Remove a record; returns whether one existed
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Cheap connectivity probe used to warm the store up
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Table key for a credential ID in any encoding
fn table_key(id: &str) -> String {
    normalize(id).unwrap_or_default()
}

/// Keyed record table shared by the bundled stores
///
/// Records are keyed and stored under their normalized credential ID.
#[derive(Debug, Default, Clone)]
pub struct RecordTable {
    records: HashMap<String, CredentialRecord>,
}

impl RecordTable {
    #[must_use]
    pub fn from_records(records: Vec<CredentialRecord>) -> Self {
        let mut table = Self::default();
        for record in records {
            table.insert(record);
        }
        table
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<CredentialRecord> {
        self.records.get(&table_key(id)).cloned()
    }

    /// Records matching `filter`, most recently used first
    pub fn query<F>(&self, filter: F) -> Vec<CredentialRecord>
    where
        F: Fn(&CredentialRecord) -> bool,
    {
        let mut matches: Vec<CredentialRecord> =
            self.records.values().filter(|r| filter(r)).cloned().collect();
        matches.sort_by(|a, b| {
            b.last_used_at
                .cmp(&a.last_used_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.credential_id.cmp(&b.credential_id))
        });
        matches
    }

    /// All records in natural order
    #[must_use]
    pub fn to_records(&self) -> Vec<CredentialRecord> {
        self.query(|_| true)
    }

    /// Insert a record under its normalized ID, replacing any existing one
    pub fn insert(&mut self, mut record: CredentialRecord) {
        let key = table_key(&record.credential_id);
        record.credential_id.clone_from(&key);
        self.records.insert(key, record);
    }

    /// Advance the signature counter of a record and return the new value
    ///
    /// # Errors
    /// `StoreError::NotFound` if no record has this ID,
    /// `StoreError::CounterExhausted` if the counter is already at `u32::MAX`
    pub fn increment_sign_count(&mut self, id: &str, timestamp: i64) -> Result<u32, StoreError> {
        let record = self
            .records
            .get_mut(&table_key(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let sign_count = record
            .sign_count
            .checked_add(1)
            .ok_or_else(|| StoreError::CounterExhausted(record.credential_id.clone()))?;
        record.sign_count = sign_count;
        record.last_used_at = timestamp;
        record.use_count = record.use_count.saturating_add(1);
        Ok(sign_count)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.records.remove(&table_key(id)).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    table: RwLock<RecordTable>,
}

impl InMemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records
    #[must_use]
    pub fn with_records(records: Vec<CredentialRecord>) -> Self {
        Self {
            table: RwLock::new(RecordTable::from_records(records)),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
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
        self.table.write().await.insert(record);
        Ok(())
    }

    async fn increment_sign_count(&self, id: &str, timestamp: i64) -> Result<u32, StoreError> {
        self.table.write().await.increment_sign_count(id, timestamp)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.table.write().await.remove(id))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passkey::record::{PrivateKeyMaterial, SyncStatus};

    fn record(id: &str, rp_id: &str, last_used_at: i64, discoverable: bool) -> CredentialRecord {
        CredentialRecord {
            credential_id: id.to_string(),
            rp_id: rp_id.to_string(),
            rp_name: rp_id.to_string(),
            user_id: "dXNlcg".to_string(),
            user_name: "alice".to_string(),
            user_display_name: "Alice".to_string(),
            public_key: Vec::new(),
            private_key: PrivateKeyMaterial::KeystoreAlias("alias".to_string()),
            algorithm: -7,
            created_at: 0,
            last_used_at,
            use_count: 0,
            sign_count: 0,
            is_discoverable: discoverable,
            sync_status: SyncStatus::None,
            transports: vec!["internal".to_string()],
            aaguid: None,
            bound_item_id: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_queries_are_most_recent_first() {
        let store = InMemoryCredentialStore::with_records(vec![
            record("a", "example.com", 10, true),
            record("b", "example.com", 30, false),
            record("c", "other.org", 20, true),
        ]);

        let ids = |records: Vec<CredentialRecord>| {
            records.into_iter().map(|r| r.credential_id).collect::<Vec<_>>()
        };
        assert_eq!(ids(store.get_all().await.unwrap()), vec!["b", "c", "a"]);
        assert_eq!(ids(store.get_all_by_rp_id("example.com").await.unwrap()), vec!["b", "a"]);
        assert_eq!(ids(store.get_all_discoverable().await.unwrap()), vec!["c", "a"]);
    }

    #[tokio::test]
    async fn test_insert_replaces_on_conflict() {
        let store = InMemoryCredentialStore::new();
        store.insert(record("a", "example.com", 1, true)).await.unwrap();
        let mut replacement = record("a", "example.com", 2, true);
        replacement.user_name = "bob".to_string();
        store.insert(replacement).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].user_name, "bob");
    }

    #[tokio::test]
    async fn test_increment_sign_count() {
        let store = InMemoryCredentialStore::with_records(vec![record("a", "rp", 1, true)]);
        assert_eq!(store.increment_sign_count("a", 99).await.unwrap(), 1);
        assert_eq!(store.increment_sign_count("a", 100).await.unwrap(), 2);

        let updated = store.get_by_normalized_id("a").await.unwrap().unwrap();
        assert_eq!(updated.last_used_at, 100);
        assert_eq!(updated.sign_count, 2);
        assert_eq!(updated.use_count, 2);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_distinct() {
        let store = std::sync::Arc::new(InMemoryCredentialStore::with_records(vec![record(
            "a", "rp", 1, true,
        )]));

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.increment_sign_count("a", i).await.unwrap() })
            })
            .collect();
        let mut counts = Vec::new();
        for task in tasks {
            counts.push(task.await.unwrap());
        }
        counts.sort_unstable();

        assert_eq!(counts, (1..=16).collect::<Vec<u32>>());
        let stored = store.get_by_normalized_id("a").await.unwrap().unwrap();
        assert_eq!(stored.sign_count, 16);
        assert_eq!(stored.use_count, 16);
    }

    #[tokio::test]
    async fn test_increment_sign_count_exhausted() {
        let mut exhausted = record("a", "rp", 1, true);
        exhausted.sign_count = u32::MAX;
        let store = InMemoryCredentialStore::with_records(vec![exhausted]);

        assert!(matches!(
            store.increment_sign_count("a", 2).await,
            Err(StoreError::CounterExhausted(_))
        ));
        let stored = store.get_by_normalized_id("a").await.unwrap().unwrap();
        assert_eq!(stored.sign_count, u32::MAX);
        assert_eq!(stored.last_used_at, 1);
        assert_eq!(stored.use_count, 0);
    }

    #[tokio::test]
    async fn test_increment_sign_count_unknown_id() {
        let store = InMemoryCredentialStore::new();
        assert!(matches!(
            store.increment_sign_count("missing", 1).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ids_are_keyed_in_normalized_form() {
        // Standard alphabet with padding; canonical form is unpadded Base64URL
        let store = InMemoryCredentialStore::new();
        store.insert(record("+/+/AQ==", "rp", 1, true)).await.unwrap();

        let stored = store.get_by_normalized_id("-_-_AQ").await.unwrap().unwrap();
        assert_eq!(stored.credential_id, "-_-_AQ");
        assert!(store.get_by_normalized_id("+/+/AQ").await.unwrap().is_some());
        assert_eq!(store.increment_sign_count("+/+/AQ==", 5).await.unwrap(), 1);
        assert!(store.delete("-_-_AQ").await.unwrap());
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryCredentialStore::with_records(vec![record("a", "rp", 1, true)]);
        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert!(store.get_all().await.unwrap().is_empty());
    }
}
