//! Fluent builders for creating customizable test objects

use chrono::Utc;

use crate::passkey::{CredentialRecord, PrivateKeyMaterial, SyncStatus};
use crate::webauthn::credential_id;
use crate::webauthn::crypto::{generate_credential_id, generate_key_pair, spki_from_point};
use crate::webauthn::ALG_ES256;

use super::constants::{TEST_DISPLAY_NAME, TEST_RP_NAME, TEST_USER_ID, TEST_USER_NAME};

/// Builder for stored passkeys backed by a freshly generated P-256 key
pub struct CredentialRecordBuilder {
    record: CredentialRecord,
}

impl CredentialRecordBuilder {
    /// Create a usable ES256 record for `rp_id` with a random ID
    ///
    /// # Panics
    ///
    /// Panics if key generation fails.
    #[must_use]
    pub fn new(rp_id: &str) -> Self {
        let raw_id = generate_credential_id().unwrap();
        let key_pair = generate_key_pair().unwrap();
        let now = Utc::now().timestamp_millis();

        Self {
            record: CredentialRecord {
                credential_id: credential_id::from_raw(&raw_id),
                rp_id: rp_id.to_string(),
                rp_name: TEST_RP_NAME.to_string(),
                user_id: TEST_USER_ID.to_string(),
                user_name: TEST_USER_NAME.to_string(),
                user_display_name: TEST_DISPLAY_NAME.to_string(),
                public_key: spki_from_point(&key_pair.public_point).unwrap(),
                private_key: PrivateKeyMaterial::Raw(key_pair.pkcs8),
                algorithm: ALG_ES256,
                created_at: now,
                last_used_at: now,
                use_count: 0,
                sign_count: 0,
                is_discoverable: true,
                sync_status: SyncStatus::None,
                transports: vec!["internal".to_string()],
                aaguid: None,
                bound_item_id: None,
                notes: None,
            },
        }
    }

    /// Store the record under this (possibly non-canonical) ID
    #[must_use]
    pub fn credential_id(mut self, id: &str) -> Self {
        self.record.credential_id = id.to_string();
        self
    }

    #[must_use]
    pub fn rp_name(mut self, name: &str) -> Self {
        self.record.rp_name = name.to_string();
        self
    }

    #[must_use]
    pub fn user_name(mut self, name: &str) -> Self {
        self.record.user_name = name.to_string();
        self
    }

    #[must_use]
    pub fn display_name(mut self, name: &str) -> Self {
        self.record.user_display_name = name.to_string();
        self
    }

    #[must_use]
    pub fn discoverable(mut self, discoverable: bool) -> Self {
        self.record.is_discoverable = discoverable;
        self
    }

    #[must_use]
    pub fn sync_status(mut self, status: SyncStatus) -> Self {
        self.record.sync_status = status;
        self
    }

    #[must_use]
    pub fn sign_count(mut self, count: u32) -> Self {
        self.record.sign_count = count;
        self
    }

    #[must_use]
    pub fn last_used_at(mut self, millis: i64) -> Self {
        self.record.last_used_at = millis;
        self
    }

    #[must_use]
    pub fn private_key(mut self, material: PrivateKeyMaterial) -> Self {
        self.record.private_key = material;
        self
    }

    /// Replace the key pair, keeping the record consistent with it
    #[must_use]
    pub fn key_pair(mut self, pkcs8: Vec<u8>, spki: Vec<u8>) -> Self {
        self.record.private_key = PrivateKeyMaterial::Raw(pkcs8);
        self.record.public_key = spki;
        self
    }

    #[must_use]
    pub fn build(self) -> CredentialRecord {
        self.record
    }
}
