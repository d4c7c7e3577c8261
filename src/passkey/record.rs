//! Stored passkey records

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::webauthn::ALG_ES256;

/// Tag of a DER `SEQUENCE`, the outer element of every PKCS#8 document
const DER_SEQUENCE: u8 = 0x30;

/// Synchronization state of a record relative to an external vault
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    /// Local only
    #[default]
    None,
    /// Waiting to be pushed to the external vault
    Pending,
    Synced,
    /// Metadata mirrored from elsewhere; carries no usable private key
    Reference,
}

/// Private key behind a credential
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PrivateKeyMaterial {
    /// PKCS#8 DER private key
    Raw(#[serde(with = "base64_bytes")] Vec<u8>),
    /// Alias of a key held by a secure key store
    KeystoreAlias(String),
}

impl PrivateKeyMaterial {
    /// Classify a legacy single-string key field
    ///
    /// Standard Base64 that decodes to a DER `SEQUENCE` is a raw PKCS#8 key;
    /// any other string is taken to be a key store alias.
    #[must_use]
    pub fn from_legacy_string(value: &str) -> Self {
        let trimmed = value.trim();
        match STANDARD.decode(trimmed) {
            Ok(bytes) if bytes.first() == Some(&DER_SEQUENCE) => Self::Raw(bytes),
            _ => Self::KeystoreAlias(trimmed.to_string()),
        }
    }

    /// True when there is nothing to sign with
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Raw(bytes) => bytes.is_empty(),
            Self::KeystoreAlias(alias) => alias.trim().is_empty(),
        }
    }
}

impl std::fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw(bytes) => write!(f, "Raw([{} bytes])", bytes.len()),
            Self::KeystoreAlias(alias) => f.debug_tuple("KeystoreAlias").field(alias).finish(),
        }
    }
}

/// A stored passkey
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CredentialRecord {
    /// Normalized credential ID
    pub credential_id: String,
    pub rp_id: String,
    pub rp_name: String,
    /// User handle exactly as supplied at registration
    pub user_id: String,
    pub user_name: String,
    pub user_display_name: String,
    /// `SubjectPublicKeyInfo` DER
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
    pub private_key: PrivateKeyMaterial,
    pub algorithm: i32,
    pub created_at: i64,
    pub last_used_at: i64,
    pub use_count: u64,
    pub sign_count: u32,
    pub is_discoverable: bool,
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default = "default_transports")]
    pub transports: Vec<String>,
    #[serde(default)]
    pub aaguid: Option<String>,
    /// Vault item this passkey is attached to
    #[serde(default)]
    pub bound_item_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CredentialRecord {
    /// Whether this record can produce a signature
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.sync_status != SyncStatus::Reference && !self.private_key.is_blank()
    }

    /// Credential ID in wire form
    #[must_use]
    pub fn wire_id(&self) -> String {
        crate::webauthn::credential_id::to_wire_id(&self.credential_id)
    }

    /// Name shown to the user when picking a passkey
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.user_display_name.trim().is_empty() {
            &self.user_name
        } else {
            &self.user_display_name
        }
    }

    /// Public key in Base64URL, if one is stored
    #[must_use]
    pub fn public_key_b64(&self) -> Option<String> {
        (!self.public_key.is_empty()).then(|| URL_SAFE_NO_PAD.encode(&self.public_key))
    }

    /// Whether the record uses the only supported algorithm
    #[must_use]
    pub fn is_es256(&self) -> bool {
        self.algorithm == ALG_ES256
    }
}

fn default_transports() -> Vec<String> {
    vec!["internal".to_string()]
}

/// Serde adapter storing byte vectors as Base64URL text
mod base64_bytes {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        URL_SAFE_NO_PAD
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(private_key: PrivateKeyMaterial, sync_status: SyncStatus) -> CredentialRecord {
        CredentialRecord {
            credential_id: "6d6f6e69-6361-7061-7373-6b6579617070".to_string(),
            rp_id: "example.com".to_string(),
            rp_name: "Example".to_string(),
            user_id: "dXNlcg".to_string(),
            user_name: "alice".to_string(),
            user_display_name: String::new(),
            public_key: vec![1, 2, 3],
            private_key,
            algorithm: ALG_ES256,
            created_at: 1,
            last_used_at: 1,
            use_count: 0,
            sign_count: 0,
            is_discoverable: true,
            sync_status,
            transports: default_transports(),
            aaguid: None,
            bound_item_id: None,
            notes: None,
        }
    }

    #[test]
    fn test_legacy_string_with_der_is_raw() {
        let encoded = STANDARD.encode([0x30, 0x81, 0x87, 0x02, 0x01, 0x00]);
        assert!(matches!(
            PrivateKeyMaterial::from_legacy_string(&encoded),
            PrivateKeyMaterial::Raw(bytes) if bytes[0] == 0x30
        ));
    }

    #[test]
    fn test_legacy_string_alias() {
        assert_eq!(
            PrivateKeyMaterial::from_legacy_string("passkey_example.com_1700000000"),
            PrivateKeyMaterial::KeystoreAlias("passkey_example.com_1700000000".to_string())
        );
        // Valid Base64 that is not DER stays an alias
        assert!(matches!(
            PrivateKeyMaterial::from_legacy_string("YWxpYXM="),
            PrivateKeyMaterial::KeystoreAlias(_)
        ));
    }

    #[test]
    fn test_blank_material() {
        assert!(PrivateKeyMaterial::Raw(Vec::new()).is_blank());
        assert!(PrivateKeyMaterial::KeystoreAlias("  ".to_string()).is_blank());
        assert!(PrivateKeyMaterial::from_legacy_string("").is_blank());
        assert!(!PrivateKeyMaterial::KeystoreAlias("alias".to_string()).is_blank());
    }

    #[test]
    fn test_usability() {
        let raw = PrivateKeyMaterial::Raw(vec![0x30, 0x00]);
        assert!(record(raw.clone(), SyncStatus::None).is_usable());
        assert!(record(raw.clone(), SyncStatus::Synced).is_usable());
        assert!(!record(raw, SyncStatus::Reference).is_usable());
        assert!(!record(PrivateKeyMaterial::Raw(Vec::new()), SyncStatus::None).is_usable());
    }

    #[test]
    fn test_display_title_falls_back_to_user_name() {
        let mut rec = record(PrivateKeyMaterial::Raw(vec![1]), SyncStatus::None);
        assert_eq!(rec.display_title(), "alice");
        rec.user_display_name = "Alice".to_string();
        assert_eq!(rec.display_title(), "Alice");
    }

    #[test]
    fn test_serde_shape() {
        let rec = record(PrivateKeyMaterial::Raw(vec![0x30, 0x01]), SyncStatus::Reference);
        let json = serde_json::to_value(&rec).unwrap();

        assert_eq!(json["sync_status"], "REFERENCE");
        assert_eq!(json["private_key"]["kind"], "raw");
        assert_eq!(json["private_key"]["value"], "MAE");
        assert_eq!(json["public_key"], "AQID");

        let back: CredentialRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn test_missing_optional_fields_take_defaults() {
        let mut json = serde_json::to_value(record(
            PrivateKeyMaterial::KeystoreAlias("a".to_string()),
            SyncStatus::Pending,
        ))
        .unwrap();
        let map = json.as_object_mut().unwrap();
        map.remove("sync_status");
        map.remove("transports");

        let back: CredentialRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.sync_status, SyncStatus::None);
        assert_eq!(back.transports, vec!["internal".to_string()]);
    }

    #[test]
    fn test_debug_hides_key_bytes() {
        let material = PrivateKeyMaterial::Raw(vec![0xAB; 4]);
        assert_eq!(format!("{material:?}"), "Raw([4 bytes])");
    }
}
