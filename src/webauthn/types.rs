//! `WebAuthn` wire types
//!
//! Requests arrive as the JSON forwarded by the platform credential manager;
//! responses are serialized back in the `PublicKeyCredential` JSON shape.

use serde::{Deserialize, Serialize};

/// COSE algorithm identifier for ES256
pub const ALG_ES256: i32 = -7;

/// Credential type string
pub const PUBLIC_KEY_TYPE: &str = "public-key";

/// Attachment reported for every credential
pub const PLATFORM_ATTACHMENT: &str = "platform";

/// Transports advertised on registration
pub const REGISTRATION_TRANSPORTS: [&str; 2] = ["internal", "hybrid"];

/// `WebAuthn` relying party information
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RelyingParty {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// `WebAuthn` user entity
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    /// Base64URL-encoded user handle, stored as given
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

/// Public key credential parameters
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PublicKeyCredentialParameters {
    #[serde(rename = "type", default)]
    pub r#type: String,
    pub alg: i64,
}

/// Authenticator selection criteria
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelectionCriteria {
    #[serde(default)]
    pub require_resident_key: bool,
    #[serde(default)]
    pub resident_key: Option<String>,
    #[serde(default)]
    pub user_verification: Option<String>,
}

impl AuthenticatorSelectionCriteria {
    /// Whether the relying party asked for a discoverable credential
    #[must_use]
    pub fn wants_discoverable(&self) -> bool {
        self.require_resident_key
            || matches!(
                self.resident_key.as_deref(),
                Some("required" | "preferred")
            )
    }
}

/// Public key credential descriptor
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PublicKeyCredentialDescriptor {
    #[serde(rename = "type", default)]
    pub r#type: String,
    /// Credential ID in whatever encoding the caller chose
    #[serde(default)]
    pub id: String,
}

/// Registration request (`PublicKeyCredentialCreationOptions`)
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreationRequest {
    #[serde(default)]
    pub rp: RelyingParty,
    #[serde(default)]
    pub user: UserEntity,
    #[serde(default)]
    pub challenge: String,
    #[serde(default)]
    pub pub_key_cred_params: Vec<PublicKeyCredentialParameters>,
    #[serde(default)]
    pub authenticator_selection: Option<AuthenticatorSelectionCriteria>,
    /// Origin asserted by a privileged caller
    #[serde(default)]
    pub origin: Option<String>,
}

impl CreationRequest {
    /// Whether the new credential should be discoverable
    #[must_use]
    pub fn is_discoverable(&self) -> bool {
        self.authenticator_selection
            .as_ref()
            .is_some_and(AuthenticatorSelectionCriteria::wants_discoverable)
    }

    /// Relying party display name, falling back to the RP ID
    #[must_use]
    pub fn rp_name(&self) -> &str {
        if self.rp.name.trim().is_empty() {
            &self.rp.id
        } else {
            &self.rp.name
        }
    }
}

/// Assertion request (`PublicKeyCredentialRequestOptions`)
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AssertionRequest {
    #[serde(default)]
    pub rp_id: String,
    #[serde(default)]
    pub challenge: String,
    #[serde(default)]
    pub allow_credentials: Vec<PublicKeyCredentialDescriptor>,
    #[serde(default)]
    pub origin: Option<String>,
}

/// Registration response sent back to the caller
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub id: String,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub authenticator_attachment: String,
    pub response: AuthenticatorAttestationResponse,
    pub client_extension_results: serde_json::Map<String, serde_json::Value>,
}

/// Authenticator attestation response
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorAttestationResponse {
    /// Base64URL client data JSON, or the placeholder literal
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub attestation_object: String,
    pub public_key_algorithm: i32,
    /// Base64URL `SubjectPublicKeyInfo`
    pub public_key: String,
    pub authenticator_data: String,
    pub transports: Vec<String>,
}

/// Assertion response sent back to the caller
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResponse {
    pub id: String,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub authenticator_attachment: String,
    pub response: AuthenticatorAssertionResponse,
    pub client_extension_results: serde_json::Map<String, serde_json::Value>,
}

/// Authenticator assertion response
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorAssertionResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub authenticator_data: String,
    pub signature: String,
    pub user_handle: String,
    pub public_key_algorithm: i32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub public_key: Option<String>,
}
