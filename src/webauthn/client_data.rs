//! Collected client data
//!
//! The authenticator builds `clientDataJSON` itself because the caller only
//! forwards the raw request. Field order is fixed by the struct layout.

use serde::Serialize;

use super::errors::WebAuthnError;

/// Ceremony type for registration
pub const TYPE_CREATE: &str = "webauthn.create";
/// Ceremony type for assertion
pub const TYPE_GET: &str = "webauthn.get";

/// Returned in place of `clientDataJSON` when the caller supplied a client data hash
pub const PLACEHOLDER: &str = "<placeholder>";

/// `CollectedClientData` as serialized into `clientDataJSON`
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientData {
    #[serde(rename = "type")]
    pub ceremony: String,
    /// Challenge exactly as received in the request
    pub challenge: String,
    pub origin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android_package_name: Option<String>,
    pub cross_origin: bool,
}

impl ClientData {
    /// Client data for a registration ceremony
    #[must_use]
    pub fn create(challenge: &str, origin: &str, package_name: Option<&str>) -> Self {
        Self::new(TYPE_CREATE, challenge, origin, package_name)
    }

    /// Client data for an assertion ceremony
    #[must_use]
    pub fn get(challenge: &str, origin: &str, package_name: Option<&str>) -> Self {
        Self::new(TYPE_GET, challenge, origin, package_name)
    }

    fn new(ceremony: &str, challenge: &str, origin: &str, package_name: Option<&str>) -> Self {
        Self {
            ceremony: ceremony.to_string(),
            challenge: challenge.to_string(),
            origin: origin.to_string(),
            android_package_name: package_name
                .filter(|name| !name.trim().is_empty())
                .map(str::to_string),
            cross_origin: false,
        }
    }

    /// Serialize to the exact JSON bytes the relying party will hash
    ///
    /// # Errors
    /// Returns `WebAuthnError::EncodingError` if serialization fails
    pub fn to_json(&self) -> Result<String, WebAuthnError> {
        serde_json::to_string(self)
            .map_err(|e| WebAuthnError::EncodingError(format!("Client data: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_with_package() {
        let json = ClientData::create("Y2hhbGxlbmdl", "https://example.com", Some("com.example"))
            .to_json()
            .unwrap();
        assert_eq!(
            json,
            r#"{"type":"webauthn.create","challenge":"Y2hhbGxlbmdl","origin":"https://example.com","androidPackageName":"com.example","crossOrigin":false}"#
        );
    }

    #[test]
    fn test_blank_package_is_omitted() {
        let json = ClientData::get("abc", "android:apk-key-hash:xyz", Some("  "))
            .to_json()
            .unwrap();
        assert_eq!(
            json,
            r#"{"type":"webauthn.get","challenge":"abc","origin":"android:apk-key-hash:xyz","crossOrigin":false}"#
        );
    }
}
