// Request and response bodies of the local provider bridge
use serde::{Deserialize, Serialize};

use crate::passkey::CallerIdentity;
use crate::webauthn::credential_id;

/// Header carrying the verification PIN
pub const PIN_HEADER: &str = "X-Verification-Pin";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Calling application as reported by the platform
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CallerInfo {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub package_name: Option<String>,
    /// Base64 or Base64URL DER certificate
    #[serde(default)]
    pub signing_certificate: Option<String>,
    /// Base64 or Base64URL client data hash
    #[serde(default)]
    pub client_data_hash: Option<String>,
}

impl CallerInfo {
    /// Convert to a `CallerIdentity`
    ///
    /// # Errors
    /// Returns the name of the field that is not valid base64
    pub fn to_identity(&self) -> Result<CallerIdentity, &'static str> {
        let decode = |value: &Option<String>, field: &'static str| match value.as_deref() {
            None => Ok(None),
            Some(text) if text.trim().is_empty() => Ok(None),
            Some(text) => credential_id::to_raw(text).map(Some).ok_or(field),
        };

        Ok(CallerIdentity {
            origin: self.origin.clone().filter(|o| !o.trim().is_empty()),
            package_name: self.package_name.clone().filter(|p| !p.trim().is_empty()),
            signing_certificate: decode(&self.signing_certificate, "signingCertificate")?,
            client_data_hash: decode(&self.client_data_hash, "clientDataHash")?,
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BeginRequest {
    pub request_json: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub request_json: String,
    #[serde(default)]
    pub caller: Option<CallerInfo>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GetRequest {
    pub request_json: String,
    pub credential_id: String,
    #[serde(default)]
    pub caller: Option<CallerInfo>,
}
