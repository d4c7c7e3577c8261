//! Passkey error types
//!
//! This module defines the errors raised by the registration and assertion
//! flows and the failure shape returned to the platform caller.

use serde::Serialize;
use std::fmt;

use super::store::StoreError;
use crate::webauthn::WebAuthnError;

/// Errors that can occur during passkey operations
#[derive(Debug)]
pub enum PasskeyError {
    /// The request JSON could not be parsed or lacks required fields
    MalformedRequest(String),

    /// No stored credential matches the requested ID
    CredentialNotFound(String),

    /// Key material is unusable or the signature could not be produced
    SigningFailure(String),

    /// The user verification gate reported a failure
    VerificationFailed(String),

    /// The user dismissed the verification gate
    VerificationCancelled,

    /// Credential store error
    Storage(StoreError),

    /// Binary artifact encoding error
    Encoding(String),
}

impl fmt::Display for PasskeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasskeyError::MalformedRequest(msg) => write!(f, "Malformed request: {msg}"),
            PasskeyError::CredentialNotFound(id) => write!(f, "Credential not found: {id}"),
            PasskeyError::SigningFailure(msg) => write!(f, "Signing failed: {msg}"),
            PasskeyError::VerificationFailed(msg) => write!(f, "Verification failed: {msg}"),
            PasskeyError::VerificationCancelled => write!(f, "User cancelled"),
            PasskeyError::Storage(err) => write!(f, "Storage error: {err}"),
            PasskeyError::Encoding(msg) => write!(f, "Encoding error: {msg}"),
        }
    }
}

impl std::error::Error for PasskeyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PasskeyError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for PasskeyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CounterExhausted(id) => {
                PasskeyError::SigningFailure(format!("Signature counter exhausted for {id}"))
            }
            other => PasskeyError::Storage(other),
        }
    }
}

impl From<WebAuthnError> for PasskeyError {
    fn from(err: WebAuthnError) -> Self {
        match err {
            WebAuthnError::EncodingError(msg) => PasskeyError::Encoding(msg),
            WebAuthnError::CryptoError(msg) => PasskeyError::SigningFailure(msg),
            WebAuthnError::NotSupported(msg) => PasskeyError::MalformedRequest(msg),
        }
    }
}

impl From<serde_json::Error> for PasskeyError {
    fn from(err: serde_json::Error) -> Self {
        PasskeyError::MalformedRequest(err.to_string())
    }
}

/// Failure category understood by the platform caller
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Cancelled,
    Unknown,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Typed failure returned instead of a credential
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    #[serde(rename = "error")]
    pub kind: FailureKind,
    pub message: String,
}

impl From<PasskeyError> for ProviderFailure {
    fn from(err: PasskeyError) -> Self {
        let kind = match err {
            PasskeyError::VerificationCancelled => FailureKind::Cancelled,
            _ => FailureKind::Unknown,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ProviderFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_maps_to_cancelled() {
        let failure = ProviderFailure::from(PasskeyError::VerificationCancelled);
        assert_eq!(failure.kind, FailureKind::Cancelled);
        assert_eq!(failure.message, "User cancelled");
    }

    #[test]
    fn test_other_errors_map_to_unknown_with_message() {
        let failure = ProviderFailure::from(PasskeyError::VerificationFailed(
            "PIN mismatch".to_string(),
        ));
        assert_eq!(failure.kind, FailureKind::Unknown);
        assert_eq!(failure.message, "Verification failed: PIN mismatch");

        let failure = ProviderFailure::from(PasskeyError::from(StoreError::NotFound(
            "abc".to_string(),
        )));
        assert_eq!(failure.kind, FailureKind::Unknown);
    }

    #[test]
    fn test_failure_json_shape() {
        let failure = ProviderFailure::from(PasskeyError::CredentialNotFound("x".to_string()));
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["error"], "unknown");
        assert_eq!(json["message"], "Credential not found: x");
    }

    #[test]
    fn test_webauthn_error_conversion() {
        assert!(matches!(
            PasskeyError::from(WebAuthnError::EncodingError("e".to_string())),
            PasskeyError::Encoding(_)
        ));
        assert!(matches!(
            PasskeyError::from(WebAuthnError::CryptoError("c".to_string())),
            PasskeyError::SigningFailure(_)
        ));
    }
}
