//! `WebAuthn` error types
//!
//! Errors raised while producing the binary artifacts of a ceremony
//! (CBOR, authenticator data, signatures).

use std::fmt;

/// `WebAuthn` errors that can occur while building ceremony artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebAuthnError {
    /// Data encoding/parsing error
    EncodingError(String),

    /// Key generation or signing failed
    CryptoError(String),

    /// Operation not supported
    NotSupported(String),
}

impl fmt::Display for WebAuthnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebAuthnError::EncodingError(msg) => write!(f, "Encoding error: {msg}"),
            WebAuthnError::CryptoError(msg) => write!(f, "Crypto error: {msg}"),
            WebAuthnError::NotSupported(msg) => write!(f, "Not supported: {msg}"),
        }
    }
}

impl std::error::Error for WebAuthnError {}
