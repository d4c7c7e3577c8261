//! Signing with stored key material
//!
//! Each [`PrivateKeyMaterial`] variant is resolved once to a [`CredentialSigner`]:
//! raw PKCS#8 keys sign in-process, legacy aliases are delegated to a
//! [`SecureKeyStore`].

use super::errors::PasskeyError;
use super::record::PrivateKeyMaterial;
use crate::webauthn::crypto::sign_pkcs8;

/// Produces ES256 signatures (ASN.1 DER) for one credential
pub trait CredentialSigner: Send + Sync {
    /// Sign `message` with ECDSA P-256 over SHA-256
    ///
    /// # Errors
    /// Returns `PasskeyError::SigningFailure` if the key is unusable
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, PasskeyError>;
}

/// Key store holding keys that never leave it
pub trait SecureKeyStore: Send + Sync {
    /// Sign `message` with the key stored under `alias`
    ///
    /// # Errors
    /// Returns `PasskeyError::SigningFailure` if no such key exists or signing fails
    fn sign(&self, alias: &str, message: &[u8]) -> Result<Vec<u8>, PasskeyError>;
}

/// Signer over an in-memory PKCS#8 document
pub struct Pkcs8Signer<'a> {
    pkcs8: &'a [u8],
}

impl<'a> Pkcs8Signer<'a> {
    #[must_use]
    pub fn new(pkcs8: &'a [u8]) -> Self {
        Self { pkcs8 }
    }
}

impl CredentialSigner for Pkcs8Signer<'_> {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, PasskeyError> {
        sign_pkcs8(self.pkcs8, message).map_err(|e| PasskeyError::SigningFailure(e.to_string()))
    }
}

/// Signer delegating to a secure key store alias
pub struct KeystoreSigner<'a> {
    alias: &'a str,
    store: &'a dyn SecureKeyStore,
}

impl<'a> KeystoreSigner<'a> {
    #[must_use]
    pub fn new(alias: &'a str, store: &'a dyn SecureKeyStore) -> Self {
        Self { alias, store }
    }
}

impl CredentialSigner for KeystoreSigner<'_> {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, PasskeyError> {
        self.store.sign(self.alias, message)
    }
}

/// Pick the signer for a credential's key material
///
/// # Errors
/// Returns `PasskeyError::SigningFailure` for blank material, or for an alias
/// when no secure key store is available
pub fn signer_for<'a>(
    material: &'a PrivateKeyMaterial,
    keystore: Option<&'a dyn SecureKeyStore>,
) -> Result<Box<dyn CredentialSigner + 'a>, PasskeyError> {
    if material.is_blank() {
        return Err(PasskeyError::SigningFailure(
            "Credential has no private key".to_string(),
        ));
    }

    match material {
        PrivateKeyMaterial::Raw(pkcs8) => Ok(Box::new(Pkcs8Signer::new(pkcs8))),
        PrivateKeyMaterial::KeystoreAlias(alias) => {
            let store = keystore.ok_or_else(|| {
                PasskeyError::SigningFailure(format!("Private key not found: {alias}"))
            })?;
            Ok(Box::new(KeystoreSigner::new(alias, store)))
        }
    }
}
