//! `WebAuthn` cryptography operations
//!
//! P-256 key generation and ECDSA signing go through `ring`; hashing uses
//! `sha2`. Public keys leave this module either as the uncompressed SEC1 point
//! or wrapped in a `SubjectPublicKeyInfo` DER structure.

use super::errors::WebAuthnError;
use ring::rand::{SecureRandom, SystemRandom};
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};
use sha2::{Digest, Sha256};

/// Length of a freshly minted credential ID
pub const CREDENTIAL_ID_LEN: usize = 16;

/// Length of an uncompressed P-256 point (`04 ‖ X ‖ Y`)
pub const UNCOMPRESSED_POINT_LEN: usize = 65;

/// DER prefix of a P-256 `SubjectPublicKeyInfo` (id-ecPublicKey, prime256v1)
const P256_SPKI_PREFIX: [u8; 26] = [
    0x30, 0x59, 0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x08, 0x2a,
    0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, 0x03, 0x42, 0x00,
];

/// A freshly generated P-256 key pair
pub struct GeneratedKeyPair {
    /// PKCS#8 v1 DER private key document
    pub pkcs8: Vec<u8>,
    /// Uncompressed public point
    pub public_point: Vec<u8>,
}

impl GeneratedKeyPair {
    /// X coordinate of the public point
    #[must_use]
    pub fn x(&self) -> &[u8] {
        &self.public_point[1..33]
    }

    /// Y coordinate of the public point
    #[must_use]
    pub fn y(&self) -> &[u8] {
        &self.public_point[33..]
    }
}

/// Hash data using SHA-256
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Generate a random 128-bit credential ID
///
/// # Errors
/// Returns `WebAuthnError::CryptoError` if the system RNG fails
pub fn generate_credential_id() -> Result<[u8; CREDENTIAL_ID_LEN], WebAuthnError> {
    let mut bytes = [0u8; CREDENTIAL_ID_LEN];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| WebAuthnError::CryptoError("Failed to generate credential ID".to_string()))?;
    Ok(bytes)
}

/// Generate a new P-256 key pair
///
/// # Errors
/// Returns `WebAuthnError::CryptoError` if key generation fails
pub fn generate_key_pair() -> Result<GeneratedKeyPair, WebAuthnError> {
    let rng = SystemRandom::new();
    let document = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
        .map_err(|_| WebAuthnError::CryptoError("Failed to generate P-256 key".to_string()))?;
    let pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, document.as_ref(), &rng)
        .map_err(|_| WebAuthnError::CryptoError("Generated key is unusable".to_string()))?;

    Ok(GeneratedKeyPair {
        pkcs8: document.as_ref().to_vec(),
        public_point: pair.public_key().as_ref().to_vec(),
    })
}

/// Sign a message with a PKCS#8 encoded P-256 private key
///
/// # Returns
/// The ASN.1 DER encoded ECDSA signature over SHA-256(message)
///
/// # Errors
/// Returns `WebAuthnError::CryptoError` if the key cannot be parsed or signing fails
pub fn sign_pkcs8(pkcs8: &[u8], message: &[u8]) -> Result<Vec<u8>, WebAuthnError> {
    let rng = SystemRandom::new();
    let pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8, &rng)
        .map_err(|e| WebAuthnError::CryptoError(format!("Invalid PKCS#8 key: {e}")))?;
    let signature = pair
        .sign(&rng, message)
        .map_err(|_| WebAuthnError::CryptoError("ECDSA signing failed".to_string()))?;
    Ok(signature.as_ref().to_vec())
}

/// Wrap an uncompressed P-256 point in a `SubjectPublicKeyInfo`
///
/// # Errors
/// Returns `WebAuthnError::EncodingError` if the point is not uncompressed
pub fn spki_from_point(point: &[u8]) -> Result<Vec<u8>, WebAuthnError> {
    if point.len() != UNCOMPRESSED_POINT_LEN || point[0] != 0x04 {
        return Err(WebAuthnError::EncodingError(
            "Expected an uncompressed P-256 point".to_string(),
        ));
    }
    let mut spki = Vec::with_capacity(P256_SPKI_PREFIX.len() + point.len());
    spki.extend_from_slice(&P256_SPKI_PREFIX);
    spki.extend_from_slice(point);
    Ok(spki)
}

/// Extract the uncompressed point from a P-256 `SubjectPublicKeyInfo`
#[must_use]
pub fn point_from_spki(spki: &[u8]) -> Option<&[u8]> {
    spki.strip_prefix(&P256_SPKI_PREFIX[..])
        .filter(|point| point.len() == UNCOMPRESSED_POINT_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::signature::{UnparsedPublicKey, ECDSA_P256_SHA256_ASN1};

    #[test]
    fn test_sha256_known_vector() {
        let digest = sha256(b"abc");
        assert_eq!(digest[0], 0xba);
        assert_eq!(digest[31], 0xad);
    }

    #[test]
    fn test_credential_ids_are_random() {
        let a = generate_credential_id().unwrap();
        let b = generate_credential_id().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_generated_key_signs_verifiably() {
        let pair = generate_key_pair().unwrap();
        assert_eq!(pair.public_point.len(), UNCOMPRESSED_POINT_LEN);
        assert_eq!(pair.x().len(), 32);
        assert_eq!(pair.y().len(), 32);

        let message = b"authenticator data and client data hash";
        let signature = sign_pkcs8(&pair.pkcs8, message).unwrap();

        UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, &pair.public_point)
            .verify(message, &signature)
            .expect("signature must verify");
    }

    #[test]
    fn test_spki_round_trip() {
        let pair = generate_key_pair().unwrap();
        let spki = spki_from_point(&pair.public_point).unwrap();

        assert_eq!(spki.len(), 91);
        assert_eq!(&spki[..2], &[0x30, 0x59]);
        assert_eq!(point_from_spki(&spki), Some(pair.public_point.as_slice()));
    }

    #[test]
    fn test_spki_rejects_compressed_point() {
        let mut compressed = vec![0x02];
        compressed.extend_from_slice(&[0u8; 32]);
        assert!(spki_from_point(&compressed).is_err());
    }

    #[test]
    fn test_sign_rejects_garbage_key() {
        assert!(matches!(
            sign_pkcs8(b"not a key", b"msg"),
            Err(WebAuthnError::CryptoError(_))
        ));
    }
}
