//! Credential ID normalization
//!
//! Credential IDs reach the authenticator in three surface forms: Base64URL
//! without padding (the only form legal on the wire), UUID text (the storage
//! convention for 16-byte IDs) and raw bytes (authenticator data). Every
//! comparison between IDs is made on the output of [`normalize`].

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use uuid::Uuid;

/// Decoder configuration accepting both padded and unpadded input
const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Length of the hyphenated UUID text form
const UUID_TEXT_LEN: usize = 36;

/// Normalize a credential ID into its canonical comparison form
///
/// 16-byte identifiers normalize to lowercase hyphenated UUID text, any other
/// decodable identifier to Base64URL without padding. Input that is neither a
/// UUID nor Base64 is returned trimmed and unchanged.
///
/// # Returns
/// `None` only for blank input
#[must_use]
pub fn normalize(id: &str) -> Option<String> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(uuid) = parse_canonical_uuid(trimmed) {
        return Some(uuid.to_string());
    }

    Some(decode_any(trimmed).map_or_else(|| trimmed.to_string(), |bytes| from_raw(&bytes)))
}

/// Convert a credential ID in any stored form back to Base64URL without padding
#[must_use]
pub fn to_wire_id(id: &str) -> String {
    let trimmed = id.trim();
    if let Some(uuid) = parse_canonical_uuid(trimmed) {
        return URL_SAFE_NO_PAD.encode(uuid.as_bytes());
    }

    decode_any(trimmed).map_or_else(|| trimmed.to_string(), |bytes| URL_SAFE_NO_PAD.encode(bytes))
}

/// Canonical form of a raw credential ID
#[must_use]
pub fn from_raw(bytes: &[u8]) -> String {
    match Uuid::from_slice(bytes) {
        Ok(uuid) => uuid.to_string(),
        Err(_) => URL_SAFE_NO_PAD.encode(bytes),
    }
}

/// Raw bytes behind a credential ID, if it is in a decodable form
#[must_use]
pub fn to_raw(id: &str) -> Option<Vec<u8>> {
    let trimmed = id.trim();
    if let Some(uuid) = parse_canonical_uuid(trimmed) {
        return Some(uuid.as_bytes().to_vec());
    }
    decode_any(trimmed)
}

/// Two IDs are equal iff their normalized forms are equal
#[must_use]
pub fn ids_equal(a: &str, b: &str) -> bool {
    match (normalize(a), normalize(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn parse_canonical_uuid(value: &str) -> Option<Uuid> {
    // '-' is part of the Base64URL alphabet, so only the exact hyphenated
    // layout is treated as UUID text.
    if value.len() != UUID_TEXT_LEN {
        return None;
    }
    Uuid::try_parse(value).ok()
}

fn decode_any(value: &str) -> Option<Vec<u8>> {
    URL_SAFE_LENIENT
        .decode(value)
        .or_else(|_| STANDARD_LENIENT.decode(value))
        .ok()
        .filter(|bytes| !bytes.is_empty())
}
