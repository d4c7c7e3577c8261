//! CBOR processing for `WebAuthn`
//!
//! This module produces the COSE public key structure embedded in
//! authenticator data and parses attestation objects back for verification.

use super::errors::WebAuthnError;
use ciborium::value::Value;

/// Size of a P-256 field element
pub const COORDINATE_LEN: usize = 32;

/// COSE key type EC2
const COSE_KTY_EC2: i64 = 2;
/// COSE algorithm ES256
const COSE_ALG_ES256: i64 = -7;
/// COSE curve P-256
const COSE_CRV_P256: i64 = 1;

/// Encode a P-256 public key as a COSE_Key CBOR map
///
/// The map is written as `{1: 2, 3: -7, -1: 1, -2: X, -3: Y}` in exactly that
/// order. Coordinates shorter than 32 bytes are left-padded with zeros and
/// longer ones keep their last 32 bytes.
///
/// # Errors
/// Returns `WebAuthnError::EncodingError` if the CBOR writer fails
pub fn encode_cose_key(x: &[u8], y: &[u8]) -> Result<Vec<u8>, WebAuthnError> {
    let map = Value::Map(vec![
        (Value::Integer(1i64.into()), Value::Integer(COSE_KTY_EC2.into())),
        (Value::Integer(3i64.into()), Value::Integer(COSE_ALG_ES256.into())),
        (Value::Integer((-1i64).into()), Value::Integer(COSE_CRV_P256.into())),
        (Value::Integer((-2i64).into()), Value::Bytes(fit_coordinate(x).to_vec())),
        (Value::Integer((-3i64).into()), Value::Bytes(fit_coordinate(y).to_vec())),
    ]);

    write_value(&map)
}

/// Decode an ES256 COSE_Key back into its (X, Y) coordinates
///
/// # Errors
/// Returns `WebAuthnError::EncodingError` if the bytes are not a COSE map
/// carrying 32-byte coordinates
pub fn decode_cose_key(
    bytes: &[u8],
) -> Result<([u8; COORDINATE_LEN], [u8; COORDINATE_LEN]), WebAuthnError> {
    let value: Value = ciborium::from_reader(bytes)
        .map_err(|_| WebAuthnError::EncodingError("Invalid COSE key CBOR".to_string()))?;
    let Some(map) = value.as_map() else {
        return Err(WebAuthnError::EncodingError(
            "COSE key is not a map".to_string(),
        ));
    };

    let coordinate = |label: i64| -> Result<[u8; COORDINATE_LEN], WebAuthnError> {
        map.iter()
            .find(|(k, _)| k.as_integer().map(i128::from) == Some(i128::from(label)))
            .and_then(|(_, v)| v.as_bytes())
            .and_then(|b| <[u8; COORDINATE_LEN]>::try_from(b.as_slice()).ok())
            .ok_or_else(|| {
                WebAuthnError::EncodingError(format!("Missing COSE coordinate {label}"))
            })
    };

    Ok((coordinate(-2)?, coordinate(-3)?))
}

/// A parsed attestation object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationObject {
    /// Attestation statement format
    pub fmt: String,
    /// Raw authenticator data
    pub auth_data: Vec<u8>,
}

impl AttestationObject {
    /// Parse a CBOR attestation object
    ///
    /// # Errors
    /// Returns `WebAuthnError::EncodingError` for invalid CBOR or missing fields
    pub fn decode(bytes: &[u8]) -> Result<Self, WebAuthnError> {
        let attestation: Value = ciborium::from_reader(bytes).map_err(|_| {
            WebAuthnError::EncodingError("Invalid CBOR attestation format".to_string())
        })?;

        let Some(map) = attestation.as_map() else {
            return Err(WebAuthnError::EncodingError(
                "Attestation object is not a map".to_string(),
            ));
        };
        let field = |name: &str| map.iter().find(|(k, _)| k.as_text() == Some(name));

        let Some(fmt) = field("fmt").and_then(|(_, v)| v.as_text()) else {
            return Err(WebAuthnError::EncodingError(
                "Missing fmt in attestation".to_string(),
            ));
        };
        let Some(auth_data) = field("authData").and_then(|(_, v)| v.as_bytes()) else {
            return Err(WebAuthnError::EncodingError(
                "Missing authData in attestation".to_string(),
            ));
        };

        Ok(Self {
            fmt: fmt.to_string(),
            auth_data: auth_data.clone(),
        })
    }

    /// Credential ID carried in the attested credential data
    ///
    /// # Errors
    /// Returns `WebAuthnError::EncodingError` if no attested data is present
    pub fn credential_id(&self) -> Result<Vec<u8>, WebAuthnError> {
        let (start, end) = self.credential_id_span()?;
        Ok(self.auth_data[start..end].to_vec())
    }

    /// COSE public key carried in the attested credential data
    ///
    /// # Errors
    /// Returns `WebAuthnError::EncodingError` if no attested data is present
    pub fn credential_public_key(&self) -> Result<Vec<u8>, WebAuthnError> {
        let (_, end) = self.credential_id_span()?;
        if self.auth_data.len() <= end {
            return Err(WebAuthnError::EncodingError(
                "Auth data too short for public key".to_string(),
            ));
        }
        Ok(self.auth_data[end..].to_vec())
    }

    // Layout: rpIdHash(32) flags(1) signCount(4) aaguid(16) idLen(2) id(L) coseKey
    fn credential_id_span(&self) -> Result<(usize, usize), WebAuthnError> {
        let auth_data = &self.auth_data;
        if auth_data.len() < 37 {
            return Err(WebAuthnError::EncodingError(
                "Auth data too short".to_string(),
            ));
        }
        if auth_data[32] & 0x40 == 0 {
            return Err(WebAuthnError::EncodingError(
                "No attested credential data".to_string(),
            ));
        }

        let len_pos = 37 + 16;
        if auth_data.len() < len_pos + 2 {
            return Err(WebAuthnError::EncodingError(
                "Auth data too short for credential ID length".to_string(),
            ));
        }
        let id_len = usize::from(u16::from_be_bytes([auth_data[len_pos], auth_data[len_pos + 1]]));
        let start = len_pos + 2;
        let end = start + id_len;
        if auth_data.len() < end {
            return Err(WebAuthnError::EncodingError(
                "Auth data too short for credential ID".to_string(),
            ));
        }
        Ok((start, end))
    }
}

/// Serialize a CBOR value
pub(crate) fn write_value(value: &Value) -> Result<Vec<u8>, WebAuthnError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| WebAuthnError::EncodingError(format!("CBOR encoding failed: {e}")))?;
    Ok(buf)
}

fn fit_coordinate(value: &[u8]) -> [u8; COORDINATE_LEN] {
    let mut out = [0u8; COORDINATE_LEN];
    if value.len() >= COORDINATE_LEN {
        out.copy_from_slice(&value[value.len() - COORDINATE_LEN..]);
    } else {
        out[COORDINATE_LEN - value.len()..].copy_from_slice(value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cose_key_exact_bytes() {
        let x = [0x11u8; 32];
        let y = [0x22u8; 32];
        let encoded = encode_cose_key(&x, &y).unwrap();

        assert_eq!(encoded.len(), 77);
        assert_eq!(
            &encoded[..10],
            &[0xA5, 0x01, 0x02, 0x03, 0x26, 0x20, 0x01, 0x21, 0x58, 0x20]
        );
        assert_eq!(&encoded[10..42], &x);
        assert_eq!(&encoded[42..45], &[0x22, 0x58, 0x20]);
        assert_eq!(&encoded[45..], &y);
    }

    #[test]
    fn test_cose_key_pads_short_coordinates() {
        let encoded = encode_cose_key(&[0x01, 0x02], &[0x03]).unwrap();
        let (x, y) = decode_cose_key(&encoded).unwrap();

        let mut expected_x = [0u8; 32];
        expected_x[30] = 0x01;
        expected_x[31] = 0x02;
        let mut expected_y = [0u8; 32];
        expected_y[31] = 0x03;
        assert_eq!(x, expected_x);
        assert_eq!(y, expected_y);
    }

    #[test]
    fn test_cose_key_truncates_long_coordinates() {
        // 33-byte big-endian integers carry a leading sign byte
        let mut x = vec![0x00];
        x.extend_from_slice(&[0xAA; 32]);
        let mut y = vec![0xFF, 0xEE];
        y.extend_from_slice(&[0xBB; 32]);

        let encoded = encode_cose_key(&x, &y).unwrap();
        assert_eq!(encoded.len(), 77);
        let (dx, dy) = decode_cose_key(&encoded).unwrap();
        assert_eq!(dx, [0xAA; 32]);
        assert_eq!(dy, [0xBB; 32]);
    }

    #[test]
    fn test_cose_key_decodes_with_standard_decoder() {
        let encoded = encode_cose_key(&[0xAA; 32], &[0xBB; 32]).unwrap();
        let value: Value = ciborium::from_reader(encoded.as_slice()).unwrap();
        let map = value.as_map().unwrap();
        let labels: Vec<i128> = map
            .iter()
            .map(|(k, _)| i128::from(k.as_integer().unwrap()))
            .collect();
        assert_eq!(labels, vec![1, 3, -1, -2, -3]);
    }

    #[test]
    fn test_decode_cose_key_rejects_non_map() {
        let encoded = write_value(&Value::Text("nope".to_string())).unwrap();
        assert!(decode_cose_key(&encoded).is_err());
    }

    #[test]
    fn test_attestation_decode_rejects_garbage() {
        assert!(AttestationObject::decode(&[0xFF, 0x00]).is_err());
        let no_auth_data = write_value(&Value::Map(vec![(
            Value::Text("fmt".to_string()),
            Value::Text("none".to_string()),
        )]))
        .unwrap();
        assert!(AttestationObject::decode(&no_auth_data).is_err());
    }

    #[test]
    fn test_credential_key_requires_attested_flag() {
        let object = AttestationObject {
            fmt: "none".to_string(),
            auth_data: vec![0u8; 37],
        };
        assert!(object.credential_public_key().is_err());
        assert!(object.credential_id().is_err());
    }
}
