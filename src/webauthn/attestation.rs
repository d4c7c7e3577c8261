//! `WebAuthn` attestation object assembly
//!
//! Only the "none" attestation format is produced: the statement is an empty
//! map and no certificate chain is attached.

use super::cbor::write_value;
use super::errors::WebAuthnError;
use ciborium::value::Value;

/// Attestation format produced by this authenticator
pub const FORMAT_NONE: &str = "none";

/// Build a "none" attestation object around the given authenticator data
///
/// Produces the CBOR map `{"fmt": "none", "attStmt": {}, "authData": h'..'}`
/// with the keys in that order.
///
/// # Errors
/// Returns `WebAuthnError::EncodingError` if the CBOR writer fails
pub fn build_attestation_object(auth_data: &[u8]) -> Result<Vec<u8>, WebAuthnError> {
    let object = Value::Map(vec![
        (
            Value::Text("fmt".to_string()),
            Value::Text(FORMAT_NONE.to_string()),
        ),
        (Value::Text("attStmt".to_string()), Value::Map(Vec::new())),
        (
            Value::Text("authData".to_string()),
            Value::Bytes(auth_data.to_vec()),
        ),
    ]);

    write_value(&object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webauthn::cbor::AttestationObject;

    /// `A3 63 "fmt" 64 "none" 67 "attStmt" A0 68 "authData"`
    const PREFIX: &[u8] = &[
        0xA3, 0x63, b'f', b'm', b't', 0x64, b'n', b'o', b'n', b'e', 0x67, b'a', b't', b't', b'S',
        b't', b'm', b't', 0xA0, 0x68, b'a', b'u', b't', b'h', b'D', b'a', b't', b'a',
    ];

    #[test]
    fn test_short_auth_data_uses_one_byte_length() {
        let auth_data = vec![0x42u8; 148];
        let encoded = build_attestation_object(&auth_data).unwrap();

        assert_eq!(&encoded[..PREFIX.len()], PREFIX);
        assert_eq!(&encoded[PREFIX.len()..PREFIX.len() + 2], &[0x58, 148]);
        assert_eq!(&encoded[PREFIX.len() + 2..], auth_data.as_slice());
    }

    #[test]
    fn test_long_auth_data_uses_two_byte_length() {
        let auth_data = vec![0x01u8; 300];
        let encoded = build_attestation_object(&auth_data).unwrap();

        assert_eq!(&encoded[..PREFIX.len()], PREFIX);
        assert_eq!(&encoded[PREFIX.len()..PREFIX.len() + 3], &[0x59, 0x01, 0x2C]);
        assert_eq!(encoded.len(), PREFIX.len() + 3 + 300);
    }

    #[test]
    fn test_attestation_is_deterministic() {
        let auth_data = vec![7u8; 64];
        assert_eq!(
            build_attestation_object(&auth_data).unwrap(),
            build_attestation_object(&auth_data).unwrap()
        );
    }

    #[test]
    fn test_attestation_decodes() {
        let auth_data = vec![9u8; 40];
        let encoded = build_attestation_object(&auth_data).unwrap();
        let decoded = AttestationObject::decode(&encoded).unwrap();

        assert_eq!(decoded.fmt, "none");
        assert_eq!(decoded.auth_data, auth_data);
    }
}
