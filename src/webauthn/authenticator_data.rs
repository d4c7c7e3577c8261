//! Authenticator data construction
//!
//! `rpIdHash(32) ‖ flags(1) ‖ signCount(4, big-endian)` optionally followed by
//! the attested credential block `aaguid(16) ‖ idLen(2) ‖ credentialId ‖ coseKey`.

use super::crypto::sha256;
use super::errors::WebAuthnError;

/// User present
pub const FLAG_UP: u8 = 0x01;
/// User verified
pub const FLAG_UV: u8 = 0x04;
/// Backup eligible
pub const FLAG_BE: u8 = 0x08;
/// Backed up
pub const FLAG_BS: u8 = 0x10;
/// Attested credential data included
pub const FLAG_AT: u8 = 0x40;

/// Flags for an assertion: UP | UV | BE | BS
pub const ASSERTION_FLAGS: u8 = FLAG_UP | FLAG_UV | FLAG_BE | FLAG_BS;
/// Flags for a registration: assertion flags plus AT
pub const REGISTRATION_FLAGS: u8 = ASSERTION_FLAGS | FLAG_AT;

/// Length of the fixed header
pub const HEADER_LEN: usize = 37;

/// Authenticator model identifier advertised in attested credential data
pub const DEFAULT_AAGUID: [u8; 16] = *b"monicapasskeyapp";

/// Attested credential data for a freshly created credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredential {
    pub aaguid: [u8; 16],
    pub credential_id: Vec<u8>,
    /// COSE_Key encoding of the credential public key
    pub cose_key: Vec<u8>,
}

/// Build authenticator data
///
/// The attested block is present iff `attested` is `Some`, in which case the
/// AT flag is set.
///
/// # Errors
/// Returns `WebAuthnError::EncodingError` if the credential ID does not fit
/// the 16-bit length field
pub fn build(
    rp_id: &str,
    sign_count: u32,
    attested: Option<&AttestedCredential>,
) -> Result<Vec<u8>, WebAuthnError> {
    let flags = if attested.is_some() {
        REGISTRATION_FLAGS
    } else {
        ASSERTION_FLAGS
    };

    let mut data = Vec::with_capacity(
        HEADER_LEN
            + attested.map_or(0, |a| 18 + a.credential_id.len() + a.cose_key.len()),
    );
    data.extend_from_slice(&sha256(rp_id.as_bytes()));
    data.push(flags);
    data.extend_from_slice(&sign_count.to_be_bytes());

    if let Some(attested) = attested {
        let id_len = u16::try_from(attested.credential_id.len()).map_err(|_| {
            WebAuthnError::EncodingError(format!(
                "Credential ID too long: {} bytes",
                attested.credential_id.len()
            ))
        })?;
        data.extend_from_slice(&attested.aaguid);
        data.extend_from_slice(&id_len.to_be_bytes());
        data.extend_from_slice(&attested.credential_id);
        data.extend_from_slice(&attested.cose_key);
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webauthn::cbor::encode_cose_key;

    #[test]
    fn test_assertion_auth_data_layout() {
        let auth_data = build("example.com", 42, None).unwrap();

        assert_eq!(auth_data.len(), HEADER_LEN);
        assert_eq!(&auth_data[..32], &sha256(b"example.com"));
        assert_eq!(auth_data[32], 0x1D);
        assert_eq!(&auth_data[33..37], &42u32.to_be_bytes());
    }

    #[test]
    fn test_registration_auth_data_layout() {
        let credential_id = vec![0x5Au8; 16];
        let cose_key = encode_cose_key(&[1u8; 32], &[2u8; 32]).unwrap();
        let attested = AttestedCredential {
            aaguid: DEFAULT_AAGUID,
            credential_id: credential_id.clone(),
            cose_key: cose_key.clone(),
        };

        let auth_data = build("example.com", 0, Some(&attested)).unwrap();

        assert_eq!(auth_data.len(), 148);
        assert_eq!(auth_data[32], 0x5D);
        assert_eq!(&auth_data[33..37], &[0, 0, 0, 0]);
        assert_eq!(&auth_data[37..53], b"monicapasskeyapp");
        assert_eq!(&auth_data[53..55], &[0x00, 0x10]);
        assert_eq!(&auth_data[55..71], credential_id.as_slice());
        assert_eq!(&auth_data[71..], cose_key.as_slice());
    }

    #[test]
    fn test_flag_constants() {
        assert_eq!(ASSERTION_FLAGS, 0x1D);
        assert_eq!(REGISTRATION_FLAGS, 0x5D);
    }

    #[test]
    fn test_sign_count_is_big_endian() {
        let auth_data = build("rp", 0x0102_0304, None).unwrap();
        assert_eq!(&auth_data[33..37], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_oversized_credential_id_is_rejected() {
        let attested = AttestedCredential {
            aaguid: DEFAULT_AAGUID,
            credential_id: vec![0u8; usize::from(u16::MAX) + 1],
            cose_key: Vec::new(),
        };
        assert!(matches!(
            build("rp", 0, Some(&attested)),
            Err(WebAuthnError::EncodingError(_))
        ));
    }
}
