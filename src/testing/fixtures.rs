//! Test fixtures providing pre-built test objects

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::signature::{UnparsedPublicKey, ECDSA_P256_SHA256_ASN1};
use serde_json::json;
use std::sync::Arc;

use crate::passkey::{
    CallerIdentity, ColdStartPolicy, CredentialStore, PasskeyProvider, VerificationGate,
};
use crate::webauthn::crypto::point_from_spki;

use super::constants::{
    TEST_CHALLENGE, TEST_DISPLAY_NAME, TEST_ORIGIN, TEST_PACKAGE, TEST_RP_NAME, TEST_USER_ID,
    TEST_USER_NAME,
};
use super::mock::{RecordingAuditTrail, StaticAppIdentity};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Creation request JSON for `rp_id`
    #[must_use]
    pub fn creation_request(rp_id: &str, discoverable: bool) -> String {
        json!({
            "rp": { "id": rp_id, "name": TEST_RP_NAME },
            "user": {
                "id": TEST_USER_ID,
                "name": TEST_USER_NAME,
                "displayName": TEST_DISPLAY_NAME
            },
            "challenge": TEST_CHALLENGE,
            "pubKeyCredParams": [{ "type": "public-key", "alg": -7 }],
            "authenticatorSelection": {
                "residentKey": if discoverable { "required" } else { "discouraged" },
                "userVerification": "required"
            },
            "origin": TEST_ORIGIN
        })
        .to_string()
    }

    /// Assertion request JSON for `rp_id` with an optional allow-list
    #[must_use]
    pub fn assertion_request(rp_id: &str, allow: &[&str]) -> String {
        let allow: Vec<_> = allow
            .iter()
            .map(|id| json!({ "type": "public-key", "id": id }))
            .collect();
        json!({
            "rpId": rp_id,
            "challenge": TEST_CHALLENGE,
            "allowCredentials": allow,
            "origin": TEST_ORIGIN
        })
        .to_string()
    }

    /// Caller identity of a plain app
    #[must_use]
    pub fn app_caller() -> CallerIdentity {
        CallerIdentity::with_package(TEST_PACKAGE)
    }

    /// Provider over the given store and gate, installed long ago
    #[must_use]
    pub fn provider(
        store: Arc<dyn CredentialStore>,
        gate: Arc<dyn VerificationGate>,
        audit: Arc<RecordingAuditTrail>,
    ) -> PasskeyProvider {
        PasskeyProvider::new(store, gate, Arc::new(StaticAppIdentity::settled())).with_audit(audit)
    }

    /// Provider that was updated just now, with a short retry delay
    #[must_use]
    pub fn just_updated_provider(
        store: Arc<dyn CredentialStore>,
        gate: Arc<dyn VerificationGate>,
    ) -> PasskeyProvider {
        PasskeyProvider::new(store, gate, Arc::new(StaticAppIdentity::just_updated()))
            .with_cold_start(ColdStartPolicy {
                initial_delay: std::time::Duration::from_millis(5),
                ..ColdStartPolicy::default()
            })
    }

    /// Decode a Base64URL field of a response
    ///
    /// # Panics
    ///
    /// Panics if `value` is not valid Base64URL.
    #[must_use]
    pub fn decode(value: &str) -> Vec<u8> {
        URL_SAFE_NO_PAD.decode(value).unwrap()
    }

    /// Verify an ES256 signature against a `SubjectPublicKeyInfo`
    #[must_use]
    pub fn verify_signature(spki: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let Some(point) = point_from_spki(spki) else {
            return false;
        };
        UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, point)
            .verify(message, signature)
            .is_ok()
    }
}
