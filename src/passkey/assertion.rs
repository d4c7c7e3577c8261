//! Passkey assertion
//!
//! Signs `authenticatorData ‖ clientDataHash` with a stored credential. The
//! signature counter is advanced by the store before signing.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use log::{debug, info, warn};

use super::audit::AuditEvent;
use super::context::FlowContext;
use super::errors::PasskeyError;
use super::identity::CallerIdentity;
use super::keys::signer_for;
use super::origin::OriginResolver;
use super::record::CredentialRecord;
use super::store::CredentialStore;
use super::verification::Ceremony;
use crate::webauthn::authenticator_data;
use crate::webauthn::client_data::PLACEHOLDER;
use crate::webauthn::credential_id::{ids_equal, normalize};
use crate::webauthn::crypto::sha256;
use crate::webauthn::{
    AssertionRequest, AssertionResponse, AuthenticatorAssertionResponse, ClientData,
    PLATFORM_ATTACHMENT, PUBLIC_KEY_TYPE,
};

/// Parse an assertion request
///
/// # Errors
/// `MalformedRequest` for invalid JSON
pub fn parse_assertion_request(request_json: &str) -> Result<AssertionRequest, PasskeyError> {
    Ok(serde_json::from_str(request_json)?)
}

/// Find a record by credential ID in any encoding
///
/// Tries the exact normalized key first, then scans every record comparing
/// normalized IDs so rows stored under a non-canonical ID are still found.
///
/// # Errors
/// Propagates store failures
pub async fn find_record(
    store: &dyn CredentialStore,
    credential_id: &str,
) -> Result<Option<CredentialRecord>, PasskeyError> {
    let Some(normalized) = normalize(credential_id) else {
        return Ok(None);
    };

    if let Some(record) = store.get_by_normalized_id(&normalized).await? {
        return Ok(Some(record));
    }

    debug!("No exact match for {normalized}, scanning all records");
    Ok(store
        .get_all()
        .await?
        .into_iter()
        .find(|record| ids_equal(&record.credential_id, &normalized)))
}

/// The assertion ceremony
pub struct AssertionFlow<'a> {
    ctx: FlowContext<'a>,
}

impl<'a> AssertionFlow<'a> {
    #[must_use]
    pub fn new(ctx: FlowContext<'a>) -> Self {
        Self { ctx }
    }

    /// Produce an assertion with the selected credential
    ///
    /// # Arguments
    /// * `request_json` - `PublicKeyCredentialRequestOptions` JSON
    /// * `credential_id` - The credential the user picked, in any encoding
    /// * `caller` - Identity of the calling app, if known
    /// * `pin` - Knowledge factor collected by the front end
    ///
    /// # Errors
    /// Returns a `PasskeyError` for malformed requests, unknown or unusable
    /// credentials, declined verification, signing or storage failures
    pub async fn run(
        &self,
        request_json: &str,
        credential_id: &str,
        caller: Option<&CallerIdentity>,
        pin: Option<String>,
    ) -> Result<AssertionResponse, PasskeyError> {
        let request = match parse_assertion_request(request_json) {
            Ok(request) => request,
            Err(err) => {
                self.audit_error(credential_id, &err);
                return Err(err);
            }
        };

        let record = match find_record(self.ctx.store, credential_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!("Passkey not found: {credential_id}");
                self.ctx
                    .audit
                    .record(AuditEvent::AuthCredentialNotFound, credential_id);
                return Err(PasskeyError::CredentialNotFound(credential_id.to_string()));
            }
            Err(err) => {
                self.audit_error(credential_id, &err);
                return Err(err);
            }
        };

        if !record.is_usable() {
            let err = PasskeyError::SigningFailure(format!(
                "Credential {} has no usable private key",
                record.credential_id
            ));
            self.audit_error(&record.credential_id, &err);
            return Err(err);
        }

        let rp_id = if request.rp_id.trim().is_empty() {
            record.rp_id.clone()
        } else {
            request.rp_id.trim().to_string()
        };
        self.ctx
            .require_verification(Ceremony::Get, &rp_id, &record.credential_id, pin)
            .await?;

        match self.sign(&request, &rp_id, &record, caller).await {
            Ok(response) => Ok(response),
            Err(err) => {
                self.audit_error(&record.credential_id, &err);
                Err(err)
            }
        }
    }

    async fn sign(
        &self,
        request: &AssertionRequest,
        rp_id: &str,
        record: &CredentialRecord,
        caller: Option<&CallerIdentity>,
    ) -> Result<AssertionResponse, PasskeyError> {
        let origin = OriginResolver::new(self.ctx.app).resolve(request.origin.as_deref(), caller);
        let (client_data_json, client_data_hash) =
            match caller.and_then(|c| c.client_data_hash.clone()) {
                Some(hash) => {
                    debug!("Caller supplied clientDataHash, returning placeholder clientDataJSON");
                    (PLACEHOLDER.to_string(), hash)
                }
                None => {
                    let json = ClientData::get(
                        &request.challenge,
                        &origin,
                        caller.and_then(|c| c.package_name.as_deref()),
                    )
                    .to_json()?;
                    let hash = sha256(json.as_bytes()).to_vec();
                    (URL_SAFE_NO_PAD.encode(json.as_bytes()), hash)
                }
            };

        let signer = signer_for(&record.private_key, self.ctx.keystore)?;

        // Reserve the counter value before signing so overlapping assertions
        // for one credential never sign the same count
        let sign_count = self
            .ctx
            .store
            .increment_sign_count(&record.credential_id, Utc::now().timestamp_millis())
            .await?;

        let auth_data = authenticator_data::build(rp_id, sign_count, None)?;

        let mut signed = Vec::with_capacity(auth_data.len() + client_data_hash.len());
        signed.extend_from_slice(&auth_data);
        signed.extend_from_slice(&client_data_hash);

        let signature = signer.sign(&signed)?;

        let wire_id = record.wire_id();
        info!("🔓 Assertion for {rp_id} with {wire_id} (signCount={sign_count})");
        self.ctx.audit.record(
            AuditEvent::AuthSucceeded,
            &format!("{}|rpId={}|signCount={sign_count}", record.credential_id, record.rp_id),
        );

        Ok(AssertionResponse {
            id: wire_id.clone(),
            raw_id: wire_id,
            r#type: PUBLIC_KEY_TYPE.to_string(),
            authenticator_attachment: PLATFORM_ATTACHMENT.to_string(),
            response: AuthenticatorAssertionResponse {
                client_data_json,
                authenticator_data: URL_SAFE_NO_PAD.encode(&auth_data),
                signature: URL_SAFE_NO_PAD.encode(signature),
                user_handle: record.user_id.clone(),
                public_key_algorithm: record.algorithm,
                public_key: record.public_key_b64(),
            },
            client_extension_results: serde_json::Map::new(),
        })
    }

    fn audit_error(&self, subject: &str, err: &PasskeyError) {
        self.ctx
            .audit
            .record(AuditEvent::AuthFailed, &format!("{subject}|error={err}"));
    }
}
