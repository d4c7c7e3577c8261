//! Passkey registration
//!
//! Mints a fresh ES256 credential for a creation request and answers with a
//! "none" attestation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use log::{debug, info};

use super::audit::AuditEvent;
use super::context::FlowContext;
use super::errors::PasskeyError;
use super::identity::CallerIdentity;
use super::origin::OriginResolver;
use super::record::{CredentialRecord, PrivateKeyMaterial, SyncStatus};
use super::verification::Ceremony;
use crate::webauthn::authenticator_data::{self, AttestedCredential};
use crate::webauthn::client_data::PLACEHOLDER;
use crate::webauthn::crypto::{generate_credential_id, generate_key_pair, spki_from_point};
use crate::webauthn::{
    build_attestation_object, credential_id, encode_cose_key, AuthenticatorAttestationResponse,
    ClientData, CreationRequest, RegistrationResponse, ALG_ES256, PLATFORM_ATTACHMENT,
    PUBLIC_KEY_TYPE, REGISTRATION_TRANSPORTS,
};

/// Parse a creation request
///
/// # Errors
/// `MalformedRequest` for invalid JSON or a missing RP ID
pub fn parse_creation_request(request_json: &str) -> Result<CreationRequest, PasskeyError> {
    let request: CreationRequest = serde_json::from_str(request_json)?;
    if request.rp.id.trim().is_empty() {
        return Err(PasskeyError::MalformedRequest("Missing rp.id".to_string()));
    }
    Ok(request)
}

/// The registration ceremony
pub struct RegistrationFlow<'a> {
    ctx: FlowContext<'a>,
}

impl<'a> RegistrationFlow<'a> {
    #[must_use]
    pub fn new(ctx: FlowContext<'a>) -> Self {
        Self { ctx }
    }

    /// Create and persist a new passkey
    ///
    /// # Arguments
    /// * `request_json` - `PublicKeyCredentialCreationOptions` JSON
    /// * `caller` - Identity of the calling app, if known
    /// * `pin` - Knowledge factor collected by the front end
    ///
    /// # Errors
    /// Returns a `PasskeyError` for malformed requests, declined verification,
    /// key generation, encoding or storage failures
    pub async fn run(
        &self,
        request_json: &str,
        caller: Option<&CallerIdentity>,
        pin: Option<String>,
    ) -> Result<RegistrationResponse, PasskeyError> {
        let request = match parse_creation_request(request_json) {
            Ok(request) => request,
            Err(err) => {
                self.ctx
                    .audit
                    .record(AuditEvent::CreateFailed, &format!("rpId=|error={err}"));
                return Err(err);
            }
        };
        let rp_id = request.rp.id.trim().to_string();

        self.ctx
            .require_verification(Ceremony::Create, &rp_id, &rp_id, pin)
            .await?;

        match self.mint(&request, &rp_id, caller).await {
            Ok(response) => Ok(response),
            Err(err) => {
                self.ctx
                    .audit
                    .record(AuditEvent::CreateFailed, &format!("rpId={rp_id}|error={err}"));
                Err(err)
            }
        }
    }

    async fn mint(
        &self,
        request: &CreationRequest,
        rp_id: &str,
        caller: Option<&CallerIdentity>,
    ) -> Result<RegistrationResponse, PasskeyError> {
        if !request.pub_key_cred_params.is_empty()
            && !request
                .pub_key_cred_params
                .iter()
                .any(|p| p.alg == i64::from(ALG_ES256))
        {
            debug!("No ES256 in pubKeyCredParams, using ES256 anyway");
        }

        let raw_id = generate_credential_id()?;
        let key_pair = generate_key_pair()?;
        let cose_key = encode_cose_key(key_pair.x(), key_pair.y())?;

        let attested = AttestedCredential {
            aaguid: self.ctx.aaguid,
            credential_id: raw_id.to_vec(),
            cose_key,
        };
        let auth_data = authenticator_data::build(rp_id, 0, Some(&attested))?;
        let attestation_object = build_attestation_object(&auth_data)?;

        let client_data_json = if caller.is_some_and(|c| c.client_data_hash.is_some()) {
            debug!("Caller supplied clientDataHash, returning placeholder clientDataJSON");
            PLACEHOLDER.to_string()
        } else {
            let origin =
                OriginResolver::new(self.ctx.app).resolve(request.origin.as_deref(), caller);
            let json = ClientData::create(
                &request.challenge,
                &origin,
                caller.and_then(|c| c.package_name.as_deref()),
            )
            .to_json()?;
            debug!("Built clientDataJSON with origin: {origin}");
            URL_SAFE_NO_PAD.encode(json.as_bytes())
        };

        let public_key = spki_from_point(&key_pair.public_point)?;
        let wire_id = URL_SAFE_NO_PAD.encode(raw_id);
        let transports: Vec<String> = REGISTRATION_TRANSPORTS.iter().map(ToString::to_string).collect();
        let now = Utc::now().timestamp_millis();

        let record = CredentialRecord {
            credential_id: credential_id::from_raw(&raw_id),
            rp_id: rp_id.to_string(),
            rp_name: request.rp_name().to_string(),
            user_id: request.user.id.clone(),
            user_name: request.user.name.clone(),
            user_display_name: if request.user.display_name.is_empty() {
                request.user.name.clone()
            } else {
                request.user.display_name.clone()
            },
            public_key: public_key.clone(),
            private_key: PrivateKeyMaterial::Raw(key_pair.pkcs8),
            algorithm: ALG_ES256,
            created_at: now,
            last_used_at: now,
            use_count: 0,
            sign_count: 0,
            is_discoverable: request.is_discoverable(),
            sync_status: SyncStatus::None,
            transports: transports.clone(),
            aaguid: Some(credential_id::from_raw(&self.ctx.aaguid)),
            bound_item_id: None,
            notes: None,
        };
        self.ctx.store.insert(record).await?;

        info!("🔑 Passkey created for {rp_id}: {wire_id}");
        self.ctx.audit.record(
            AuditEvent::CreateSucceeded,
            &format!("{wire_id}|rpId={rp_id}|userName={}", request.user.name),
        );

        Ok(RegistrationResponse {
            id: wire_id.clone(),
            raw_id: wire_id,
            r#type: PUBLIC_KEY_TYPE.to_string(),
            authenticator_attachment: PLATFORM_ATTACHMENT.to_string(),
            response: AuthenticatorAttestationResponse {
                client_data_json,
                attestation_object: URL_SAFE_NO_PAD.encode(attestation_object),
                public_key_algorithm: ALG_ES256,
                public_key: URL_SAFE_NO_PAD.encode(public_key),
                authenticator_data: URL_SAFE_NO_PAD.encode(auth_data),
                transports,
            },
            client_extension_results: serde_json::Map::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requires_rp_id() {
        assert!(matches!(
            parse_creation_request(r#"{"rp":{"name":"x"}}"#),
            Err(PasskeyError::MalformedRequest(_))
        ));
        assert!(matches!(
            parse_creation_request("not json"),
            Err(PasskeyError::MalformedRequest(_))
        ));
        assert!(parse_creation_request(r#"{"rp":{"id":"example.com"}}"#).is_ok());
    }
}
