//! Passkey provider service
//!
//! Owns the ports and answers the platform's four provider calls: list
//! candidate credentials, offer a create entry, register and assert.

use chrono::Utc;
use log::{error, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use super::assertion::{parse_assertion_request, AssertionFlow};
use super::audit::{AuditTrail, LogAuditTrail};
use super::context::FlowContext;
use super::errors::{PasskeyError, ProviderFailure};
use super::file_store::EncryptedFileStore;
use super::identity::{AppIdentity, CallerIdentity, LocalAppIdentity};
use super::keys::SecureKeyStore;
use super::record::CredentialRecord;
use super::registration::{parse_creation_request, RegistrationFlow};
use super::resolution::{ColdStartPolicy, CredentialResolutionEngine};
use super::store::{CredentialStore, InMemoryCredentialStore, StoreError};
use super::verification::{PinGate, VerificationGate};
use crate::settings::PasskeySettings;
use crate::utils::logging::LoggingHelper;
use crate::webauthn::authenticator_data::DEFAULT_AAGUID;
use crate::webauthn::credential_id::normalize;
use crate::webauthn::{AssertionResponse, RegistrationResponse};

const DEFAULT_PROVIDER_NAME: &str = "Monica";

/// A credential offered to the user for an assertion
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialEntry {
    /// Base64URL credential ID handed back on selection
    pub credential_id: String,
    pub title: String,
    pub subtitle: String,
    pub rp_id: String,
}

impl From<&CredentialRecord> for CredentialEntry {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            credential_id: record.wire_id(),
            title: record.display_title().to_string(),
            subtitle: record.rp_name.clone(),
            rp_id: record.rp_id.clone(),
        }
    }
}

/// The entry offered for a registration
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntry {
    pub title: String,
    pub rp_id: String,
    pub user_name: String,
    pub is_discoverable: bool,
}

/// Platform passkey provider
pub struct PasskeyProvider {
    store: Arc<dyn CredentialStore>,
    gate: Arc<dyn VerificationGate>,
    app: Arc<dyn AppIdentity>,
    audit: Arc<dyn AuditTrail>,
    keystore: Option<Arc<dyn SecureKeyStore>>,
    aaguid: [u8; 16],
    cold_start: ColdStartPolicy,
    provider_name: String,
}

impl PasskeyProvider {
    /// Create a provider with the default audit trail, AAGUID and cold-start policy
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        gate: Arc<dyn VerificationGate>,
        app: Arc<dyn AppIdentity>,
    ) -> Self {
        Self {
            store,
            gate,
            app,
            audit: Arc::new(LogAuditTrail),
            keystore: None,
            aaguid: DEFAULT_AAGUID,
            cold_start: ColdStartPolicy::default(),
            provider_name: DEFAULT_PROVIDER_NAME.to_string(),
        }
    }

    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditTrail>) -> Self {
        self.audit = audit;
        self
    }

    #[must_use]
    pub fn with_keystore(mut self, keystore: Arc<dyn SecureKeyStore>) -> Self {
        self.keystore = Some(keystore);
        self
    }

    #[must_use]
    pub fn with_cold_start(mut self, policy: ColdStartPolicy) -> Self {
        self.cold_start = policy;
        self
    }

    #[must_use]
    pub fn with_aaguid(mut self, aaguid: [u8; 16]) -> Self {
        self.aaguid = aaguid;
        self
    }

    #[must_use]
    pub fn with_provider_name(mut self, name: &str) -> Self {
        self.provider_name = name.to_string();
        self
    }

    /// Build a provider from settings
    ///
    /// An empty `store.path` keeps credentials in memory.
    ///
    /// # Errors
    /// Returns an error if the store file exists but cannot be decrypted
    pub fn from_settings(settings: &PasskeySettings) -> anyhow::Result<Self> {
        let store: Arc<dyn CredentialStore> = if settings.store.path.trim().is_empty() {
            warn!("No store path configured, passkeys will not survive a restart");
            Arc::new(InMemoryCredentialStore::new())
        } else {
            Arc::new(EncryptedFileStore::open(
                PathBuf::from(settings.store.path.trim()),
                settings.store.encryption_key.as_bytes(),
            )?)
        };

        let gate = Arc::new(PinGate::new(
            settings.verification.pin_salt.as_bytes(),
            &settings.verification.pin_digest,
        ));
        let app = Arc::new(LocalAppIdentity::new(settings.signing_certificate_path()));

        Ok(Self::new(store, gate, app)
            .with_aaguid(settings.aaguid_bytes())
            .with_cold_start(settings.cold_start_policy())
            .with_provider_name(&settings.application.provider_name))
    }

    fn ctx(&self) -> FlowContext<'_> {
        FlowContext {
            store: self.store.as_ref(),
            gate: self.gate.as_ref(),
            app: self.app.as_ref(),
            audit: self.audit.as_ref(),
            keystore: self.keystore.as_deref(),
            aaguid: self.aaguid,
        }
    }

    #[must_use]
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    /// List credentials that can answer an assertion request
    ///
    /// Failures are logged and produce an empty list.
    pub async fn begin_get(&self, request_json: &str) -> Vec<CredentialEntry> {
        let request = match parse_assertion_request(request_json) {
            Ok(request) => request,
            Err(e) => {
                error!("Failed to parse assertion request: {e}");
                return Vec::new();
            }
        };

        let allowed: HashSet<String> = request
            .allow_credentials
            .iter()
            .filter_map(|descriptor| normalize(&descriptor.id))
            .collect();

        match self.lookup(&request.rp_id, &allowed).await {
            Ok(records) => records.iter().map(CredentialEntry::from).collect(),
            Err(e) => {
                error!("Failed to resolve passkeys for {:?}: {e}", request.rp_id);
                Vec::new()
            }
        }
    }

    /// Strict pass, allow-list fallback, then the cold-start retry
    async fn lookup(
        &self,
        rp_id: &str,
        allowed: &HashSet<String>,
    ) -> Result<Vec<CredentialRecord>, StoreError> {
        let engine = CredentialResolutionEngine::new(self.store.as_ref());

        let mut records = engine.resolve(rp_id, allowed, true).await?;
        LoggingHelper::log_resolution_pass("strict", rp_id, allowed.len(), records.len());

        if records.is_empty() && !allowed.is_empty() {
            records = engine.resolve(rp_id, allowed, false).await?;
            LoggingHelper::log_resolution_pass("relaxed", rp_id, allowed.len(), records.len());
        }

        if records.is_empty() && self.cold_start.is_recent(self.app.last_update_time(), Utc::now()) {
            for attempt in 0..self.cold_start.max_attempts {
                if let Err(e) = self.store.ping().await {
                    warn!("Store warm-up failed: {e}");
                }
                let delay = self.cold_start.delay_for(attempt);
                LoggingHelper::log_cold_start_retry(attempt + 1, delay);
                tokio::time::sleep(delay).await;

                records = engine.resolve(rp_id, allowed, false).await?;
                LoggingHelper::log_resolution_pass("cold-start", rp_id, allowed.len(), records.len());
                if !records.is_empty() {
                    break;
                }
            }
        }

        Ok(records)
    }

    /// Describe the entry offered for a creation request
    ///
    /// # Errors
    /// `MalformedRequest` when the request cannot be parsed or has no RP ID
    pub fn begin_create(&self, request_json: &str) -> Result<CreateEntry, PasskeyError> {
        let request = parse_creation_request(request_json)?;
        Ok(CreateEntry {
            title: format!("{} - {}", self.provider_name, request.rp_name()),
            rp_id: request.rp.id.trim().to_string(),
            user_name: request.user.name.clone(),
            is_discoverable: request.is_discoverable(),
        })
    }

    /// Register a new passkey
    ///
    /// # Errors
    /// A `ProviderFailure` with kind `cancelled` when the user declined
    /// verification, `unknown` otherwise
    pub async fn create(
        &self,
        request_json: &str,
        caller: Option<&CallerIdentity>,
        pin: Option<String>,
    ) -> Result<RegistrationResponse, ProviderFailure> {
        RegistrationFlow::new(self.ctx())
            .run(request_json, caller, pin)
            .await
            .map_err(|e| {
                error!("Passkey creation failed: {e}");
                ProviderFailure::from(e)
            })
    }

    /// Sign an assertion with the selected passkey
    ///
    /// # Errors
    /// A `ProviderFailure` with kind `cancelled` when the user declined
    /// verification, `unknown` otherwise
    pub async fn get(
        &self,
        request_json: &str,
        credential_id: &str,
        caller: Option<&CallerIdentity>,
        pin: Option<String>,
    ) -> Result<AssertionResponse, ProviderFailure> {
        AssertionFlow::new(self.ctx())
            .run(request_json, credential_id, caller, pin)
            .await
            .map_err(|e| {
                error!("Passkey assertion failed: {e}");
                ProviderFailure::from(e)
            })
    }

    /// Clear any per-session credential state
    ///
    /// # Errors
    /// Never fails; no login state is held
    pub fn clear_credential_state(&self) -> Result<(), ProviderFailure> {
        info!("Clear credential state requested");
        Ok(())
    }
}
