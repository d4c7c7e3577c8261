//! Mock objects and fake implementations for testing
//!
//! Fakes for every port of `PasskeyProvider` so flows can run without a
//! platform behind them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::passkey::{
    AppIdentity, AuditEvent, AuditTrail, CredentialRecord, CredentialStore,
    InMemoryCredentialStore, PasskeyError, SecureKeyStore, StoreError, VerificationGate,
    VerificationOutcome, VerificationPrompt,
};

/// Gate returning a fixed outcome and remembering every prompt
pub struct ScriptedGate {
    outcome: VerificationOutcome,
    prompts: Mutex<Vec<VerificationPrompt>>,
    delay: Duration,
}

impl ScriptedGate {
    #[must_use]
    pub fn new(outcome: VerificationOutcome) -> Self {
        Self {
            outcome,
            prompts: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    /// Hold every prompt open for `delay`, like a user reading the sheet
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn approving() -> Self {
        Self::new(VerificationOutcome::Success)
    }

    #[must_use]
    pub fn cancelling() -> Self {
        Self::new(VerificationOutcome::Cancelled)
    }

    #[must_use]
    pub fn failing(reason: &str) -> Self {
        Self::new(VerificationOutcome::Failure(reason.to_string()))
    }

    /// Prompts seen so far
    ///
    /// # Panics
    ///
    /// Panics if the prompt log is poisoned.
    #[must_use]
    pub fn prompts(&self) -> Vec<VerificationPrompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl VerificationGate for ScriptedGate {
    async fn verify(&self, prompt: &VerificationPrompt) -> VerificationOutcome {
        self.prompts.lock().unwrap().push(prompt.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone()
    }
}

/// App identity with a fixed certificate and update time
#[derive(Debug, Clone, Default)]
pub struct StaticAppIdentity {
    pub certificate: Option<Vec<u8>>,
    pub last_update: Option<DateTime<Utc>>,
}

impl StaticAppIdentity {
    /// Installed long ago, so the cold-start retry never arms
    #[must_use]
    pub fn settled() -> Self {
        Self {
            certificate: Some(b"test-signing-certificate".to_vec()),
            last_update: Some(Utc::now() - chrono::Duration::days(30)),
        }
    }

    /// Updated just now
    #[must_use]
    pub fn just_updated() -> Self {
        Self {
            last_update: Some(Utc::now()),
            ..Self::settled()
        }
    }
}

impl AppIdentity for StaticAppIdentity {
    fn signing_certificate(&self) -> anyhow::Result<Vec<u8>> {
        self.certificate
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no certificate"))
    }

    fn last_update_time(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }
}

/// Audit trail keeping every event in memory
#[derive(Debug, Default)]
pub struct RecordingAuditTrail {
    events: Mutex<Vec<(AuditEvent, String)>>,
}

impl RecordingAuditTrail {
    /// Recorded events in order
    ///
    /// # Panics
    ///
    /// Panics if the event log is poisoned.
    #[must_use]
    pub fn events(&self) -> Vec<(AuditEvent, String)> {
        self.events.lock().unwrap().clone()
    }

    /// Recorded event kinds in order
    #[must_use]
    pub fn kinds(&self) -> Vec<AuditEvent> {
        self.events().into_iter().map(|(event, _)| event).collect()
    }
}

impl AuditTrail for RecordingAuditTrail {
    fn record(&self, event: AuditEvent, detail: &str) {
        self.events.lock().unwrap().push((event, detail.to_string()));
    }
}

/// Key store holding PKCS#8 keys under aliases
#[derive(Default)]
pub struct FakeKeyStore {
    keys: HashMap<String, Vec<u8>>,
}

impl FakeKeyStore {
    #[must_use]
    pub fn with_key(mut self, alias: &str, pkcs8: Vec<u8>) -> Self {
        self.keys.insert(alias.to_string(), pkcs8);
        self
    }
}

impl SecureKeyStore for FakeKeyStore {
    fn sign(&self, alias: &str, message: &[u8]) -> Result<Vec<u8>, PasskeyError> {
        let pkcs8 = self
            .keys
            .get(alias)
            .ok_or_else(|| PasskeyError::SigningFailure(format!("Private key not found: {alias}")))?;
        let rng = SystemRandom::new();
        let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8, &rng)
            .map_err(|e| PasskeyError::SigningFailure(e.to_string()))?;
        key_pair
            .sign(&rng, message)
            .map(|sig| sig.as_ref().to_vec())
            .map_err(|e| PasskeyError::SigningFailure(e.to_string()))
    }
}

/// Store that looks empty until it has been pinged, like a database that
/// is still opening right after an app update
#[derive(Default)]
pub struct ColdStartStore {
    inner: InMemoryCredentialStore,
    warm: AtomicBool,
    pings: AtomicUsize,
}

impl ColdStartStore {
    #[must_use]
    pub fn with_records(records: Vec<CredentialRecord>) -> Self {
        Self {
            inner: InMemoryCredentialStore::with_records(records),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn ping_count(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    fn is_warm(&self) -> bool {
        self.warm.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for ColdStartStore {
    async fn get_by_normalized_id(
        &self,
        id: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        if !self.is_warm() {
            return Ok(None);
        }
        self.inner.get_by_normalized_id(id).await
    }

    async fn get_all_by_rp_id(&self, rp_id: &str) -> Result<Vec<CredentialRecord>, StoreError> {
        if !self.is_warm() {
            return Ok(Vec::new());
        }
        self.inner.get_all_by_rp_id(rp_id).await
    }

    async fn get_all_discoverable(&self) -> Result<Vec<CredentialRecord>, StoreError> {
        if !self.is_warm() {
            return Ok(Vec::new());
        }
        self.inner.get_all_discoverable().await
    }

    async fn get_all(&self) -> Result<Vec<CredentialRecord>, StoreError> {
        if !self.is_warm() {
            return Ok(Vec::new());
        }
        self.inner.get_all().await
    }

    async fn insert(&self, record: CredentialRecord) -> Result<(), StoreError> {
        self.inner.insert(record).await
    }

    async fn increment_sign_count(&self, id: &str, timestamp: i64) -> Result<u32, StoreError> {
        self.inner.increment_sign_count(id, timestamp).await
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.inner.delete(id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        self.warm.store(true, Ordering::SeqCst);
        Ok(())
    }
}
