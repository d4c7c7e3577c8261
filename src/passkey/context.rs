//! Ports shared by the registration and assertion flows

use log::{info, warn};

use super::audit::{AuditEvent, AuditTrail};
use super::errors::PasskeyError;
use super::identity::AppIdentity;
use super::keys::SecureKeyStore;
use super::store::CredentialStore;
use super::verification::{Ceremony, VerificationGate, VerificationOutcome, VerificationPrompt};

/// Borrowed collaborators for one ceremony
#[derive(Clone, Copy)]
pub struct FlowContext<'a> {
    pub store: &'a dyn CredentialStore,
    pub gate: &'a dyn VerificationGate,
    pub app: &'a dyn AppIdentity,
    pub audit: &'a dyn AuditTrail,
    pub keystore: Option<&'a dyn SecureKeyStore>,
    /// AAGUID written into attested credential data
    pub aaguid: [u8; 16],
}

impl FlowContext<'_> {
    /// Ask the verification gate and audit every step
    ///
    /// `subject` identifies what is being verified in the audit log (the RP ID
    /// for registrations, the credential ID for assertions).
    ///
    /// # Errors
    /// `VerificationFailed` or `VerificationCancelled` unless the gate succeeds
    pub(crate) async fn require_verification(
        &self,
        ceremony: Ceremony,
        rp_id: &str,
        subject: &str,
        pin: Option<String>,
    ) -> Result<(), PasskeyError> {
        let (requested, succeeded, failed, cancelled) = match ceremony {
            Ceremony::Create => (
                AuditEvent::CreateVerificationRequested,
                AuditEvent::CreateVerificationSucceeded,
                AuditEvent::CreateVerificationFailed,
                AuditEvent::CreateVerificationCancelled,
            ),
            Ceremony::Get => (
                AuditEvent::AuthVerificationRequested,
                AuditEvent::AuthVerificationSucceeded,
                AuditEvent::AuthVerificationFailed,
                AuditEvent::AuthVerificationCancelled,
            ),
        };

        self.audit.record(requested, subject);
        let prompt = VerificationPrompt::new(ceremony, rp_id, pin);
        match self.gate.verify(&prompt).await {
            VerificationOutcome::Success => {
                self.audit.record(succeeded, subject);
                Ok(())
            }
            VerificationOutcome::Failure(reason) => {
                warn!("User verification failed for {ceremony}: {reason}");
                self.audit.record(failed, &format!("{subject}|error={reason}"));
                Err(PasskeyError::VerificationFailed(reason))
            }
            VerificationOutcome::Cancelled => {
                info!("User verification cancelled for {ceremony}");
                self.audit.record(cancelled, subject);
                Err(PasskeyError::VerificationCancelled)
            }
        }
    }
}
