//! Passkey audit trail

use log::info;
use std::fmt;

/// One audit-worthy outcome of a ceremony
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    CreateVerificationRequested,
    CreateVerificationSucceeded,
    CreateVerificationFailed,
    CreateVerificationCancelled,
    CreateSucceeded,
    CreateFailed,
    AuthVerificationRequested,
    AuthVerificationSucceeded,
    AuthVerificationFailed,
    AuthVerificationCancelled,
    AuthSucceeded,
    AuthCredentialNotFound,
    AuthFailed,
}

impl AuditEvent {
    /// Stable tag written to the audit log
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            AuditEvent::CreateVerificationRequested => "PASSKEY_CREATE_BIOMETRIC_REQUESTED",
            AuditEvent::CreateVerificationSucceeded => "PASSKEY_CREATE_BIOMETRIC_SUCCESS",
            AuditEvent::CreateVerificationFailed => "PASSKEY_CREATE_BIOMETRIC_FAILED",
            AuditEvent::CreateVerificationCancelled => "PASSKEY_CREATE_BIOMETRIC_CANCELLED",
            AuditEvent::CreateSucceeded => "PASSKEY_CREATE_SUCCESS",
            AuditEvent::CreateFailed => "PASSKEY_CREATE_ERROR",
            AuditEvent::AuthVerificationRequested => "PASSKEY_AUTH_BIOMETRIC_REQUESTED",
            AuditEvent::AuthVerificationSucceeded => "PASSKEY_AUTH_BIOMETRIC_SUCCESS",
            AuditEvent::AuthVerificationFailed => "PASSKEY_AUTH_BIOMETRIC_FAILED",
            AuditEvent::AuthVerificationCancelled => "PASSKEY_AUTH_BIOMETRIC_CANCELLED",
            AuditEvent::AuthSucceeded => "PASSKEY_AUTH_SUCCESS",
            AuditEvent::AuthCredentialNotFound => "PASSKEY_AUTH_NOT_FOUND",
            AuditEvent::AuthFailed => "PASSKEY_AUTH_ERROR",
        }
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Sink for audit events
///
/// `detail` is a `|`-separated string such as `"<id>|rpId=example.com"`.
pub trait AuditTrail: Send + Sync {
    fn record(&self, event: AuditEvent, detail: &str);
}

/// Audit trail writing to the `passkey::audit` log target
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAuditTrail;

impl AuditTrail for LogAuditTrail {
    fn record(&self, event: AuditEvent, detail: &str) {
        info!(target: "passkey::audit", "{event} {detail}");
    }
}
