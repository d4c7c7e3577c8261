//! Passkey provider
//!
//! This module implements the authenticator side of passkeys: credential
//! storage, resolution, user verification and the registration and assertion
//! ceremonies, exposed through `PasskeyProvider`.

pub mod announce;
pub mod assertion;
pub mod audit;
mod context;
mod errors;
pub mod file_store;
pub mod identity;
pub mod keys;
pub mod origin;
pub mod record;
pub mod registration;
pub mod resolution;
mod service;
pub mod store;
pub mod verification;

pub use announce::{LogAnnouncer, OnceAnnouncer, ProviderAnnouncer};
pub use audit::{AuditEvent, AuditTrail, LogAuditTrail};
pub use context::FlowContext;
pub use errors::{FailureKind, PasskeyError, ProviderFailure};
pub use file_store::EncryptedFileStore;
pub use identity::{AppIdentity, CallerIdentity, LocalAppIdentity};
pub use keys::{CredentialSigner, SecureKeyStore};
pub use record::{CredentialRecord, PrivateKeyMaterial, SyncStatus};
pub use resolution::{ColdStartPolicy, CredentialResolutionEngine};
pub use service::{CreateEntry, CredentialEntry, PasskeyProvider};
pub use store::{CredentialStore, InMemoryCredentialStore, StoreError};
pub use verification::{
    Ceremony, PinGate, VerificationGate, VerificationOutcome, VerificationPrompt,
};
