#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the passkey provider
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod handlers;
pub mod passkey;
pub mod settings;
pub mod utils;
pub mod webauthn;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use passkey::{
    CallerIdentity, CredentialRecord, CredentialStore, PasskeyError, PasskeyProvider,
    ProviderFailure,
};
pub use settings::PasskeySettings;
