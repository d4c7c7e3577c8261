//! Unified testing utilities for the passkey provider
//!
//! ## Organization
//!
//! - [`fixtures`] - Request JSON and ready-made providers
//! - [`builders`] - Fluent builders for credential records
//! - [`mock`] - Fake ports (verification gate, app identity, audit, key store, stores)
//!
//! ## Usage
//!
//! ```ignore
//! use passkey_provider::testing::{builders::CredentialRecordBuilder, fixtures::TestFixtures};
//!
//! let record = CredentialRecordBuilder::new("example.com")
//!     .user_name("alice")
//!     .build();
//! let request = TestFixtures::assertion_request("example.com", &[]);
//! ```

pub mod builders;
pub mod fixtures;
pub mod mock;

// Re-export commonly used items for convenience
pub use builders::CredentialRecordBuilder;
pub use fixtures::TestFixtures;

/// Common test constants
pub mod constants {
    /// Default relying party ID
    pub const TEST_RP_ID: &str = "example.com";

    /// Default relying party name
    pub const TEST_RP_NAME: &str = "Example";

    /// Default origin
    pub const TEST_ORIGIN: &str = "https://example.com";

    /// Default user handle (Base64URL of "user-1234")
    pub const TEST_USER_ID: &str = "dXNlci0xMjM0";

    /// Default user name
    pub const TEST_USER_NAME: &str = "alice@example.com";

    /// Default user display name
    pub const TEST_DISPLAY_NAME: &str = "Alice";

    /// Default challenge (Base64URL of "test-challenge")
    pub const TEST_CHALLENGE: &str = "dGVzdC1jaGFsbGVuZ2U";

    /// Default calling package
    pub const TEST_PACKAGE: &str = "com.example.app";

    /// PIN accepted by the default gate
    pub const TEST_PIN: &str = "2468";

    /// Salt of the default PIN digest
    pub const TEST_PIN_SALT: &[u8] = b"test-pin-salt";

    /// Store encryption key material
    pub const TEST_STORE_KEY: &[u8] = b"test_key_32_bytes_long_for_test_";
}
