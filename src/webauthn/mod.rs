//! `WebAuthn` implementation
//!
//! This module provides the authenticator side of the W3C `WebAuthn` data
//! formats independent of any storage or user-verification mechanism:
//! credential ID encodings, COSE keys, authenticator data, "none" attestation
//! objects, client data and the ES256 primitives behind them.

pub mod attestation;
pub mod authenticator_data;
pub mod cbor;
pub mod client_data;
pub mod credential_id;
pub mod crypto;
mod errors;
mod types;

// Re-exports for public use
pub use attestation::build_attestation_object;
pub use authenticator_data::AttestedCredential;
pub use cbor::{encode_cose_key, AttestationObject};
pub use client_data::ClientData;
pub use errors::WebAuthnError;
pub use types::*;
