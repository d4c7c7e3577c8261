//! Origin resolution for client data
//!
//! Order of precedence: the request's own `origin`, the origin asserted by the
//! caller, a hash of the caller's signing certificate, and finally a hash of
//! this application's signing certificate.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use log::{debug, warn};

use super::identity::{AppIdentity, CallerIdentity};
use crate::webauthn::crypto::sha256;

/// Scheme prefix of app-derived origins
pub const APK_KEY_HASH_PREFIX: &str = "android:apk-key-hash:";

/// Derives the origin written into `clientDataJSON`
pub struct OriginResolver<'a> {
    app: &'a dyn AppIdentity,
}

impl<'a> OriginResolver<'a> {
    #[must_use]
    pub fn new(app: &'a dyn AppIdentity) -> Self {
        Self { app }
    }

    /// Resolve the origin for one request
    ///
    /// Never fails: when every source is unavailable the result is the
    /// prefix followed by an empty hash.
    #[must_use]
    pub fn resolve(&self, request_origin: Option<&str>, caller: Option<&CallerIdentity>) -> String {
        if let Some(origin) = non_blank(request_origin) {
            debug!("Using origin from request: {origin}");
            return origin.to_string();
        }

        if let Some(caller) = caller {
            if let Some(origin) = non_blank(caller.origin.as_deref()) {
                debug!("Using origin asserted by caller: {origin}");
                return origin.to_string();
            }
            if let Some(certificate) = caller.signing_certificate.as_deref().filter(|c| !c.is_empty()) {
                return apk_key_hash_origin(certificate);
            }
        }

        match self.app.signing_certificate() {
            Ok(certificate) if !certificate.is_empty() => apk_key_hash_origin(&certificate),
            Ok(_) => {
                warn!("Application signing certificate is empty");
                APK_KEY_HASH_PREFIX.to_string()
            }
            Err(e) => {
                warn!("Failed to get app signing hash: {e:#}");
                APK_KEY_HASH_PREFIX.to_string()
            }
        }
    }
}

/// `android:apk-key-hash:` + Base64URL(SHA-256(certificate))
#[must_use]
pub fn apk_key_hash_origin(certificate: &[u8]) -> String {
    format!(
        "{APK_KEY_HASH_PREFIX}{}",
        URL_SAFE_NO_PAD.encode(sha256(certificate))
    )
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
