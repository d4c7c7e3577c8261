//! Caller and authenticator identity

use chrono::{DateTime, Utc};
use log::warn;
use std::path::PathBuf;

/// Per-request facts about the calling application
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Origin asserted by a privileged caller (e.g. a browser)
    pub origin: Option<String>,
    pub package_name: Option<String>,
    /// DER signing certificate of the calling app
    pub signing_certificate: Option<Vec<u8>>,
    /// Client data hash computed by the caller; when present the
    /// authenticator does not build `clientDataJSON` for signing
    pub client_data_hash: Option<Vec<u8>>,
}

impl CallerIdentity {
    #[must_use]
    pub fn with_package(package_name: &str) -> Self {
        Self {
            package_name: Some(package_name.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn origin(mut self, origin: &str) -> Self {
        self.origin = Some(origin.to_string());
        self
    }

    #[must_use]
    pub fn signing_certificate(mut self, certificate: Vec<u8>) -> Self {
        self.signing_certificate = Some(certificate);
        self
    }

    #[must_use]
    pub fn client_data_hash(mut self, hash: Vec<u8>) -> Self {
        self.client_data_hash = Some(hash);
        self
    }
}

/// Facts about the authenticator's own installation
pub trait AppIdentity: Send + Sync {
    /// DER signing certificate of this application
    ///
    /// # Errors
    /// Returns an error if the certificate cannot be read
    fn signing_certificate(&self) -> anyhow::Result<Vec<u8>>;

    /// When this application was last installed or updated
    fn last_update_time(&self) -> Option<DateTime<Utc>>;
}

/// Identity read from the local installation
pub struct LocalAppIdentity {
    certificate_path: Option<PathBuf>,
}

impl LocalAppIdentity {
    #[must_use]
    pub fn new(certificate_path: Option<PathBuf>) -> Self {
        Self { certificate_path }
    }
}

impl AppIdentity for LocalAppIdentity {
    fn signing_certificate(&self) -> anyhow::Result<Vec<u8>> {
        let path = self
            .certificate_path
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No signing certificate configured"))?;
        std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))
    }

    fn last_update_time(&self) -> Option<DateTime<Utc>> {
        let modified = std::env::current_exe()
            .and_then(std::fs::metadata)
            .and_then(|meta| meta.modified());
        match modified {
            Ok(time) => Some(DateTime::<Utc>::from(time)),
            Err(e) => {
                warn!("Could not determine install time: {e}");
                None
            }
        }
    }
}
