//! User verification gate
//!
//! Every ceremony is gated by exactly one verification outcome. The bundled
//! [`PinGate`] checks a knowledge factor against a salted HMAC digest.

use async_trait::async_trait;
use std::fmt;

use crate::utils::crypto::verify_pin_digest;

/// Which ceremony is asking for verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ceremony {
    Create,
    Get,
}

impl fmt::Display for Ceremony {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ceremony::Create => write!(f, "create"),
            Ceremony::Get => write!(f, "get"),
        }
    }
}

/// What the user is asked to confirm
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationPrompt {
    pub ceremony: Ceremony,
    pub title: String,
    pub subtitle: String,
    pub rp_id: String,
    /// Knowledge factor entered by the user, if the front end collected one
    pub pin: Option<String>,
}

impl VerificationPrompt {
    #[must_use]
    pub fn new(ceremony: Ceremony, rp_id: &str, pin: Option<String>) -> Self {
        let title = match ceremony {
            Ceremony::Create => "Create passkey",
            Ceremony::Get => "Use passkey",
        };
        Self {
            ceremony,
            title: title.to_string(),
            subtitle: format!("Verify your identity for {rp_id}"),
            rp_id: rp_id.to_string(),
            pin,
        }
    }
}

impl fmt::Debug for VerificationPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationPrompt")
            .field("ceremony", &self.ceremony)
            .field("title", &self.title)
            .field("subtitle", &self.subtitle)
            .field("rp_id", &self.rp_id)
            .field("pin", &self.pin.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Result of a verification attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Success,
    Failure(String),
    Cancelled,
}

/// Local user verification
#[async_trait]
pub trait VerificationGate: Send + Sync {
    /// Present the prompt and report exactly one outcome
    async fn verify(&self, prompt: &VerificationPrompt) -> VerificationOutcome;
}

/// Knowledge-factor gate backed by an HMAC-SHA256 digest
pub struct PinGate {
    salt: Vec<u8>,
    digest: String,
}

impl PinGate {
    /// # Arguments
    /// * `salt` - HMAC key the digest was computed with
    /// * `digest` - Base64URL HMAC-SHA256(salt, PIN)
    #[must_use]
    pub fn new(salt: &[u8], digest: &str) -> Self {
        Self {
            salt: salt.to_vec(),
            digest: digest.trim().to_string(),
        }
    }
}

#[async_trait]
impl VerificationGate for PinGate {
    async fn verify(&self, prompt: &VerificationPrompt) -> VerificationOutcome {
        let Some(pin) = prompt.pin.as_deref().filter(|p| !p.is_empty()) else {
            return VerificationOutcome::Cancelled;
        };
        if self.digest.is_empty() {
            return VerificationOutcome::Failure("No verification PIN configured".to_string());
        }
        if verify_pin_digest(&self.salt, pin, &self.digest) {
            VerificationOutcome::Success
        } else {
            VerificationOutcome::Failure("PIN mismatch".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crypto::pin_digest;

    fn gate() -> PinGate {
        PinGate::new(b"salt", &pin_digest(b"salt", "2468").unwrap())
    }

    #[tokio::test]
    async fn test_matching_pin_succeeds() {
        let prompt = VerificationPrompt::new(Ceremony::Get, "example.com", Some("2468".to_string()));
        assert_eq!(gate().verify(&prompt).await, VerificationOutcome::Success);
    }

    #[tokio::test]
    async fn test_wrong_pin_fails() {
        let prompt = VerificationPrompt::new(Ceremony::Get, "example.com", Some("1357".to_string()));
        assert!(matches!(
            gate().verify(&prompt).await,
            VerificationOutcome::Failure(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_pin_cancels() {
        let prompt = VerificationPrompt::new(Ceremony::Create, "example.com", None);
        assert_eq!(gate().verify(&prompt).await, VerificationOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_unconfigured_gate_fails() {
        let prompt = VerificationPrompt::new(Ceremony::Create, "rp", Some("1".to_string()));
        assert!(matches!(
            PinGate::new(b"salt", "").verify(&prompt).await,
            VerificationOutcome::Failure(_)
        ));
    }

    #[test]
    fn test_prompt_debug_redacts_pin() {
        let prompt = VerificationPrompt::new(Ceremony::Create, "rp", Some("9999".to_string()));
        let debug = format!("{prompt:?}");
        assert!(!debug.contains("9999"));
        assert!(prompt.subtitle.contains("rp"));
    }
}
