//! Credential resolution
//!
//! Selects the stored passkeys that may answer an assertion request. A strict
//! pass honours the caller's allow-list; the relaxed pass ignores it and falls
//! back to every record for the RP (or every discoverable record when no RP is
//! given). Records that cannot sign are never returned.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::debug;
use std::collections::HashSet;
use std::time::Duration;

use super::record::CredentialRecord;
use super::store::{CredentialStore, StoreError};
use crate::webauthn::credential_id::normalize;

/// Stateless candidate selection over a credential store
pub struct CredentialResolutionEngine<'a> {
    store: &'a dyn CredentialStore,
}

impl<'a> CredentialResolutionEngine<'a> {
    #[must_use]
    pub fn new(store: &'a dyn CredentialStore) -> Self {
        Self { store }
    }

    /// Run one resolution pass
    ///
    /// # Arguments
    /// * `rp_id` - Relying party ID; blank means "any RP"
    /// * `allowed_ids` - Normalized credential IDs from the allow-list
    /// * `strict` - Whether to filter by `allowed_ids` (ignored when it is empty)
    ///
    /// # Errors
    /// Propagates store failures
    pub async fn resolve(
        &self,
        rp_id: &str,
        allowed_ids: &HashSet<String>,
        strict: bool,
    ) -> Result<Vec<CredentialRecord>, StoreError> {
        let rp_id = rp_id.trim();
        let candidates = if strict && !allowed_ids.is_empty() {
            let scoped = if rp_id.is_empty() {
                self.store.get_all().await?
            } else {
                self.store.get_all_by_rp_id(rp_id).await?
            };
            scoped
                .into_iter()
                .filter(|record| {
                    normalize(&record.credential_id).is_some_and(|id| allowed_ids.contains(&id))
                })
                .collect()
        } else if rp_id.is_empty() {
            self.store.get_all_discoverable().await?
        } else {
            self.store.get_all_by_rp_id(rp_id).await?
        };

        let total = candidates.len();
        let usable: Vec<CredentialRecord> =
            candidates.into_iter().filter(CredentialRecord::is_usable).collect();
        debug!(
            "Resolution pass (strict={strict}, rp_id={rp_id:?}): {} usable of {total}",
            usable.len()
        );
        Ok(usable)
    }
}

/// When and how to retry an empty resolution right after an app update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColdStartPolicy {
    /// How long after an install/update the retry is armed
    pub window: Duration,
    pub initial_delay: Duration,
    /// Upper bound for the doubled delay
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ColdStartPolicy {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(5 * 60),
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(800),
            max_attempts: 1,
        }
    }
}

impl ColdStartPolicy {
    /// Whether `last_update` falls inside the window ending at `now`
    #[must_use]
    pub fn is_recent(&self, last_update: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let Some(last_update) = last_update else {
            return false;
        };
        let Ok(window) = ChronoDuration::from_std(self.window) else {
            return false;
        };
        let elapsed = now.signed_duration_since(last_update);
        elapsed >= ChronoDuration::zero() && elapsed <= window
    }

    /// Delay before the zero-based `attempt`
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}
