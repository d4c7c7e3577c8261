//! Provider availability announcement
//!
//! After an install or update the platform may not list the provider until it
//! is announced again. Only the binary calls this; the flows never do.

use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};

/// Announces that the provider is available
pub trait ProviderAnnouncer: Send + Sync {
    /// Announce availability
    ///
    /// # Errors
    /// Returns an error if the platform rejected the announcement
    fn announce(&self, provider_name: &str) -> anyhow::Result<()>;
}

/// Announcer that logs the availability line
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAnnouncer;

impl ProviderAnnouncer for LogAnnouncer {
    fn announce(&self, provider_name: &str) -> anyhow::Result<()> {
        info!("📣 Passkey provider {provider_name} is available");
        Ok(())
    }
}

/// Wraps an announcer so only the first successful announcement goes through
pub struct OnceAnnouncer<A> {
    inner: A,
    announced: AtomicBool,
}

impl<A: ProviderAnnouncer> OnceAnnouncer<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            announced: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn has_announced(&self) -> bool {
        self.announced.load(Ordering::Acquire)
    }
}

impl<A: ProviderAnnouncer> ProviderAnnouncer for OnceAnnouncer<A> {
    fn announce(&self, provider_name: &str) -> anyhow::Result<()> {
        if self
            .announced
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        if let Err(e) = self.inner.announce(provider_name) {
            warn!("Provider announcement failed: {e}");
            self.announced.store(false, Ordering::Release);
            return Err(e);
        }
        Ok(())
    }
}
