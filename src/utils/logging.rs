// Centralized logging utilities to reduce verbose logging patterns
use log::{debug, info};
use std::time::Duration;

use crate::settings::PasskeySettings;

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log the startup configuration summary
    pub fn log_startup(settings: &PasskeySettings) {
        info!("🚀 Starting passkey provider v{}", crate::VERSION);
        info!("🏷️  Provider name: {}", settings.application.provider_name);
        if settings.store.path.trim().is_empty() {
            info!("💾 Credential store: in memory");
        } else {
            info!("💾 Credential store: {}", settings.store.path);
        }
        info!("🆔 AAGUID: {}", settings.authenticator.aaguid);
        info!(
            "⏱️  Cold-start retry: window={}s delay={}ms max_delay={}ms attempts={}",
            settings.resolution.cold_start_window_secs,
            settings.resolution.cold_start_delay_ms,
            settings.resolution.cold_start_max_delay_ms,
            settings.resolution.cold_start_attempts
        );
        if settings.verification.pin_digest.is_empty() {
            info!("❌ Verification PIN not configured - every ceremony will be refused");
        } else {
            info!("✅ Verification PIN configured");
        }
    }

    /// Log the outcome of one resolution pass
    pub fn log_resolution_pass(pass: &str, rp_id: &str, allowed: usize, found: usize) {
        debug!("🔍 {pass} pass for rp_id={rp_id:?} (allow-list: {allowed}): {found} passkey(s)");
    }

    /// Log a cold-start retry
    pub fn log_cold_start_retry(attempt: u32, delay: Duration) {
        info!(
            "🔄 No passkeys right after app update, retry {attempt} in {}ms",
            delay.as_millis()
        );
    }
}
