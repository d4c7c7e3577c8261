use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::passkey::ColdStartPolicy;
use crate::utils::crypto::generate_secret_key;
use crate::webauthn::authenticator_data::DEFAULT_AAGUID;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PasskeySettings {
    pub application: ApplicationSettings,
    pub store: StoreSettings,
    pub resolution: ResolutionSettings,
    pub verification: VerificationSettings,
    pub identity: IdentitySettings,
    pub authenticator: AuthenticatorSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Name shown on provider entries ("<name> - <rp name>")
    pub provider_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Encrypted store file; empty keeps credentials in memory only
    pub path: String,
    pub encryption_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionSettings {
    /// How long after an update an empty lookup is retried
    pub cold_start_window_secs: u64,
    pub cold_start_delay_ms: u64,
    pub cold_start_max_delay_ms: u64,
    pub cold_start_attempts: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VerificationSettings {
    /// Base64URL HMAC-SHA256(pin_salt, PIN)
    pub pin_digest: String,
    pub pin_salt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IdentitySettings {
    /// DER certificate used to derive the fallback origin
    pub signing_certificate_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticatorSettings {
    /// AAGUID in UUID text form
    pub aaguid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            provider_name: "Monica".to_string(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: "passkeys.store".to_string(),
            encryption_key: String::new(), // Will be generated if empty
        }
    }
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            cold_start_window_secs: 300,
            cold_start_delay_ms: 100,
            cold_start_max_delay_ms: 800,
            cold_start_attempts: 1,
        }
    }
}

impl Default for AuthenticatorSettings {
    fn default() -> Self {
        Self {
            aaguid: Uuid::from_bytes(DEFAULT_AAGUID).to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl PasskeySettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    /// - Logger initialization fails
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_env_file();

        // Load base settings from TOML or defaults
        let mut settings = Self::load_base_settings()?;

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut settings);

        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(settings.logging.level.as_str()),
        )
        .try_init()?;

        Ok(settings)
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `PASSKEY_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_toml_file(&default_config_path)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var("PASSKEY_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_toml_file(&secrets_path)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ PASSKEY_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let toml_content = fs::read_to_string(path)?;
        Ok(basic_toml::from_str(&toml_content)?)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_store_env_overrides(&mut settings.store);
        Self::apply_resolution_env_overrides(&mut settings.resolution);
        Self::apply_verification_env_overrides(&mut settings.verification);
        Self::apply_authenticator_env_overrides(&mut settings.authenticator);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
    }

    /// Apply environment overrides for store settings
    pub fn apply_store_env_overrides(store_settings: &mut StoreSettings) {
        if let Ok(path) = std::env::var("PASSKEY_STORE_PATH") {
            store_settings.path = path;
        }

        let env_key_set = std::env::var("PASSKEY_STORE_KEY").is_ok_and(|key| {
            if key.is_empty() {
                false
            } else {
                store_settings.encryption_key = key;
                true
            }
        });

        // A persistent store needs a stable key; generate one only as a last resort
        if !env_key_set && store_settings.encryption_key.is_empty() {
            store_settings.encryption_key = generate_secret_key();
            Self::warn_about_generated_key(&store_settings.encryption_key);
        }
    }

    fn warn_about_generated_key(key: &str) {
        eprintln!("⚠️  WARNING: Using auto-generated passkey store key");
        eprintln!("📝 Generated key: {key}");
        eprintln!("🔒 Set the PASSKEY_STORE_KEY environment variable");
        eprintln!("   or configure store.encryption_key in Settings.toml");
        eprintln!("💡 An existing store file cannot be opened with a different key");
    }

    /// Apply environment overrides for resolution settings
    pub fn apply_resolution_env_overrides(resolution_settings: &mut ResolutionSettings) {
        Self::apply_numeric_env_override(
            "COLD_START_WINDOW_SECS",
            &mut resolution_settings.cold_start_window_secs,
        );
        Self::apply_numeric_env_override(
            "COLD_START_DELAY_MS",
            &mut resolution_settings.cold_start_delay_ms,
        );
        Self::apply_numeric_env_override(
            "COLD_START_MAX_DELAY_MS",
            &mut resolution_settings.cold_start_max_delay_ms,
        );
        Self::apply_numeric_env_override(
            "COLD_START_ATTEMPTS",
            &mut resolution_settings.cold_start_attempts,
        );
    }

    /// Helper function to apply numeric environment variable overrides
    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = value;
            }
        }
    }

    fn apply_verification_env_overrides(verification_settings: &mut VerificationSettings) {
        if let Ok(digest) = std::env::var("PASSKEY_PIN_DIGEST") {
            verification_settings.pin_digest = digest;
        }
        if let Ok(salt) = std::env::var("PASSKEY_PIN_SALT") {
            verification_settings.pin_salt = salt;
        }
    }

    fn apply_authenticator_env_overrides(authenticator_settings: &mut AuthenticatorSettings) {
        if let Ok(aaguid) = std::env::var("PASSKEY_AAGUID") {
            authenticator_settings.aaguid = aaguid;
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Configured AAGUID, falling back to the built-in one if unparseable
    #[must_use]
    pub fn aaguid_bytes(&self) -> [u8; 16] {
        match Uuid::try_parse(self.authenticator.aaguid.trim()) {
            Ok(uuid) => *uuid.as_bytes(),
            Err(e) => {
                warn!("Invalid AAGUID {:?} ({e}), using default", self.authenticator.aaguid);
                DEFAULT_AAGUID
            }
        }
    }

    /// Cold-start retry policy
    #[must_use]
    pub fn cold_start_policy(&self) -> ColdStartPolicy {
        let resolution = &self.resolution;
        let initial_delay = Duration::from_millis(resolution.cold_start_delay_ms);
        ColdStartPolicy {
            window: Duration::from_secs(resolution.cold_start_window_secs),
            initial_delay,
            max_delay: Duration::from_millis(resolution.cold_start_max_delay_ms).max(initial_delay),
            max_attempts: u32::try_from(resolution.cold_start_attempts).unwrap_or(u32::MAX),
        }
    }

    /// Signing certificate path, if configured
    #[must_use]
    pub fn signing_certificate_path(&self) -> Option<PathBuf> {
        self.identity
            .signing_certificate_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // Helper function to clean all relevant environment variables for tests
    fn clean_env_vars() {
        for var in [
            "PASSKEY_STORE_PATH",
            "PASSKEY_STORE_KEY",
            "PASSKEY_PIN_DIGEST",
            "PASSKEY_PIN_SALT",
            "PASSKEY_AAGUID",
            "COLD_START_WINDOW_SECS",
            "COLD_START_DELAY_MS",
            "COLD_START_MAX_DELAY_MS",
            "COLD_START_ATTEMPTS",
            "PASSKEY_SECRETS_DIR",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = PasskeySettings::default();
        assert_eq!(settings.store.encryption_key, "");
        assert_eq!(settings.resolution.cold_start_window_secs, 300);
        assert_eq!(settings.authenticator.aaguid, "6d6f6e69-6361-7061-7373-6b6579617070");
        assert_eq!(settings.aaguid_bytes(), DEFAULT_AAGUID);
        assert_eq!(settings.cold_start_policy(), ColdStartPolicy::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: PasskeySettings = basic_toml::from_str(
            r#"
            [store]
            path = "/tmp/keys.store"

            [resolution]
            cold_start_attempts = 3
            "#,
        )
        .unwrap();

        assert_eq!(settings.store.path, "/tmp/keys.store");
        assert_eq!(settings.resolution.cold_start_attempts, 3);
        assert_eq!(settings.resolution.cold_start_delay_ms, 100);
        assert_eq!(settings.application.port, 8080);
    }

    #[test]
    #[serial]
    fn test_store_key_env_override() {
        clean_env_vars();

        let mut store_settings = StoreSettings {
            path: "a.store".to_string(),
            encryption_key: "configured".to_string(),
        };
        std::env::set_var("PASSKEY_STORE_KEY", "from-env");
        std::env::set_var("PASSKEY_STORE_PATH", "b.store");

        PasskeySettings::apply_store_env_overrides(&mut store_settings);

        assert_eq!(store_settings.encryption_key, "from-env");
        assert_eq!(store_settings.path, "b.store");

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_missing_store_key_is_generated() {
        clean_env_vars();

        let mut store_settings = StoreSettings::default();
        PasskeySettings::apply_store_env_overrides(&mut store_settings);

        assert_eq!(store_settings.encryption_key.len(), 43);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_resolution_env_overrides() {
        clean_env_vars();

        let mut resolution = ResolutionSettings::default();
        std::env::set_var("COLD_START_DELAY_MS", "250");
        std::env::set_var("COLD_START_ATTEMPTS", "not-a-number");

        PasskeySettings::apply_resolution_env_overrides(&mut resolution);

        assert_eq!(resolution.cold_start_delay_ms, 250);
        assert_eq!(resolution.cold_start_attempts, 1);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_full_env_overrides() {
        clean_env_vars();

        let mut settings = PasskeySettings::default();
        settings.store.encryption_key = "k".to_string();
        std::env::set_var("PASSKEY_PIN_DIGEST", "digest");
        std::env::set_var("PASSKEY_AAGUID", "00000000-0000-0000-0000-000000000001");

        PasskeySettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.verification.pin_digest, "digest");
        assert_eq!(settings.aaguid_bytes()[15], 1);

        clean_env_vars();
    }

    #[test]
    fn test_invalid_aaguid_falls_back() {
        let mut settings = PasskeySettings::default();
        settings.authenticator.aaguid = "nope".to_string();
        assert_eq!(settings.aaguid_bytes(), DEFAULT_AAGUID);
    }

    #[test]
    fn test_max_delay_never_below_initial() {
        let mut settings = PasskeySettings::default();
        settings.resolution.cold_start_delay_ms = 500;
        settings.resolution.cold_start_max_delay_ms = 100;
        let policy = settings.cold_start_policy();
        assert_eq!(policy.max_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_signing_certificate_path() {
        let mut settings = PasskeySettings::default();
        assert!(settings.signing_certificate_path().is_none());
        settings.identity.signing_certificate_path = Some(" /etc/app.der ".to_string());
        assert_eq!(settings.signing_certificate_path(), Some(PathBuf::from("/etc/app.der")));
    }
}
