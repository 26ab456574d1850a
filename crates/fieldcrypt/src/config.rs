//! Configuration loading and validation.
//!
//! All values are read from environment variables at startup. Construction
//! fails with a [`ConfigError`] if any required variable is missing or
//! invalid — the engine never falls back to a default key or to plaintext.

use serde::Deserialize;

use crate::error::ConfigError;

/// How [`decrypt`](crate::FieldCrypt::decrypt) treats a value that is not an
/// envelope. Fixed at deployment; never mixed within one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecryptMode {
    /// Pass unencrypted values through unchanged. Used while legacy plaintext
    /// rows still exist, i.e. until a migration has completed.
    #[default]
    Tolerant,
    /// Reject unencrypted values. The intended setting once every collection
    /// audits clean.
    Strict,
}

/// Validated engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Hex-encoded 32-byte active encryption key. **Required.**
    pub field_encryption_key: String,

    /// Version tag of the active key. Must be the highest version in use.
    #[serde(default = "default_key_version")]
    pub field_encryption_key_version: u32,

    /// Retired key generations kept for decryption during rotation windows,
    /// as a comma-separated `<version>=<hex>` list.
    #[serde(default)]
    pub field_encryption_prior_keys: Option<String>,

    /// Behaviour of `decrypt` on unencrypted input.
    #[serde(default)]
    pub decrypt_mode: DecryptMode,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_key_version() -> u32 {
    1
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be
    /// parsed. Key *content* (hex format, length) is validated by
    /// [`KeyProvider::from_config`](crate::keys::KeyProvider::from_config).
    pub fn from_env() -> Result<Self, ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;

        let c: Config = cfg.try_deserialize()?;
        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.field_encryption_key.trim().is_empty() {
            return Err(ConfigError::MissingKey);
        }
        if self.field_encryption_key_version == 0 {
            return Err(ConfigError::ZeroKeyVersion);
        }
        Ok(())
    }
}
