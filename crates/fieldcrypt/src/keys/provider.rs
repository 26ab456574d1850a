//! [`KeyProvider`]: immutable store for the active key and retired generations.

use std::collections::BTreeMap;

use zeroize::Zeroize;

use crate::config::Config;
use crate::error::ConfigError;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Fixed-size key buffer holding exactly [`KEY_LEN`] bytes.
///
/// When this type is dropped, the memory is overwritten with zeroes to
/// minimise the window during which key material lives in RAM.
#[derive(Clone)]
pub struct KeyMaterial(Box<[u8; KEY_LEN]>);

impl KeyMaterial {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Box::new(bytes))
    }

    /// Parse hex-encoded key material.
    ///
    /// Exactly 64 hex characters are accepted. There is no passphrase
    /// derivation path: a value that is almost-but-not-quite a key must fail
    /// here rather than silently become a different key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BadKeyLength`] or [`ConfigError::BadKeyEncoding`].
    pub fn from_hex(s: &str) -> Result<Self, ConfigError> {
        let trimmed = s.trim();
        if trimmed.len() != 2 * KEY_LEN {
            return Err(ConfigError::BadKeyLength(trimmed.len()));
        }
        let mut bytes = hex::decode(trimmed).map_err(|_| ConfigError::BadKeyEncoding)?;
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(Self(buf))
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material — not even in debug builds.
        f.write_str("KeyMaterial([REDACTED])")
    }
}

/// Immutable store for the active key plus any retired generations.
///
/// Invariant: the active key is always the highest version present, so new
/// envelopes are never produced under a retired generation. Enforced at
/// construction; the provider cannot be mutated afterwards.
#[derive(Debug)]
pub struct KeyProvider {
    active: KeyMaterial,
    active_version: u32,
    retired: BTreeMap<u32, KeyMaterial>,
}

impl KeyProvider {
    /// Build a provider from the active key and zero or more retired
    /// generations.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroKeyVersion`],
    /// [`ConfigError::DuplicateKeyVersion`], or [`ConfigError::VersionOrder`]
    /// when the version set is inconsistent.
    pub fn new(
        active: KeyMaterial,
        active_version: u32,
        prior: Vec<(u32, KeyMaterial)>,
    ) -> Result<Self, ConfigError> {
        if active_version == 0 {
            return Err(ConfigError::ZeroKeyVersion);
        }
        let mut retired = BTreeMap::new();
        for (version, key) in prior {
            if version == 0 {
                return Err(ConfigError::ZeroKeyVersion);
            }
            if version >= active_version {
                return Err(ConfigError::VersionOrder {
                    prior: version,
                    active: active_version,
                });
            }
            if retired.insert(version, key).is_some() {
                return Err(ConfigError::DuplicateKeyVersion(version));
            }
        }
        Ok(Self {
            active,
            active_version,
            retired,
        })
    }

    /// Build a provider from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any key is malformed or the version set
    /// is inconsistent.
    pub fn from_config(cfg: &Config) -> Result<Self, ConfigError> {
        let active = KeyMaterial::from_hex(&cfg.field_encryption_key)?;
        let prior = parse_prior_keys(cfg.field_encryption_prior_keys.as_deref())?;
        Self::new(active, cfg.field_encryption_key_version, prior)
    }

    /// The key new encryptions must use, with its version.
    pub fn active(&self) -> (&KeyMaterial, u32) {
        (&self.active, self.active_version)
    }

    /// Look up a key by envelope version; `None` for versions this process
    /// does not hold.
    pub fn by_version(&self, version: u32) -> Option<&KeyMaterial> {
        if version == self.active_version {
            Some(&self.active)
        } else {
            self.retired.get(&version)
        }
    }

    /// All versions this provider can decrypt, in ascending order.
    pub fn known_versions(&self) -> impl Iterator<Item = u32> + '_ {
        self.retired
            .keys()
            .copied()
            .chain(std::iter::once(self.active_version))
    }
}

/// Parse the `FIELD_ENCRYPTION_PRIOR_KEYS` value: a comma-separated list of
/// `<version>=<hex>` entries.
fn parse_prior_keys(raw: Option<&str>) -> Result<Vec<(u32, KeyMaterial)>, ConfigError> {
    let mut out = Vec::new();
    let Some(raw) = raw else { return Ok(out) };
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (version, key_hex) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::BadPriorKeyEntry(entry.to_owned()))?;
        let version: u32 = version
            .trim()
            .parse()
            .map_err(|_| ConfigError::BadPriorKeyEntry(entry.to_owned()))?;
        out.push((version, KeyMaterial::from_hex(key_hex)?));
    }
    Ok(out)
}
