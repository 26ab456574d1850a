//! The public encryption façade: what the application layer calls.
//!
//! [`FieldCrypt`] composes the envelope codec, cipher engine, and key
//! provider behind four operations — `encrypt`, `decrypt`, `is_encrypted`,
//! `validate_encryption_setup` — plus document-level helpers that apply a
//! declared path list to a JSON value in place.
//!
//! The façade holds no mutable state: the key provider is immutable after
//! construction and shared by `Arc`, so a single instance is safe to clone
//! into any number of concurrent request handlers.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::config::{Config, DecryptMode};
use crate::crypto;
use crate::envelope::{self, Envelope};
use crate::error::{ConfigError, DecryptError, EncodingError, EncryptError};
use crate::fields::{walk, FieldPath};
use crate::keys::KeyProvider;

/// Field-level encryption façade.
#[derive(Clone)]
pub struct FieldCrypt {
    keys: Arc<KeyProvider>,
    mode: DecryptMode,
}

impl FieldCrypt {
    /// Build a façade over an already-constructed key provider.
    pub fn new(keys: Arc<KeyProvider>, mode: DecryptMode) -> Self {
        Self { keys, mode }
    }

    /// Build a façade from environment configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the key material is missing or malformed.
    /// This is fatal by design: the engine never silently degrades to
    /// storing plaintext.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cfg = Config::from_env()?;
        let keys = KeyProvider::from_config(&cfg)?;
        Ok(Self::new(Arc::new(keys), cfg.decrypt_mode))
    }

    /// The decrypt mode this façade was fixed to at construction.
    pub fn mode(&self) -> DecryptMode {
        self.mode
    }

    /// Encrypt a plaintext string field, producing an envelope string.
    ///
    /// Idempotent: a value that already parses as an envelope is returned
    /// unchanged, so bulk callers may invoke `encrypt` unconditionally.
    /// The empty string encrypts like any other value.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptError::Aead`] on an internal cipher failure.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, EncryptError> {
        if envelope::is_encrypted(plaintext) {
            return Ok(plaintext.to_owned());
        }
        let (key, version) = self.keys.active();
        let sealed = crypto::seal_field(plaintext, key, version)?;
        Ok(sealed.encode())
    }

    /// Decrypt an envelope string back to plaintext.
    ///
    /// Behaviour on a value that is not an envelope depends on the mode
    /// fixed at construction: tolerant mode passes it through unchanged
    /// (legacy unencrypted rows mid-migration), strict mode rejects it.
    /// Cryptographic failures — tampering, corruption, an unknown key
    /// version — are surfaced in both modes, never swallowed.
    ///
    /// # Errors
    ///
    /// See [`DecryptError`]. In tolerant mode only the cryptographic
    /// variants occur.
    pub fn decrypt(&self, value: &str) -> Result<String, DecryptError> {
        let parsed = match Envelope::parse(value) {
            Ok(env) => env,
            Err(EncodingError::MissingMagic) => {
                return match self.mode {
                    DecryptMode::Tolerant => Ok(value.to_owned()),
                    DecryptMode::Strict => Err(DecryptError::NotEncrypted),
                }
            }
            Err(e) => {
                // Magic prefix but unparseable body: plaintext that happens
                // to look similar. Tolerant mode treats it as such; strict
                // mode reports the encoding failure distinctly from an
                // authentication failure.
                return match self.mode {
                    DecryptMode::Tolerant => Ok(value.to_owned()),
                    DecryptMode::Strict => Err(DecryptError::Encoding(e)),
                };
            }
        };

        let version = parsed.key_version();
        let key = self
            .keys
            .by_version(version)
            .ok_or(DecryptError::UnknownKeyVersion(version))?;
        crypto::open_field(&parsed, key)
    }

    /// Whether `value` is an envelope this engine recognises. Total; never
    /// panics on arbitrary input.
    pub fn is_encrypted(&self, value: &str) -> bool {
        envelope::is_encrypted(value)
    }

    /// Startup health check: the active key is present, well-formed, and a
    /// round-trip of a probe string succeeds. A `false` result must prevent
    /// the caller from serving requests that touch encrypted fields.
    ///
    /// Logs the failure reason, never the key itself.
    pub fn validate_encryption_setup(&self) -> bool {
        const PROBE: &str = "fieldcrypt startup probe";
        let (key, version) = self.keys.active();
        let sealed = match crypto::seal_field(PROBE, key, version) {
            Ok(sealed) => sealed,
            Err(e) => {
                warn!(error = %e, "encryption setup probe failed to seal");
                return false;
            }
        };
        match crypto::open_field(&sealed, key) {
            Ok(plaintext) if plaintext == PROBE => true,
            Ok(_) => {
                warn!("encryption setup probe round-trip mismatch");
                false
            }
            Err(e) => {
                warn!(error = %e, "encryption setup probe failed to open");
                false
            }
        }
    }

    /// Encrypt every declared string field of `doc` in place.
    ///
    /// Absent paths, non-string values, empty strings, and already-encrypted
    /// values are skipped. Returns the number of fields newly encrypted.
    ///
    /// # Errors
    ///
    /// Fails fast on the first cipher error, leaving earlier fields
    /// encrypted.
    pub fn encrypt_document(
        &self,
        doc: &mut Value,
        paths: &[FieldPath],
    ) -> Result<usize, EncryptError> {
        let mut changed = 0;
        for path in paths {
            for leaf in walk::collect_mut(doc, path) {
                if let Value::String(s) = leaf {
                    if s.is_empty() || envelope::is_encrypted(s) {
                        continue;
                    }
                    *s = self.encrypt(s)?;
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    /// Decrypt every declared string field of `doc` in place.
    ///
    /// Each non-empty string leaf goes through [`decrypt`](Self::decrypt),
    /// so in strict mode a declared field still holding plaintext fails the
    /// whole call. Returns the number of fields that changed.
    ///
    /// # Errors
    ///
    /// Fails fast on the first decryption error.
    pub fn decrypt_document(
        &self,
        doc: &mut Value,
        paths: &[FieldPath],
    ) -> Result<usize, DecryptError> {
        let mut changed = 0;
        for path in paths {
            for leaf in walk::collect_mut(doc, path) {
                if let Value::String(s) = leaf {
                    if s.is_empty() {
                        continue;
                    }
                    let plaintext = self.decrypt(s)?;
                    if plaintext != *s {
                        *s = plaintext;
                        changed += 1;
                    }
                }
            }
        }
        Ok(changed)
    }
}

impl std::fmt::Debug for FieldCrypt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The provider already redacts key bytes; keep the façade terse.
        f.debug_struct("FieldCrypt")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeyMaterial, KEY_LEN};
    use serde_json::json;

    fn crypt_with(mode: DecryptMode) -> FieldCrypt {
        let provider =
            KeyProvider::new(KeyMaterial::from_bytes([0x42; KEY_LEN]), 1, Vec::new()).unwrap();
        FieldCrypt::new(Arc::new(provider), mode)
    }

    #[test]
    fn jane_doe_scenario() {
        let crypt = crypt_with(DecryptMode::Strict);
        let sealed = crypt.encrypt("Jane Doe").unwrap();
        assert!(sealed.starts_with("ENC:v1:"), "got: {sealed}");
        assert!(sealed.len() > "Jane Doe".len());
        assert_ne!(sealed, "Jane Doe");
        assert!(!sealed.contains("Jane Doe"));
        assert!(crypt.is_encrypted(&sealed));
        assert_eq!(crypt.decrypt(&sealed).unwrap(), "Jane Doe");
    }

    #[test]
    fn is_encrypted_is_false_for_plain_inputs() {
        let crypt = crypt_with(DecryptMode::Tolerant);
        assert!(!crypt.is_encrypted(""));
        assert!(!crypt.is_encrypted("plain text"));
        assert!(!crypt.is_encrypted("not:an:envelope"));
    }

    #[test]
    fn encrypt_is_idempotent() {
        let crypt = crypt_with(DecryptMode::Tolerant);
        let once = crypt.encrypt("value").unwrap();
        let twice = crypt.encrypt(&once).unwrap();
        assert_eq!(once, twice);
        assert_eq!(crypt.decrypt(&twice).unwrap(), "value");
    }

    #[test]
    fn empty_string_round_trips() {
        let crypt = crypt_with(DecryptMode::Strict);
        let sealed = crypt.encrypt("").unwrap();
        assert!(crypt.is_encrypted(&sealed));
        assert_eq!(crypt.decrypt(&sealed).unwrap(), "");
    }

    #[test]
    fn tolerant_mode_passes_legacy_plaintext_through() {
        let crypt = crypt_with(DecryptMode::Tolerant);
        assert_eq!(crypt.decrypt("legacy value").unwrap(), "legacy value");
    }

    #[test]
    fn strict_mode_rejects_plaintext() {
        let crypt = crypt_with(DecryptMode::Strict);
        assert!(matches!(
            crypt.decrypt("legacy value"),
            Err(DecryptError::NotEncrypted)
        ));
    }

    #[test]
    fn strict_mode_distinguishes_malformed_envelopes_from_plaintext() {
        let crypt = crypt_with(DecryptMode::Strict);
        assert!(matches!(
            crypt.decrypt("ENC:v1:1:short"),
            Err(DecryptError::Encoding(_))
        ));
    }

    #[test]
    fn tolerant_mode_still_surfaces_tampering() {
        let crypt = crypt_with(DecryptMode::Tolerant);
        let sealed = crypt.encrypt("target").unwrap();
        let mut env = Envelope::parse(&sealed).unwrap();
        let Envelope::V1 { ciphertext, .. } = &mut env;
        ciphertext[0] ^= 0xFF;
        assert!(matches!(
            crypt.decrypt(&env.encode()),
            Err(DecryptError::Authentication)
        ));
    }

    #[test]
    fn unknown_key_version_is_surfaced_in_both_modes() {
        let old = crypt_with(DecryptMode::Tolerant);
        let sealed = old.encrypt("rotated away").unwrap();

        let newer_only = {
            let provider =
                KeyProvider::new(KeyMaterial::from_bytes([0x43; KEY_LEN]), 2, Vec::new()).unwrap();
            FieldCrypt::new(Arc::new(provider), DecryptMode::Tolerant)
        };
        // The provider knows version 2 but this envelope names version 1.
        assert!(matches!(
            newer_only.decrypt(&sealed),
            Err(DecryptError::UnknownKeyVersion(1))
        ));
    }

    #[test]
    fn envelope_from_old_generation_decrypts_after_rotation() {
        let v1_key = KeyMaterial::from_bytes([0x42; KEY_LEN]);
        let old = crypt_with(DecryptMode::Strict);
        let sealed = old.encrypt("survives rotation").unwrap();

        let rotated = {
            let provider = KeyProvider::new(
                KeyMaterial::from_bytes([0x43; KEY_LEN]),
                2,
                vec![(1, v1_key)],
            )
            .unwrap();
            FieldCrypt::new(Arc::new(provider), DecryptMode::Strict)
        };
        assert_eq!(rotated.decrypt(&sealed).unwrap(), "survives rotation");

        // New encryptions use the highest generation.
        let fresh = rotated.encrypt("new data").unwrap();
        assert!(fresh.starts_with("ENC:v1:2:"), "got: {fresh}");
    }

    #[test]
    fn validate_encryption_setup_succeeds_with_a_good_key() {
        assert!(crypt_with(DecryptMode::Tolerant).validate_encryption_setup());
    }

    #[test]
    fn encrypt_document_touches_only_declared_string_fields() {
        let crypt = crypt_with(DecryptMode::Tolerant);
        let paths = vec![
            FieldPath::parse("kycData.fullName"),
            FieldPath::parse("kycData.idNumber"),
            FieldPath::parse("missing.field"),
        ];
        let mut doc = json!({
            "email": "a@example.com",
            "kycData": {
                "fullName": "Jane Doe",
                "idNumber": "",
                "nationality": "GB"
            }
        });
        let changed = crypt.encrypt_document(&mut doc, &paths).unwrap();
        assert_eq!(changed, 1);
        assert!(crypt.is_encrypted(doc["kycData"]["fullName"].as_str().unwrap()));
        assert_eq!(doc["kycData"]["idNumber"], "");
        assert_eq!(doc["kycData"]["nationality"], "GB");
        assert_eq!(doc["email"], "a@example.com");
    }

    #[test]
    fn encrypt_document_is_idempotent() {
        let crypt = crypt_with(DecryptMode::Tolerant);
        let paths = vec![FieldPath::parse("toAddress")];
        let mut doc = json!({"toAddress": "0x1eb17e4367f8d6aaf8c3cec631f8e011"});
        assert_eq!(crypt.encrypt_document(&mut doc, &paths).unwrap(), 1);
        let after_first = doc.clone();
        assert_eq!(crypt.encrypt_document(&mut doc, &paths).unwrap(), 0);
        assert_eq!(doc, after_first);
    }

    #[test]
    fn decrypt_document_round_trips() {
        let crypt = crypt_with(DecryptMode::Tolerant);
        let paths = vec![FieldPath::parse("fields.address")];
        let mut doc = json!({"fields": {"address": "1 Main St"}});
        crypt.encrypt_document(&mut doc, &paths).unwrap();
        assert_eq!(crypt.decrypt_document(&mut doc, &paths).unwrap(), 1);
        assert_eq!(doc["fields"]["address"], "1 Main St");
    }

    #[test]
    fn decrypt_document_in_strict_mode_fails_on_plaintext_leaf() {
        let crypt = crypt_with(DecryptMode::Strict);
        let paths = vec![FieldPath::parse("toAddress")];
        let mut doc = json!({"toAddress": "still plaintext"});
        assert!(matches!(
            crypt.decrypt_document(&mut doc, &paths),
            Err(DecryptError::NotEncrypted)
        ));
    }

    #[test]
    fn debug_output_never_contains_key_material() {
        let crypt = crypt_with(DecryptMode::Tolerant);
        let rendered = format!("{crypt:?}");
        assert!(!rendered.contains("42"));
        assert!(rendered.contains("FieldCrypt"));
    }
}
