//! AES-256-GCM-SIV encryption and decryption of individual string fields.
//!
//! **Algorithm choice:** AES-256-GCM-SIV (RFC 8452) is nonce-misuse-resistant:
//! even an accidental nonce repeat degrades to revealing plaintext equality,
//! not key recovery. A fresh random nonce is still generated per call.
//!
//! **Do NOT substitute plain AES-256-GCM with a fixed nonce.** GCM nonce reuse
//! is catastrophic — it breaks both confidentiality and authentication.
//!
//! The algorithm tag and key version are bound as associated data, so a
//! ciphertext cannot be replayed as if it were produced under a different
//! algorithm or key generation.

use aes_gcm_siv::{
    aead::{Aead, KeyInit, OsRng, Payload},
    Aes256GcmSiv, Nonce,
};

use crate::envelope::{Envelope, ALG_V1, MAGIC, NONCE_LEN};
use crate::error::{DecryptError, EncryptError};
use crate::keys::KeyMaterial;

/// Associated data binding a ciphertext to its algorithm and key generation.
fn associated_data(key_version: u32) -> String {
    format!("{MAGIC}:{ALG_V1}:{key_version}")
}

/// Encrypt a plaintext string field under `key`, tagged as `key_version`.
///
/// A random 96-bit nonce is generated per call via the OS CSPRNG, so
/// encrypting the same plaintext twice yields two different envelopes.
/// Plaintext may be any UTF-8 string including the empty string; the
/// round-trip through [`open_field`] is byte-exact with no length limit.
///
/// # Errors
///
/// Returns [`EncryptError::Aead`] on an internal AEAD error (unreachable
/// with a well-formed key).
pub fn seal_field(
    plaintext: &str,
    key: &KeyMaterial,
    key_version: u32,
) -> Result<Envelope, EncryptError> {
    let cipher = Aes256GcmSiv::new_from_slice(key.as_bytes()).map_err(|_| EncryptError::Aead)?;

    // Use OsRng for a cryptographically secure random nonce.
    use aes_gcm_siv::aead::rand_core::RngCore;
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let aad = associated_data(key_version);
    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext.as_bytes(),
                aad: aad.as_bytes(),
            },
        )
        .map_err(|_| EncryptError::Aead)?;

    Ok(Envelope::V1 {
        key_version,
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Decrypt an [`Envelope`] back to its plaintext string.
///
/// The caller resolves `key` from the envelope's key version; the associated
/// data check then guarantees the envelope really was sealed under that
/// version.
///
/// # Errors
///
/// Returns [`DecryptError::Authentication`] if authentication fails (wrong
/// key, tampered or corrupt data, or a forged version tag), and
/// [`DecryptError::InvalidPlaintext`] if the decrypted bytes are not UTF-8.
pub fn open_field(envelope: &Envelope, key: &KeyMaterial) -> Result<String, DecryptError> {
    let Envelope::V1 {
        key_version,
        nonce,
        ciphertext,
    } = envelope;

    let cipher =
        Aes256GcmSiv::new_from_slice(key.as_bytes()).map_err(|_| DecryptError::Authentication)?;

    let aad = associated_data(*key_version);
    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext.as_ref(),
                aad: aad.as_bytes(),
            },
        )
        .map_err(|_| DecryptError::Authentication)?;

    String::from_utf8(plaintext).map_err(|_| DecryptError::InvalidPlaintext)
}
