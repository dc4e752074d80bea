//! AES-256-GCM authenticated encryption with the nonce-prefix wire format.
//!
//! Every ciphertext is `nonce(12) || ciphertext-with-tag`. The nonce is drawn
//! fresh from the OS CSPRNG on every call — nonce reuse under the same key is
//! a correctness violation, so there is no API for supplying one.

use crate::error::{CryptoError, CryptoResult};
use crate::keys::KEY_SIZE;
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;

/// AES-GCM nonce length in bytes (96 bits per NIST recommendation).
pub const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag length in bytes (128 bits).
pub const TAG_SIZE: usize = 16;

/// Encrypts plaintext under a 256-bit key.
///
/// Output is `nonce || ciphertext-with-tag`.
pub fn encrypt(key: &[u8; KEY_SIZE], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CryptoError::InvalidKey(format!("AES key rejected: {e}")))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| CryptoError::Encryption("AEAD seal failed".to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypts a `nonce || ciphertext-with-tag` blob.
///
/// Fails with [`CryptoError::Authentication`] if the tag does not verify —
/// wrong key, corrupted data, or tampering. Never returns partial plaintext.
pub fn decrypt(key: &[u8; KEY_SIZE], blob: &[u8]) -> CryptoResult<Vec<u8>> {
    if blob.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::InvalidInput(format!(
            "ciphertext too short: {} bytes",
            blob.len()
        )));
    }

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CryptoError::InvalidKey(format!("AES key rejected: {e}")))?;

    let (nonce, ciphertext) = blob.split_at(NONCE_SIZE);
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Authentication)
}
