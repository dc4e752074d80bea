//! Item and file payload encryption under an organization key.
//!
//! Thin wrappers over the AES-GCM primitive. Callers must already hold the
//! plaintext organization key — there is deliberately no key-lookup fallback
//! here.

use crate::cipher;
use crate::error::{CryptoError, CryptoResult};
use crate::keys::OrgKey;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encrypts a text value (item field, notes). Returns base64 for storage.
pub fn encrypt_string(plaintext: &str, org_key: &OrgKey) -> CryptoResult<String> {
    let blob = cipher::encrypt(org_key.as_bytes(), plaintext.as_bytes())?;
    Ok(STANDARD.encode(blob))
}

/// Decrypts a base64 text value produced by [`encrypt_string`].
pub fn decrypt_string(encoded: &str, org_key: &OrgKey) -> CryptoResult<String> {
    let blob = STANDARD.decode(encoded.trim())?;
    let plaintext = cipher::decrypt(org_key.as_bytes(), &blob)?;
    String::from_utf8(plaintext)
        .map_err(|_| CryptoError::InvalidInput("decrypted payload is not valid UTF-8".to_string()))
}

/// Encrypts a binary payload (file contents).
pub fn encrypt_bytes(plaintext: &[u8], org_key: &OrgKey) -> CryptoResult<Vec<u8>> {
    cipher::encrypt(org_key.as_bytes(), plaintext)
}

/// Decrypts a binary payload.
pub fn decrypt_bytes(blob: &[u8], org_key: &OrgKey) -> CryptoResult<Vec<u8>> {
    cipher::decrypt(org_key.as_bytes(), blob)
}
