//! Password recovery via the exported master key.
//!
//! The recovery secret is the raw master key, base64-encoded, shown to the
//! user exactly once. It doubles as an AES key (no intermediate KDF) for an
//! alternate ciphertext of the private key, stored server-side next to the
//! normal symmetric-key-encrypted copy. During password reset the client
//! decrypts the private key with the secret instead of the password.
//!
//! Every password change derives a new master key, so it must also mint a
//! new recovery secret; the old one stops matching the new artifacts.

use crate::cipher;
use crate::error::{CryptoError, CryptoResult};
use crate::keys::{MasterKey, KEY_SIZE};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rsa::RsaPrivateKey;
use zeroize::Zeroize;

/// Exports the master key as a one-time-display recovery secret.
pub fn export_recovery_secret(master_key: &MasterKey) -> String {
    STANDARD.encode(master_key.as_bytes())
}

/// Decodes a recovery secret back into a 256-bit AEAD key.
fn recovery_key(secret: &str) -> CryptoResult<[u8; KEY_SIZE]> {
    let decoded = STANDARD.decode(secret.trim())?;
    if decoded.len() != KEY_SIZE {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: decoded.len(),
        });
    }
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&decoded);
    Ok(key)
}

/// Encrypts the private key under a recovery secret.
pub fn encrypt_private_key_for_recovery(
    private: &RsaPrivateKey,
    recovery_secret: &str,
) -> CryptoResult<String> {
    let mut key = recovery_key(recovery_secret)?;
    let der = private
        .to_pkcs8_der()
        .map_err(|e| CryptoError::InvalidKey(format!("private key encoding failed: {e}")))?;
    let result = cipher::encrypt(&key, der.as_bytes());
    key.zeroize();
    Ok(STANDARD.encode(result?))
}

/// Decrypts a recovery-encrypted private key. Used only during password
/// reset; a wrong secret fails with [`CryptoError::Authentication`].
pub fn decrypt_private_key_with_recovery(
    encoded: &str,
    recovery_secret: &str,
) -> CryptoResult<RsaPrivateKey> {
    let mut key = recovery_key(recovery_secret)?;
    let blob = STANDARD.decode(encoded.trim())?;
    let plaintext = cipher::decrypt(&key, &blob);
    key.zeroize();

    let mut der = plaintext?;
    let result = RsaPrivateKey::from_pkcs8_der(&der)
        .map_err(|e| CryptoError::InvalidKey(format!("not a valid PKCS#8 private key: {e}")));
    der.zeroize();
    result
}
