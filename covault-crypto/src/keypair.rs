//! Per-user RSA keypair: generation, serialization, and at-rest protection.
//!
//! The keypair is used only for wrapping organization keys — never for bulk
//! data. The public key travels as base64 SPKI DER; the private key is
//! serialized to PKCS#8 DER and AEAD-encrypted under the symmetric key
//! before it is ever stored or transmitted.

use crate::cipher;
use crate::error::{CryptoError, CryptoResult};
use crate::keys::SymmetricKey;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroize;

/// RSA modulus size in bits.
pub const RSA_BITS: usize = 2048;

/// A user's asymmetric keypair.
///
/// The private key zeroizes its internals on drop (from the rsa crate).
#[derive(Clone)]
pub struct UserKeyPair {
    pub private: RsaPrivateKey,
    pub public: RsaPublicKey,
}

/// Generates a fresh RSA-2048 keypair.
pub fn generate_keypair() -> CryptoResult<UserKeyPair> {
    let private = RsaPrivateKey::new(&mut rand::rngs::OsRng, RSA_BITS)
        .map_err(|e| CryptoError::KeyDerivation(format!("RSA key generation failed: {e}")))?;
    let public = RsaPublicKey::from(&private);
    Ok(UserKeyPair { private, public })
}

/// Serializes a public key to base64 SPKI DER for server-side storage.
pub fn export_public_key(public: &RsaPublicKey) -> CryptoResult<String> {
    let der = public
        .to_public_key_der()
        .map_err(|e| CryptoError::InvalidKey(format!("public key encoding failed: {e}")))?;
    Ok(STANDARD.encode(der.as_bytes()))
}

/// Parses a base64 SPKI DER public key.
pub fn import_public_key(encoded: &str) -> CryptoResult<RsaPublicKey> {
    let der = STANDARD.decode(encoded.trim())?;
    RsaPublicKey::from_public_key_der(&der)
        .map_err(|e| CryptoError::InvalidKey(format!("not a valid SPKI public key: {e}")))
}

/// Encrypts the private key under the symmetric key.
///
/// PKCS#8 DER, then AES-256-GCM, then base64 for transport.
pub fn encrypt_private_key(
    private: &RsaPrivateKey,
    symmetric_key: &SymmetricKey,
) -> CryptoResult<String> {
    let der = private
        .to_pkcs8_der()
        .map_err(|e| CryptoError::InvalidKey(format!("private key encoding failed: {e}")))?;
    let blob = cipher::encrypt(symmetric_key.as_bytes(), der.as_bytes())?;
    Ok(STANDARD.encode(blob))
}

/// Decrypts an encrypted private key blob.
///
/// A wrong symmetric key (i.e. a wrong password upstream) surfaces as
/// [`CryptoError::Authentication`]; callers map that to a user-facing
/// "incorrect password" error.
pub fn decrypt_private_key(
    encoded: &str,
    symmetric_key: &SymmetricKey,
) -> CryptoResult<RsaPrivateKey> {
    let blob = STANDARD.decode(encoded.trim())?;
    let mut der = cipher::decrypt(symmetric_key.as_bytes(), &blob)?;
    let result = RsaPrivateKey::from_pkcs8_der(&der)
        .map_err(|e| CryptoError::InvalidKey(format!("not a valid PKCS#8 private key: {e}")));
    der.zeroize();
    result
}
