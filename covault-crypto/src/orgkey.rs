//! Organization key generation and member-to-member wrapping.
//!
//! The organization key is 32 random bytes generated exactly once per
//! organization. Sharing it with a member means RSA-OAEP-encrypting the raw
//! bytes under that member's public key — no AEAD framing, since the payload
//! is fixed-size and small.

use crate::error::{CryptoError, CryptoResult};
use crate::keys::OrgKey;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroize;

/// Generates a fresh organization key from the OS CSPRNG.
pub fn generate_org_key() -> OrgKey {
    let mut bytes = [0u8; crate::keys::KEY_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let key = OrgKey::from_bytes(bytes);
    bytes.zeroize();
    key
}

/// Wraps the organization key under a member's public key (base64 output).
pub fn wrap_org_key(org_key: &OrgKey, recipient: &RsaPublicKey) -> CryptoResult<String> {
    let wrapped = recipient
        .encrypt(
            &mut rand::rngs::OsRng,
            Oaep::new::<Sha256>(),
            org_key.as_bytes(),
        )
        .map_err(|e| CryptoError::Encryption(format!("org key wrap failed: {e}")))?;
    Ok(STANDARD.encode(wrapped))
}

/// Unwraps an organization key with the recipient's private key.
///
/// Fails with [`CryptoError::Authentication`] if the private key does not
/// match the wrapping public key.
pub fn unwrap_org_key(encoded: &str, private: &RsaPrivateKey) -> CryptoResult<OrgKey> {
    let wrapped = STANDARD.decode(encoded.trim())?;
    let mut raw = private
        .decrypt(Oaep::new::<Sha256>(), &wrapped)
        .map_err(|_| CryptoError::Authentication)?;
    let result = OrgKey::from_slice(&raw);
    raw.zeroize();
    result
}
