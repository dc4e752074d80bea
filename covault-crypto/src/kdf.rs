//! Password key derivation.
//!
//! Master key: PBKDF2-HMAC-SHA256 over the password, salted with the
//! normalized email, at a server-negotiated iteration count. Symmetric key:
//! HKDF-SHA256 over the master key with fixed domain-separation labels.
//!
//! The master password hash — the only password-derived value that ever
//! crosses the network — is a single PBKDF2 iteration keyed the other way
//! around (master key as input, password as salt), so the server can verify
//! logins without learning anything it could reverse into the master key.

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{MasterKey, SymmetricKey, KEY_SIZE};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroize;

/// Default PBKDF2 iteration count for new accounts. Existing accounts use
/// whatever count the prelogin endpoint reports, which allows server-driven
/// iteration migration without breaking old ciphertexts.
pub const DEFAULT_KDF_ITERATIONS: u32 = 600_000;

// Fixed HKDF domain-separation labels. Changing either breaks every stored
// encrypted private key.
const HKDF_SALT: &[u8] = b"covault";
const HKDF_INFO: &[u8] = b"covault symmetric key";

/// Derives the master key from the password and email.
///
/// The email is trimmed and lowercased before use as the PBKDF2 salt so that
/// `" A@X.com "` and `"a@x.com"` derive the same key.
pub fn derive_master_key(
    password: &str,
    email: &str,
    iterations: u32,
) -> CryptoResult<MasterKey> {
    if password.is_empty() {
        return Err(CryptoError::InvalidInput(
            "password must not be empty".to_string(),
        ));
    }
    let salt = email.trim().to_lowercase();
    if salt.is_empty() {
        return Err(CryptoError::InvalidInput(
            "email must not be empty".to_string(),
        ));
    }
    if iterations == 0 {
        return Err(CryptoError::KeyDerivation(
            "iteration count must be positive".to_string(),
        ));
    }

    let mut out = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut out);
    let key = MasterKey::from_bytes(out);
    out.zeroize();
    Ok(key)
}

/// Derives the symmetric key from the master key.
///
/// Pure function: the same master key always yields the same symmetric key.
pub fn derive_symmetric_key(master_key: &MasterKey) -> SymmetricKey {
    let hk = hkdf::Hkdf::<Sha256>::new(Some(HKDF_SALT), master_key.as_bytes());
    let mut okm = [0u8; KEY_SIZE];
    hk.expand(HKDF_INFO, &mut okm)
        .expect("HKDF expand cannot fail for 32-byte output");
    let key = SymmetricKey::from_bytes(okm);
    okm.zeroize();
    key
}

/// Computes the base64 master password hash sent to the server for
/// authentication and password-change verification.
pub fn master_password_hash(master_key: &MasterKey, password: &str) -> CryptoResult<String> {
    if password.is_empty() {
        return Err(CryptoError::InvalidInput(
            "password must not be empty".to_string(),
        ));
    }

    let mut out = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(master_key.as_bytes(), password.as_bytes(), 1, &mut out);
    let encoded = STANDARD.encode(out);
    out.zeroize();
    Ok(encoded)
}
