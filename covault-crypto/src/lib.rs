//! Zero-knowledge key hierarchy for Covault.
//!
//! Implements the client-side cryptographic protocol:
//! - PBKDF2-SHA256 for deriving the master key from the user's password
//! - HKDF-SHA256 for stretching the master key into an AEAD key
//! - AES-256-GCM for authenticated encryption (nonce-prefix format)
//! - RSA-2048 OAEP for wrapping organization keys between members
//!
//! # Architecture
//!
//! The key hierarchy has three tiers:
//!
//! 1. **Master Key**: derived from (password, email, iterations). Never
//!    stored and never transmitted — only a single-iteration hash of it
//!    crosses the network for authentication.
//!
//! 2. **Symmetric Key**: derived from the master key via HKDF. Protects
//!    exactly one thing: the user's RSA private key at rest.
//!
//! 3. **Organization Key**: random per-organization AEAD key protecting all
//!    item and file content. Shared with members by wrapping it under each
//!    member's RSA public key.
//!
//! This layout allows a password change to re-encrypt only the private key,
//! and lets a recovery secret (the exported master key) provide an alternate
//! decryption path for the private key during password reset.

mod cipher;
mod data;
mod error;
mod kdf;
mod keypair;
mod keys;
mod orgkey;
mod recovery;

pub use cipher::{decrypt, encrypt, NONCE_SIZE, TAG_SIZE};
pub use data::{decrypt_bytes, decrypt_string, encrypt_bytes, encrypt_string};
pub use error::{CryptoError, CryptoResult};
pub use kdf::{
    derive_master_key, derive_symmetric_key, master_password_hash, DEFAULT_KDF_ITERATIONS,
};
pub use keypair::{
    decrypt_private_key, encrypt_private_key, export_public_key, generate_keypair,
    import_public_key, UserKeyPair, RSA_BITS,
};
pub use keys::{MasterKey, OrgKey, SymmetricKey, KEY_SIZE};
pub use orgkey::{generate_org_key, unwrap_org_key, wrap_org_key};
pub use recovery::{
    decrypt_private_key_with_recovery, encrypt_private_key_for_recovery, export_recovery_secret,
};

// Re-exported so callers can name keypair types without a direct rsa dep.
pub use rsa::{RsaPrivateKey, RsaPublicKey};
