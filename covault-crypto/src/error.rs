//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// AEAD tag or OAEP padding verification failed: wrong key, corrupted
    /// data, or tampering. Deliberately carries no detail so callers cannot
    /// tell which step rejected the ciphertext.
    #[error("authentication failed (wrong key or tampered data)")]
    Authentication,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid encoding: {0}")]
    Encoding(#[from] base64::DecodeError),
}
