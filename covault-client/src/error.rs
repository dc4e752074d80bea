//! Client error types.

use covault_crypto::CryptoError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in client flows.
///
/// `IncorrectPassword` and `InvalidRecoveryKey` are the user-facing shapes of
/// [`CryptoError::Authentication`]; flows map the raw authentication failure
/// to whichever of the two fits the step that was running, without exposing
/// which ciphertext rejected.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("incorrect password")]
    IncorrectPassword,

    #[error("invalid recovery key")]
    InvalidRecoveryKey,

    /// A key store getter ran before login, or for an organization the
    /// caller never unlocked. Callers redirect to authentication rather than
    /// showing a crypto error.
    #[error("{0} not available, authentication required")]
    KeyNotAvailable(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("authentication required")]
    AuthRequired,

    #[error("API request failed: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("crypto error: {0}")]
    Crypto(CryptoError),

    #[error("background task failed: {0}")]
    Background(String),
}

impl From<CryptoError> for ClientError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidInput(msg) => ClientError::MalformedInput(msg),
            other => ClientError::Crypto(other),
        }
    }
}
