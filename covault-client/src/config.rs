//! Client configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the vault client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for the Covault API (e.g., "https://api.covault.app").
    pub api_base_url: String,

    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,

    /// PBKDF2 iteration count used for NEW key material (registration,
    /// password change, reset). Logins use whatever count prelogin reports.
    pub kdf_iterations: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.covault.app".to_string(),
            request_timeout_secs: 30,
            kdf_iterations: covault_crypto::DEFAULT_KDF_ITERATIONS,
        }
    }
}

impl ClientConfig {
    /// Config pointed at a local or mock server, with a fast KDF.
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }
}
