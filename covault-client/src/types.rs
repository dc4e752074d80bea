//! Wire types for the vault API.
//!
//! All key artifacts travel as base64 strings: encrypted private key,
//! recovery-encrypted private key, wrapped organization key, SPKI public
//! key, and the master password hash.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Account profile returned by auth endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub active_org_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreloginResponse {
    pub kdf_iterations: u32,
    #[serde(default)]
    pub email: String,
}

/// Registration payload. The raw `password` field exists for legacy accounts
/// only; zero-knowledge registrations carry a placeholder there and
/// authenticate with `master_password_hash`.
#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub master_password_hash: String,
    pub encrypted_private_key: String,
    pub public_key: String,
    pub encrypted_org_key: String,
    pub recovery_encrypted_private_key: String,
    pub kdf_iterations: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_password_hash: Option<String>,
}

/// Auth response: token, profile, and (for zero-knowledge accounts) the
/// stored key artifacts.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: UserProfile,
    #[serde(default)]
    pub encrypted_private_key: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub kdf_iterations: Option<u32>,
    #[serde(default)]
    pub encrypted_org_key: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ChangePasswordRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_master_password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_master_password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_encrypted_private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_recovery_encrypted_private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_kdf_iterations: Option<u32>,
}

/// Reset-token validation. For zero-knowledge accounts the server also
/// returns the account email (the KDF salt) and the recovery-encrypted
/// private key so the client can run the reset entirely locally.
#[derive(Clone, Debug, Deserialize)]
pub struct ResetValidation {
    pub valid: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub recovery_encrypted_private_key: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
    pub master_password_hash: String,
    pub encrypted_private_key: String,
    pub recovery_encrypted_private_key: String,
    pub kdf_iterations: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InviteValidation {
    pub valid: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub org_name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AcceptInviteRequest {
    pub token: String,
    pub password: String,
    pub master_password_hash: String,
    pub encrypted_private_key: String,
    pub public_key: String,
    pub recovery_encrypted_private_key: String,
    pub kdf_iterations: u32,
}

/// An organization member who accepted their invitation but has no wrapped
/// org key yet — the key ceremony's work list.
#[derive(Clone, Debug, Deserialize)]
pub struct PendingKeyMember {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    pub public_key: String,
}

/// Ceremony submission: one wrapped org key for one member.
#[derive(Clone, Debug, Serialize)]
pub struct OrgKeyExchange {
    pub user_id: String,
    pub encrypted_org_key: String,
}

/// A vault item. Field values and notes are ciphertext when
/// `encryption_version == 2`, plaintext for legacy items.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
    #[serde(default = "default_encryption_version")]
    pub encryption_version: i32,
}

fn default_encryption_version() -> i32 {
    1
}

/// Item encryption scheme markers.
pub const ENCRYPTION_LEGACY: i32 = 1;
pub const ENCRYPTION_ZERO_KNOWLEDGE: i32 = 2;

#[derive(Clone, Debug, Deserialize)]
pub struct ItemListResponse {
    pub items: Vec<Item>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_version: Option<i32>,
}

/// Counts of legacy vs zero-knowledge items and files for the active org.
#[derive(Clone, Debug, Deserialize)]
pub struct MigrationStatus {
    pub items_v1: u64,
    pub items_v2: u64,
    pub files_v1: u64,
    pub files_v2: u64,
}

impl MigrationStatus {
    /// True when nothing is left on the legacy scheme.
    pub fn is_complete(&self) -> bool {
        self.items_v1 == 0 && self.files_v1 == 0
    }
}
