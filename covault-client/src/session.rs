//! Authenticated session flows.
//!
//! Orchestrates the zero-knowledge protocol end to end: registration,
//! login, logout, invitation acceptance, password change, and password
//! reset. Each flow follows a strict sequential dependency — master key
//! before symmetric key, symmetric key before private-key decryption,
//! private key before any org-key unwrap — and crypto failures propagate
//! immediately, never retried.
//!
//! The password KDF runs hundreds of thousands of PBKDF2 rounds, and RSA
//! generation is similarly CPU-bound, so both are pushed onto the blocking
//! thread pool. Key material crossing those threads stays in memory only.

use crate::api_client::VaultApiClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::keystore::KeyStore;
use crate::types::*;
use covault_crypto::{
    decrypt_private_key, decrypt_private_key_with_recovery, derive_master_key,
    derive_symmetric_key, encrypt_private_key, encrypt_private_key_for_recovery,
    export_public_key, export_recovery_secret, generate_keypair, generate_org_key,
    master_password_hash, unwrap_org_key, wrap_org_key, CryptoError, MasterKey, SymmetricKey,
    UserKeyPair,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Filler for the legacy raw-password field on zero-knowledge requests.
/// The server authenticates with the master password hash and never reads
/// this value for ZK accounts.
const PASSWORD_PLACEHOLDER: &str = "placeholder";

/// Outcome of registration or invitation acceptance. The recovery secret is
/// shown to the user exactly once and never persisted.
#[derive(Debug)]
pub struct Registration {
    pub user: UserProfile,
    pub recovery_secret: String,
}

/// A single authenticated session: API client + key store + account profile.
///
/// One session equals one logical identity; starting a new login supersedes
/// whatever the previous one left in the key store.
pub struct Session {
    api: Arc<VaultApiClient>,
    keys: Arc<KeyStore>,
    config: ClientConfig,
    profile: RwLock<Option<UserProfile>>,
}

impl Session {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let api = Arc::new(VaultApiClient::new(config.clone())?);
        Ok(Self {
            api,
            keys: Arc::new(KeyStore::new()),
            config,
            profile: RwLock::new(None),
        })
    }

    pub fn api(&self) -> Arc<VaultApiClient> {
        Arc::clone(&self.api)
    }

    pub fn key_store(&self) -> Arc<KeyStore> {
        Arc::clone(&self.keys)
    }

    pub async fn profile(&self) -> Option<UserProfile> {
        self.profile.read().await.clone()
    }

    /// Fetches the KDF iteration count to use for an email.
    pub async fn prelogin(&self, email: &str) -> ClientResult<u32> {
        let resp = self.api.prelogin(email).await?;
        Ok(resp.kdf_iterations)
    }

    // ── Registration ──

    /// Registers a new account and its personal organization.
    ///
    /// Builds the complete artifact set locally — master password hash,
    /// encrypted private key, public key, self-wrapped org key, recovery
    /// ciphertext — and submits it in one request. Returns the one-time
    /// recovery secret alongside the new profile.
    pub async fn register(
        &self,
        email: &str,
        full_name: &str,
        password: &str,
    ) -> ClientResult<Registration> {
        if email.trim().is_empty() || full_name.trim().is_empty() {
            return Err(ClientError::MalformedInput(
                "email and full name are required".to_string(),
            ));
        }

        let iterations = self.config.kdf_iterations;
        let (master_key, symmetric_key, hash, keypair) =
            derive_with_keypair(password.to_string(), email.to_string(), iterations).await?;

        let encrypted_private_key = encrypt_private_key(&keypair.private, &symmetric_key)?;
        let public_key = export_public_key(&keypair.public)?;

        // Fresh org key for the personal organization, wrapped for self.
        let org_key = generate_org_key();
        let encrypted_org_key = wrap_org_key(&org_key, &keypair.public)?;

        let recovery_secret = export_recovery_secret(&master_key);
        let recovery_encrypted_private_key =
            encrypt_private_key_for_recovery(&keypair.private, &recovery_secret)?;

        let resp = self
            .api
            .register(&RegisterRequest {
                email: email.trim().to_lowercase(),
                password: PASSWORD_PLACEHOLDER.to_string(),
                full_name: full_name.trim().to_string(),
                master_password_hash: hash,
                encrypted_private_key,
                public_key,
                encrypted_org_key,
                recovery_encrypted_private_key,
                kdf_iterations: iterations,
            })
            .await?;

        self.keys
            .initialize(master_key, symmetric_key, keypair)
            .await;
        if let Some(org_id) = &resp.user.active_org_id {
            self.keys.insert_org_key(org_id, org_key).await?;
        }
        *self.profile.write().await = Some(resp.user.clone());

        info!("registered account {}", resp.user.id);
        Ok(Registration {
            user: resp.user,
            recovery_secret,
        })
    }

    // ── Login ──

    /// Authenticates and unlocks the key store.
    ///
    /// A server 401 and a local private-key decryption failure both surface
    /// as `IncorrectPassword`; the caller cannot tell which layer rejected.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<UserProfile> {
        let iterations = self.prelogin(email).await?;
        let (master_key, symmetric_key, hash) =
            derive_credentials(password.to_string(), email.to_string(), iterations).await?;

        let resp = self
            .api
            .login(&LoginRequest {
                email: email.trim().to_lowercase(),
                password: PASSWORD_PLACEHOLDER.to_string(),
                master_password_hash: Some(hash),
            })
            .await?;

        match &resp.encrypted_private_key {
            Some(blob) => {
                let private = decrypt_private_key(blob, &symmetric_key).map_err(|e| match e {
                    CryptoError::Authentication => ClientError::IncorrectPassword,
                    other => ClientError::Crypto(other),
                })?;
                let public = covault_crypto::RsaPublicKey::from(&private);
                self.keys
                    .initialize(master_key, symmetric_key, UserKeyPair { private, public })
                    .await;

                // Org key unwrap comes strictly after private-key decrypt.
                if let (Some(org_id), Some(wrapped)) =
                    (&resp.user.active_org_id, &resp.encrypted_org_key)
                {
                    let private = self.keys.private_key().await?;
                    let org_key = unwrap_org_key(wrapped, &private)?;
                    self.keys.insert_org_key(org_id, org_key).await?;
                }
            }
            None => {
                // Legacy account: nothing to unlock until it is migrated.
                debug!("account {} has no zero-knowledge keys", resp.user.id);
            }
        }

        *self.profile.write().await = Some(resp.user.clone());
        Ok(resp.user)
    }

    /// Clears the server session and wipes all local key material.
    pub async fn logout(&self) {
        self.api.logout().await;
        self.keys.clear().await;
        *self.profile.write().await = None;
    }

    /// Fetches and unwraps this user's org key for an organization that was
    /// granted after login (key ceremony completed by another member).
    pub async fn unlock_org(&self, org_id: &str) -> ClientResult<()> {
        let wrapped = self.api.my_org_key(org_id).await?;
        let private = self.keys.private_key().await?;
        let org_key = unwrap_org_key(&wrapped, &private)?;
        self.keys.insert_org_key(org_id, org_key).await
    }

    // ── Invitation acceptance ──

    /// Accepts an organization invitation, creating this user's account and
    /// key material. The new member holds no org key yet — an existing
    /// member must run the key ceremony before shared data opens.
    pub async fn accept_invitation(
        &self,
        token: &str,
        password: &str,
    ) -> ClientResult<Registration> {
        let invite = self.api.validate_invite(token).await?;
        if !invite.valid {
            return Err(ClientError::MalformedInput(
                "invalid or expired invitation token".to_string(),
            ));
        }
        let email = invite.email.ok_or_else(|| {
            ClientError::Api("invitation validation returned no email".to_string())
        })?;

        let iterations = self.config.kdf_iterations;
        let (master_key, symmetric_key, hash, keypair) =
            derive_with_keypair(password.to_string(), email.clone(), iterations).await?;

        let encrypted_private_key = encrypt_private_key(&keypair.private, &symmetric_key)?;
        let public_key = export_public_key(&keypair.public)?;
        let recovery_secret = export_recovery_secret(&master_key);
        let recovery_encrypted_private_key =
            encrypt_private_key_for_recovery(&keypair.private, &recovery_secret)?;

        let resp = self
            .api
            .accept_invite(&AcceptInviteRequest {
                token: token.to_string(),
                password: PASSWORD_PLACEHOLDER.to_string(),
                master_password_hash: hash,
                encrypted_private_key,
                public_key,
                recovery_encrypted_private_key,
                kdf_iterations: iterations,
            })
            .await?;

        self.keys
            .initialize(master_key, symmetric_key, keypair)
            .await;
        *self.profile.write().await = Some(resp.user.clone());

        info!("accepted invitation as {}", resp.user.id);
        Ok(Registration {
            user: resp.user,
            recovery_secret,
        })
    }

    // ── Password change ──

    /// Changes the password for the logged-in account.
    ///
    /// Derives the new master/symmetric keys, re-encrypts the resident
    /// private key, mints a new recovery secret and ciphertext, and submits
    /// everything atomically. Returns the new recovery secret — the old one
    /// is useless the moment the server accepts.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> ClientResult<String> {
        let profile = self
            .profile
            .read()
            .await
            .clone()
            .ok_or(ClientError::AuthRequired)?;
        let private = self.keys.private_key().await?;

        // Current hash proves knowledge of the old password to the server.
        let current_iterations = self.prelogin(&profile.email).await?;
        let (_, _, current_hash) = derive_credentials(
            current_password.to_string(),
            profile.email.clone(),
            current_iterations,
        )
        .await?;

        // New keys always use the configured iteration count, which is how
        // iteration-count migration reaches existing accounts.
        let new_iterations = self.config.kdf_iterations;
        let (new_master, new_symmetric, new_hash) = derive_credentials(
            new_password.to_string(),
            profile.email.clone(),
            new_iterations,
        )
        .await?;

        let new_encrypted_private_key = encrypt_private_key(&private, &new_symmetric)?;
        let new_recovery_secret = export_recovery_secret(&new_master);
        let new_recovery_blob =
            encrypt_private_key_for_recovery(&private, &new_recovery_secret)?;

        self.api
            .change_password(&ChangePasswordRequest {
                current_master_password_hash: Some(current_hash),
                new_master_password_hash: Some(new_hash),
                new_encrypted_private_key: Some(new_encrypted_private_key),
                new_recovery_encrypted_private_key: Some(new_recovery_blob),
                new_kdf_iterations: Some(new_iterations),
                ..Default::default()
            })
            .await?;

        // Server accepted: swap in the new keys, keep keypair and org keys.
        self.keys.rotate(new_master, new_symmetric).await?;
        info!("password changed for account {}", profile.id);
        Ok(new_recovery_secret)
    }

    // ── Password reset ──

    /// Resets a forgotten password using the one-time recovery secret.
    ///
    /// The recovery ciphertext comes from the reset-token validation; a
    /// wrong secret fails locally as `InvalidRecoveryKey` before anything is
    /// submitted. On success the server holds a full new artifact set and
    /// the old recovery secret is permanently dead. The user logs in again
    /// afterwards; this flow does not populate the key store.
    pub async fn reset_password(
        &self,
        token: &str,
        recovery_secret: &str,
        new_password: &str,
    ) -> ClientResult<String> {
        let validation = self.api.validate_reset(token).await?;
        if !validation.valid {
            return Err(ClientError::MalformedInput(
                "invalid or expired reset token".to_string(),
            ));
        }
        let email = validation
            .email
            .ok_or_else(|| ClientError::Api("reset validation returned no email".to_string()))?;
        let recovery_blob = validation.recovery_encrypted_private_key.ok_or_else(|| {
            ClientError::Api("account has no recovery key material".to_string())
        })?;

        let private =
            decrypt_private_key_with_recovery(&recovery_blob, recovery_secret).map_err(|e| {
                match e {
                    CryptoError::Authentication
                    | CryptoError::Encoding(_)
                    | CryptoError::InvalidKeyLength { .. } => ClientError::InvalidRecoveryKey,
                    other => ClientError::Crypto(other),
                }
            })?;

        let iterations = self.config.kdf_iterations;
        let (new_master, new_symmetric, new_hash) =
            derive_credentials(new_password.to_string(), email, iterations).await?;

        let encrypted_private_key = encrypt_private_key(&private, &new_symmetric)?;
        let new_recovery_secret = export_recovery_secret(&new_master);
        let recovery_encrypted_private_key =
            encrypt_private_key_for_recovery(&private, &new_recovery_secret)?;

        self.api
            .reset_password(&ResetPasswordRequest {
                token: token.to_string(),
                password: PASSWORD_PLACEHOLDER.to_string(),
                master_password_hash: new_hash,
                encrypted_private_key,
                recovery_encrypted_private_key,
                kdf_iterations: iterations,
            })
            .await?;

        info!("password reset submitted");
        Ok(new_recovery_secret)
    }
}

/// Runs the password KDF chain on the blocking pool.
async fn derive_credentials(
    password: String,
    email: String,
    iterations: u32,
) -> ClientResult<(MasterKey, SymmetricKey, String)> {
    run_blocking(move || {
        let master = derive_master_key(&password, &email, iterations)?;
        let symmetric = derive_symmetric_key(&master);
        let hash = master_password_hash(&master, &password)?;
        Ok((master, symmetric, hash))
    })
    .await
}

/// KDF chain plus RSA keypair generation, for registration-style flows.
async fn derive_with_keypair(
    password: String,
    email: String,
    iterations: u32,
) -> ClientResult<(MasterKey, SymmetricKey, String, UserKeyPair)> {
    run_blocking(move || {
        let master = derive_master_key(&password, &email, iterations)?;
        let symmetric = derive_symmetric_key(&master);
        let hash = master_password_hash(&master, &password)?;
        let keypair = generate_keypair()?;
        Ok((master, symmetric, hash, keypair))
    })
    .await
}

async fn run_blocking<T, F>(f: F) -> ClientResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CryptoError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(ClientError::from),
        Err(e) => {
            warn!("blocking crypto task failed: {e}");
            Err(ClientError::Background(e.to_string()))
        }
    }
}
