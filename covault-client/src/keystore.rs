//! In-memory key store.
//!
//! Process-scoped holder of the currently decrypted keys: master key,
//! symmetric key, RSA keypair, and a map from organization id to
//! organization key. Nothing here is ever written to disk or any other
//! persistent medium — the store empties only on an explicit clear or
//! process teardown.
//!
//! This is an explicit session object handed to every flow, not a hidden
//! global, so "only one logical session holds state at a time" is enforced
//! by ownership: `initialize` wipes whatever a previous session left behind.

use crate::error::{ClientError, ClientResult};
use covault_crypto::{MasterKey, OrgKey, RsaPrivateKey, RsaPublicKey, SymmetricKey, UserKeyPair};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    master_key: Option<MasterKey>,
    symmetric_key: Option<SymmetricKey>,
    keypair: Option<UserKeyPair>,
    org_keys: HashMap<String, OrgKey>,
}

/// Ephemeral store for the authenticated session's decrypted keys.
pub struct KeyStore {
    inner: RwLock<Inner>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Installs a freshly derived key set, superseding any previous session.
    ///
    /// Any state from an earlier login — including its org keys — is
    /// dropped; a new identity never inherits another session's keys.
    pub async fn initialize(
        &self,
        master_key: MasterKey,
        symmetric_key: SymmetricKey,
        keypair: UserKeyPair,
    ) {
        let mut inner = self.inner.write().await;
        *inner = Inner {
            master_key: Some(master_key),
            symmetric_key: Some(symmetric_key),
            keypair: Some(keypair),
            org_keys: HashMap::new(),
        };
    }

    /// Swaps in new master/symmetric keys after a password change, keeping
    /// the keypair and any unlocked org keys.
    pub async fn rotate(
        &self,
        master_key: MasterKey,
        symmetric_key: SymmetricKey,
    ) -> ClientResult<()> {
        let mut inner = self.inner.write().await;
        if inner.keypair.is_none() {
            return Err(ClientError::KeyNotAvailable("session keys".to_string()));
        }
        inner.master_key = Some(master_key);
        inner.symmetric_key = Some(symmetric_key);
        Ok(())
    }

    /// Adds an organization key to an initialized store (key ceremony,
    /// accepting an invitation, or login response).
    pub async fn insert_org_key(&self, org_id: &str, org_key: OrgKey) -> ClientResult<()> {
        let mut inner = self.inner.write().await;
        if inner.keypair.is_none() {
            return Err(ClientError::KeyNotAvailable("session keys".to_string()));
        }
        inner.org_keys.insert(org_id.to_string(), org_key);
        Ok(())
    }

    pub async fn master_key(&self) -> ClientResult<MasterKey> {
        self.inner
            .read()
            .await
            .master_key
            .clone()
            .ok_or_else(|| ClientError::KeyNotAvailable("master key".to_string()))
    }

    pub async fn symmetric_key(&self) -> ClientResult<SymmetricKey> {
        self.inner
            .read()
            .await
            .symmetric_key
            .clone()
            .ok_or_else(|| ClientError::KeyNotAvailable("symmetric key".to_string()))
    }

    pub async fn private_key(&self) -> ClientResult<RsaPrivateKey> {
        self.inner
            .read()
            .await
            .keypair
            .as_ref()
            .map(|kp| kp.private.clone())
            .ok_or_else(|| ClientError::KeyNotAvailable("private key".to_string()))
    }

    pub async fn public_key(&self) -> ClientResult<RsaPublicKey> {
        self.inner
            .read()
            .await
            .keypair
            .as_ref()
            .map(|kp| kp.public.clone())
            .ok_or_else(|| ClientError::KeyNotAvailable("public key".to_string()))
    }

    pub async fn org_key(&self, org_id: &str) -> ClientResult<OrgKey> {
        self.inner
            .read()
            .await
            .org_keys
            .get(org_id)
            .cloned()
            .ok_or_else(|| {
                ClientError::KeyNotAvailable(format!("organization key for {org_id}"))
            })
    }

    /// Organization ids with a resident key.
    pub async fn unlocked_orgs(&self) -> Vec<String> {
        self.inner.read().await.org_keys.keys().cloned().collect()
    }

    /// True iff both the master key and the keypair are present.
    pub async fn is_initialized(&self) -> bool {
        let inner = self.inner.read().await;
        inner.master_key.is_some() && inner.keypair.is_some()
    }

    /// Wipes all key material (logout, unrecoverable auth failure).
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        *inner = Inner::default();
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}
