//! Organization key ceremony.
//!
//! An invited member joins with a keypair but no org key; shared data stays
//! opaque to them until an existing member wraps the org key to their public
//! key. This module is that existing member's side: list the pending
//! members, wrap the resident org key for each, and upload the results.
//!
//! Grants are independent. One member's bad public key must not block the
//! rest of the roster, so failures are recorded per member and never abort
//! the ceremony.

use crate::api_client::VaultApiClient;
use crate::error::{ClientError, ClientResult};
use crate::keystore::KeyStore;
use crate::types::PendingKeyMember;
use covault_crypto::{import_public_key, wrap_org_key};
use std::sync::Arc;
use tracing::{info, warn};

/// Per-member result of a ceremony run. `error` is `None` on success.
#[derive(Debug)]
pub struct GrantOutcome {
    pub user_id: String,
    pub email: String,
    pub error: Option<String>,
}

impl GrantOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Wraps the org key for members waiting on access.
pub struct KeyCeremony {
    api: Arc<VaultApiClient>,
    keys: Arc<KeyStore>,
}

impl KeyCeremony {
    pub fn new(api: Arc<VaultApiClient>, keys: Arc<KeyStore>) -> Self {
        Self { api, keys }
    }

    /// Members of the organization who have accepted their invitation but
    /// hold no wrapped org key.
    pub async fn pending_members(&self, org_id: &str) -> ClientResult<Vec<PendingKeyMember>> {
        self.api.pending_key_members(org_id).await
    }

    /// Runs the ceremony for every pending member of `org_id`.
    ///
    /// Requires the caller's own org key to be resident (`KeyNotAvailable`
    /// otherwise). Each grant wraps that key to the member's public key and
    /// uploads it; a failed grant is recorded in the outcome and the loop
    /// continues.
    pub async fn grant_pending(&self, org_id: &str) -> ClientResult<Vec<GrantOutcome>> {
        let org_key = self.keys.org_key(org_id).await?;
        let members = self.api.pending_key_members(org_id).await?;

        let mut outcomes = Vec::with_capacity(members.len());
        for member in members {
            let result = self.grant_one(org_id, &org_key, &member).await;
            let error = match result {
                Ok(()) => None,
                Err(e) => {
                    warn!(
                        "org key grant failed for {} in {org_id}: {e}",
                        member.email
                    );
                    Some(e.to_string())
                }
            };
            outcomes.push(GrantOutcome {
                user_id: member.user_id,
                email: member.email,
                error,
            });
        }

        let granted = outcomes.iter().filter(|o| o.succeeded()).count();
        info!(
            "key ceremony for {org_id}: {granted} granted, {} failed",
            outcomes.len() - granted
        );
        Ok(outcomes)
    }

    async fn grant_one(
        &self,
        org_id: &str,
        org_key: &covault_crypto::OrgKey,
        member: &PendingKeyMember,
    ) -> ClientResult<()> {
        let public = import_public_key(&member.public_key).map_err(|_| {
            ClientError::MalformedInput(format!("unusable public key for {}", member.email))
        })?;
        let wrapped = wrap_org_key(org_key, &public)?;
        self.api
            .store_org_key(org_id, &member.user_id, &wrapped)
            .await
    }
}
