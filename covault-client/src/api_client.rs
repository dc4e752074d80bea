//! HTTP client for the vault API.
//!
//! Bearer-token authentication against the control plane. The token is an
//! opaque server-issued session token; there is no refresh endpoint, so a
//! 401 on an authenticated route clears the session and surfaces
//! `AuthRequired`.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::types::*;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

struct AuthState {
    token: Option<String>,
    user_id: Option<String>,
}

/// HTTP client for the Covault control plane.
pub struct VaultApiClient {
    client: Client,
    config: ClientConfig,
    auth: RwLock<AuthState>,
}

impl VaultApiClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            auth: RwLock::new(AuthState {
                token: None,
                user_id: None,
            }),
        })
    }

    /// Sets the session directly (restoring a saved token).
    pub async fn set_session(&self, token: String, user_id: String) {
        let mut auth = self.auth.write().await;
        auth.token = Some(token);
        auth.user_id = Some(user_id);
    }

    pub async fn is_authenticated(&self) -> bool {
        self.auth.read().await.token.is_some()
    }

    pub async fn user_id(&self) -> Option<String> {
        self.auth.read().await.user_id.clone()
    }

    async fn clear_session(&self) {
        let mut auth = self.auth.write().await;
        auth.token = None;
        auth.user_id = None;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    async fn token(&self) -> ClientResult<String> {
        self.auth
            .read()
            .await
            .token
            .clone()
            .ok_or(ClientError::AuthRequired)
    }

    /// Decodes a response, mapping 401 to `AuthRequired` (with session
    /// teardown) and other non-success statuses to `Api`.
    async fn decode<T: DeserializeOwned>(&self, resp: reqwest::Response) -> ClientResult<T> {
        if resp.status() == StatusCode::UNAUTHORIZED {
            self.clear_session().await;
            return Err(ClientError::AuthRequired);
        }
        let resp = resp
            .error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?;
        Ok(resp.json().await?)
    }

    async fn check(&self, resp: reqwest::Response) -> ClientResult<()> {
        if resp.status() == StatusCode::UNAUTHORIZED {
            self.clear_session().await;
            return Err(ClientError::AuthRequired);
        }
        resp.error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?;
        Ok(())
    }

    async fn auth_get(&self, path: &str) -> ClientResult<reqwest::Response> {
        let token = self.token().await?;
        Ok(self
            .client
            .get(self.url(path))
            .bearer_auth(&token)
            .send()
            .await?)
    }

    async fn auth_post(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> ClientResult<reqwest::Response> {
        let token = self.token().await?;
        Ok(self
            .client
            .post(self.url(path))
            .bearer_auth(&token)
            .json(body)
            .send()
            .await?)
    }

    async fn auth_patch(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> ClientResult<reqwest::Response> {
        let token = self.token().await?;
        Ok(self
            .client
            .patch(self.url(path))
            .bearer_auth(&token)
            .json(body)
            .send()
            .await?)
    }

    // ── Pre-auth ──

    /// Fetches the KDF iteration count for an email. The server answers for
    /// unknown emails too, so this cannot be used for account enumeration.
    pub async fn prelogin(&self, email: &str) -> ClientResult<PreloginResponse> {
        let resp = self
            .client
            .post(self.url("/api/auth/prelogin"))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?;
        Ok(resp.json().await?)
    }

    pub async fn register(&self, req: &RegisterRequest) -> ClientResult<TokenResponse> {
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(req)
            .send()
            .await?;

        if resp.status() == StatusCode::CONFLICT {
            return Err(ClientError::Api("email already registered".to_string()));
        }
        let resp = resp
            .error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?;

        let token: TokenResponse = resp.json().await?;
        self.set_session(token.token.clone(), token.user.id.clone())
            .await;
        Ok(token)
    }

    /// Submits credentials. A 401 here means the server rejected the master
    /// password hash — i.e. a wrong password — so it maps to
    /// `IncorrectPassword`, not `AuthRequired`.
    pub async fn login(&self, req: &LoginRequest) -> ClientResult<TokenResponse> {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(req)
            .send()
            .await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::IncorrectPassword);
        }
        let resp = resp
            .error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?;

        let token: TokenResponse = resp.json().await?;
        self.set_session(token.token.clone(), token.user.id.clone())
            .await;
        Ok(token)
    }

    /// Deletes the server session (best effort) and forgets the token.
    pub async fn logout(&self) {
        if let Ok(token) = self.token().await {
            let result = self
                .client
                .post(self.url("/api/auth/logout"))
                .bearer_auth(&token)
                .send()
                .await;
            if let Err(e) = result {
                debug!("server-side logout failed, discarding token anyway: {e}");
            }
        }
        self.clear_session().await;
    }

    pub async fn me(&self) -> ClientResult<UserProfile> {
        let resp = self.auth_get("/api/auth/me").await?;
        self.decode(resp).await
    }

    // ── Password change / reset ──

    pub async fn change_password(&self, req: &ChangePasswordRequest) -> ClientResult<()> {
        let resp = self.auth_post("/api/auth/change-password", req).await?;
        if resp.status() == StatusCode::BAD_REQUEST {
            return Err(ClientError::IncorrectPassword);
        }
        self.check(resp).await
    }

    pub async fn forgot_password(&self, email: &str) -> ClientResult<()> {
        let resp = self
            .client
            .post(self.url("/api/auth/forgot-password"))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;
        resp.error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?;
        Ok(())
    }

    pub async fn validate_reset(&self, token: &str) -> ClientResult<ResetValidation> {
        let resp = self
            .client
            .get(self.url("/api/auth/validate-reset"))
            .query(&[("token", token)])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?;
        Ok(resp.json().await?)
    }

    pub async fn reset_password(&self, req: &ResetPasswordRequest) -> ClientResult<()> {
        let resp = self
            .client
            .post(self.url("/api/auth/reset-password"))
            .json(req)
            .send()
            .await?;
        resp.error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?;
        Ok(())
    }

    // ── Invitations ──

    pub async fn validate_invite(&self, token: &str) -> ClientResult<InviteValidation> {
        let resp = self
            .client
            .get(self.url("/api/auth/validate-invite"))
            .query(&[("token", token)])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?;
        Ok(resp.json().await?)
    }

    pub async fn accept_invite(&self, req: &AcceptInviteRequest) -> ClientResult<TokenResponse> {
        let resp = self
            .client
            .post(self.url("/api/auth/accept-invite"))
            .json(req)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?;

        let token: TokenResponse = resp.json().await?;
        self.set_session(token.token.clone(), token.user.id.clone())
            .await;
        Ok(token)
    }

    // ── Org key exchange ──

    /// Stores a wrapped org key for a member. The server upserts on the
    /// (org, member) pair, so concurrent ceremonies are last-write-wins
    /// rather than an error.
    pub async fn store_org_key(
        &self,
        org_id: &str,
        user_id: &str,
        encrypted_org_key: &str,
    ) -> ClientResult<()> {
        let resp = self
            .auth_post(
                &format!("/api/auth/org/{org_id}/keys"),
                &OrgKeyExchange {
                    user_id: user_id.to_string(),
                    encrypted_org_key: encrypted_org_key.to_string(),
                },
            )
            .await?;
        self.check(resp).await
    }

    /// Fetches the current user's wrapped org key for an organization.
    pub async fn my_org_key(&self, org_id: &str) -> ClientResult<String> {
        let resp = self.auth_get(&format!("/api/auth/org/{org_id}/my-key")).await?;

        #[derive(serde::Deserialize)]
        struct Resp {
            encrypted_org_key: String,
        }
        let data: Resp = self.decode(resp).await?;
        Ok(data.encrypted_org_key)
    }

    pub async fn user_public_key(&self, user_id: &str) -> ClientResult<String> {
        let resp = self
            .auth_get(&format!("/api/auth/user/{user_id}/public-key"))
            .await?;

        #[derive(serde::Deserialize)]
        struct Resp {
            public_key: String,
        }
        let data: Resp = self.decode(resp).await?;
        Ok(data.public_key)
    }

    /// Members who accepted their invitation but hold no wrapped org key.
    pub async fn pending_key_members(&self, org_id: &str) -> ClientResult<Vec<PendingKeyMember>> {
        let resp = self
            .auth_get(&format!("/api/auth/org/{org_id}/pending-keys"))
            .await?;
        self.decode(resp).await
    }

    // ── Items ──

    pub async fn list_items(
        &self,
        page: u32,
        limit: u32,
        include_archived: bool,
    ) -> ClientResult<ItemListResponse> {
        let resp = self
            .auth_get(&format!(
                "/api/items?page={page}&limit={limit}&include_archived={include_archived}"
            ))
            .await?;
        self.decode(resp).await
    }

    pub async fn update_item(&self, item_id: &str, update: &ItemUpdate) -> ClientResult<Item> {
        let resp = self
            .auth_patch(&format!("/api/items/{item_id}"), update)
            .await?;
        self.decode(resp).await
    }

    pub async fn migration_status(&self) -> ClientResult<MigrationStatus> {
        let resp = self.auth_get("/api/items/migration/status").await?;
        self.decode(resp).await
    }
}
