//! End-to-end flow tests against a mock API.
//!
//! The register mock captures the submitted key artifacts and the login mock
//! serves them back, so register -> login round-trips exercise the real
//! client-side crypto with nothing decryptable on the "server".

use covault_client::ceremony::KeyCeremony;
use covault_client::config::ClientConfig;
use covault_client::error::ClientError;
use covault_client::session::Session;
use covault_crypto::{
    derive_master_key, derive_symmetric_key, encrypt_private_key, export_public_key,
    generate_keypair, UserKeyPair,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, OnceLock};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const TEST_ITERATIONS: u32 = 1_000;
const EMAIL: &str = "alice@example.com";
const PASSWORD: &str = "correct horse battery staple";

fn member_keypair() -> UserKeyPair {
    static KP: OnceLock<UserKeyPair> = OnceLock::new();
    KP.get_or_init(|| generate_keypair().unwrap()).clone()
}

fn test_session(server: &MockServer) -> Session {
    let config = ClientConfig {
        api_base_url: server.uri(),
        request_timeout_secs: 10,
        kdf_iterations: TEST_ITERATIONS,
    };
    Session::new(config).unwrap()
}

async fn mount_prelogin(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/prelogin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "kdf_iterations": TEST_ITERATIONS })),
        )
        .mount(server)
        .await;
}

type Captured = Arc<Mutex<Option<Value>>>;

/// Stores the registration payload and answers like the real server would:
/// a token plus the new profile. The artifacts stay opaque to it.
struct CaptureRegister {
    captured: Captured,
}

impl Respond for CaptureRegister {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let user = json!({
            "id": "u-1",
            "email": body["email"],
            "full_name": body["full_name"],
            "active_org_id": "org-1"
        });
        *self.captured.lock().unwrap() = Some(body);
        ResponseTemplate::new(201).set_body_json(json!({ "token": "tok-reg", "user": user }))
    }
}

/// Checks the master password hash against the captured registration and
/// replays the stored artifacts on a match, 401 otherwise.
struct LoginFromCapture {
    captured: Captured,
}

impl Respond for LoginFromCapture {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let req: Value = serde_json::from_slice(&request.body).unwrap();
        let stored = self.captured.lock().unwrap().clone().unwrap();
        if req["master_password_hash"] != stored["master_password_hash"] {
            return ResponseTemplate::new(401);
        }
        ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-login",
            "user": {
                "id": "u-1",
                "email": stored["email"],
                "full_name": stored["full_name"],
                "active_org_id": "org-1"
            },
            "encrypted_private_key": stored["encrypted_private_key"],
            "public_key": stored["public_key"],
            "encrypted_org_key": stored["encrypted_org_key"],
            "kdf_iterations": TEST_ITERATIONS
        }))
    }
}

async fn mount_register_login(server: &MockServer) -> Captured {
    let captured: Captured = Arc::new(Mutex::new(None));
    mount_prelogin(server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(CaptureRegister {
            captured: Arc::clone(&captured),
        })
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(LoginFromCapture {
            captured: Arc::clone(&captured),
        })
        .mount(server)
        .await;
    captured
}

// --- Registration ---

#[tokio::test]
async fn register_populates_keystore_and_org_key() {
    let server = MockServer::start().await;
    let captured = mount_register_login(&server).await;

    let session = test_session(&server);
    let reg = session.register(EMAIL, "Alice", PASSWORD).await.unwrap();

    assert_eq!(reg.user.email, EMAIL);
    assert!(!reg.recovery_secret.is_empty());

    let keys = session.key_store();
    assert!(keys.is_initialized().await);
    assert_eq!(keys.unlocked_orgs().await, vec!["org-1".to_string()]);

    // Everything the server received is ciphertext or a one-way hash.
    let body = captured.lock().unwrap().clone().unwrap();
    assert_eq!(body["password"], "placeholder");
    assert!(body["encrypted_private_key"].as_str().unwrap().len() > 100);
    assert!(body["recovery_encrypted_private_key"].is_string());
    assert_eq!(body["kdf_iterations"], TEST_ITERATIONS);
}

#[tokio::test]
async fn register_rejects_blank_identity() {
    let server = MockServer::start().await;
    let session = test_session(&server);
    let result = session.register("  ", "Alice", PASSWORD).await;
    assert!(matches!(
        result.unwrap_err(),
        ClientError::MalformedInput(_)
    ));
}

// --- Login ---

#[tokio::test]
async fn register_then_login_recovers_same_keys() {
    let server = MockServer::start().await;
    mount_register_login(&server).await;

    let reg_session = test_session(&server);
    reg_session.register(EMAIL, "Alice", PASSWORD).await.unwrap();
    let registered_public = export_public_key(&reg_session.key_store().public_key().await.unwrap()).unwrap();

    let session = test_session(&server);
    let user = session.login(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(user.email, EMAIL);

    let keys = session.key_store();
    assert!(keys.is_initialized().await);
    let recovered_public = export_public_key(&keys.public_key().await.unwrap()).unwrap();
    assert_eq!(recovered_public, registered_public);
    assert_eq!(keys.unlocked_orgs().await, vec!["org-1".to_string()]);
}

#[tokio::test]
async fn login_wrong_password_rejected_by_server() {
    let server = MockServer::start().await;
    mount_register_login(&server).await;

    let reg_session = test_session(&server);
    reg_session.register(EMAIL, "Alice", PASSWORD).await.unwrap();

    let session = test_session(&server);
    let result = session.login(EMAIL, "not the password").await;
    assert!(matches!(result.unwrap_err(), ClientError::IncorrectPassword));
    assert!(!session.key_store().is_initialized().await);
}

#[tokio::test]
async fn login_undecryptable_private_key_is_incorrect_password() {
    // A compromised or buggy server accepts the hash but serves a private
    // key blob the derived symmetric key cannot open. The client must treat
    // that exactly like a wrong password.
    let server = MockServer::start().await;
    mount_prelogin(&server).await;

    let other_master = derive_master_key("some other password", EMAIL, TEST_ITERATIONS).unwrap();
    let other_symmetric = derive_symmetric_key(&other_master);
    let foreign_blob = encrypt_private_key(&member_keypair().private, &other_symmetric).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-login",
            "user": { "id": "u-1", "email": EMAIL, "full_name": "Alice", "active_org_id": "org-1" },
            "encrypted_private_key": foreign_blob,
            "kdf_iterations": TEST_ITERATIONS
        })))
        .mount(&server)
        .await;

    let session = test_session(&server);
    let result = session.login(EMAIL, PASSWORD).await;
    assert!(matches!(result.unwrap_err(), ClientError::IncorrectPassword));
    assert!(!session.key_store().is_initialized().await);
}

#[tokio::test]
async fn login_legacy_account_skips_key_setup() {
    let server = MockServer::start().await;
    mount_prelogin(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-legacy",
            "user": { "id": "u-9", "email": EMAIL, "full_name": "Old Timer" }
        })))
        .mount(&server)
        .await;

    let session = test_session(&server);
    let user = session.login(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(user.id, "u-9");
    assert!(!session.key_store().is_initialized().await);
    assert!(session.profile().await.is_some());
}

#[tokio::test]
async fn logout_wipes_keys_and_profile() {
    let server = MockServer::start().await;
    mount_register_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let session = test_session(&server);
    session.register(EMAIL, "Alice", PASSWORD).await.unwrap();
    session.logout().await;

    assert!(!session.key_store().is_initialized().await);
    assert!(session.profile().await.is_none());
    assert!(!session.api().is_authenticated().await);
}

// --- Password change ---

#[tokio::test]
async fn change_password_rotates_keys_and_recovery_secret() {
    let server = MockServer::start().await;
    mount_register_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/change-password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let session = test_session(&server);
    let reg = session.register(EMAIL, "Alice", PASSWORD).await.unwrap();
    let public_before = export_public_key(&session.key_store().public_key().await.unwrap()).unwrap();
    let master_before = session.key_store().master_key().await.unwrap();

    let new_secret = session
        .change_password(PASSWORD, "a new and different password")
        .await
        .unwrap();

    assert_ne!(new_secret, reg.recovery_secret);
    let keys = session.key_store();
    // Keypair survives, master key does not.
    let public_after = export_public_key(&keys.public_key().await.unwrap()).unwrap();
    assert_eq!(public_after, public_before);
    assert_ne!(
        keys.master_key().await.unwrap().as_bytes(),
        master_before.as_bytes()
    );
    assert_eq!(keys.unlocked_orgs().await, vec!["org-1".to_string()]);
}

#[tokio::test]
async fn change_password_requires_login() {
    let server = MockServer::start().await;
    let session = test_session(&server);
    let result = session.change_password(PASSWORD, "whatever").await;
    assert!(matches!(result.unwrap_err(), ClientError::AuthRequired));
}

// --- Password reset ---

async fn mount_reset(server: &MockServer, captured: &Captured) {
    let stored = captured.lock().unwrap().clone().unwrap();
    Mock::given(method("GET"))
        .and(path("/api/auth/validate-reset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "email": stored["email"],
            "recovery_encrypted_private_key": stored["recovery_encrypted_private_key"]
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/reset-password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn reset_with_valid_recovery_secret_succeeds() {
    let server = MockServer::start().await;
    let captured = mount_register_login(&server).await;

    let reg_session = test_session(&server);
    let reg = reg_session.register(EMAIL, "Alice", PASSWORD).await.unwrap();
    mount_reset(&server, &captured).await;

    let session = test_session(&server);
    let new_secret = session
        .reset_password("reset-token", &reg.recovery_secret, "brand new password")
        .await
        .unwrap();

    assert_ne!(new_secret, reg.recovery_secret);
    // Reset never logs the user in.
    assert!(!session.key_store().is_initialized().await);
}

#[tokio::test]
async fn reset_with_wrong_recovery_secret_fails_locally() {
    let server = MockServer::start().await;
    let captured = mount_register_login(&server).await;

    let reg_session = test_session(&server);
    reg_session.register(EMAIL, "Alice", PASSWORD).await.unwrap();
    mount_reset(&server, &captured).await;

    // Well-formed 32-byte secret, wrong value.
    let wrong = {
        use base64::{engine::general_purpose::STANDARD, Engine};
        STANDARD.encode([7u8; 32])
    };

    let session = test_session(&server);
    let result = session
        .reset_password("reset-token", &wrong, "brand new password")
        .await;
    assert!(matches!(
        result.unwrap_err(),
        ClientError::InvalidRecoveryKey
    ));
}

#[tokio::test]
async fn reset_with_invalid_token_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/validate-reset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "valid": false })))
        .mount(&server)
        .await;

    let session = test_session(&server);
    let result = session
        .reset_password("stale-token", "irrelevant", "new password")
        .await;
    assert!(matches!(
        result.unwrap_err(),
        ClientError::MalformedInput(_)
    ));
}

// --- Invitation acceptance ---

#[tokio::test]
async fn accept_invitation_creates_keys_without_org_access() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/validate-invite"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "email": "bob@example.com",
            "org_name": "Acme"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/accept-invite"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-invite",
            "user": { "id": "u-2", "email": "bob@example.com", "full_name": "Bob", "active_org_id": "org-1" }
        })))
        .mount(&server)
        .await;

    let session = test_session(&server);
    let reg = session
        .accept_invitation("invite-token", "bobs password")
        .await
        .unwrap();

    assert_eq!(reg.user.id, "u-2");
    assert!(!reg.recovery_secret.is_empty());
    // Keys exist but no org key until a member runs the ceremony.
    assert!(session.key_store().is_initialized().await);
    assert!(session.key_store().unlocked_orgs().await.is_empty());
}

// --- Key ceremony ---

#[tokio::test]
async fn ceremony_grants_valid_members_and_reports_failures() {
    let server = MockServer::start().await;
    mount_register_login(&server).await;

    let session = test_session(&server);
    session.register(EMAIL, "Alice", PASSWORD).await.unwrap();

    let good_key = export_public_key(&member_keypair().public).unwrap();
    Mock::given(method("GET"))
        .and(path("/api/auth/org/org-1/pending-keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "user_id": "u-2", "email": "bob@example.com", "public_key": good_key },
            { "user_id": "u-3", "email": "mallory@example.com", "public_key": "bm90IGEga2V5" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/org/org-1/keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let ceremony = KeyCeremony::new(session.api(), session.key_store());
    let outcomes = ceremony.grant_pending("org-1").await.unwrap();

    assert_eq!(outcomes.len(), 2);
    let bob = outcomes.iter().find(|o| o.user_id == "u-2").unwrap();
    let mallory = outcomes.iter().find(|o| o.user_id == "u-3").unwrap();
    assert!(bob.succeeded());
    assert!(!mallory.succeeded());
    assert!(mallory.error.as_deref().unwrap().contains("mallory@example.com"));
}

#[tokio::test]
async fn ceremony_requires_resident_org_key() {
    let server = MockServer::start().await;
    let session = test_session(&server);
    let ceremony = KeyCeremony::new(session.api(), session.key_store());
    let result = ceremony.grant_pending("org-1").await;
    assert!(matches!(
        result.unwrap_err(),
        ClientError::KeyNotAvailable(_)
    ));
}
