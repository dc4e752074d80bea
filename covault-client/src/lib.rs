//! Zero-knowledge client core for Covault.
//!
//! Everything above the crypto layer and below the UI:
//! - HTTP client for the vault API (auth, key exchange, items)
//! - In-memory key store with a strict non-persistence invariant
//! - Registration, login, password-change and password-reset flows
//! - Organization key ceremony for newly invited members
//! - Legacy-to-zero-knowledge item migration

pub mod api_client;
pub mod ceremony;
pub mod config;
pub mod error;
pub mod keystore;
pub mod migration;
pub mod session;
pub mod types;

pub use api_client::VaultApiClient;
pub use ceremony::{GrantOutcome, KeyCeremony};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use keystore::KeyStore;
pub use migration::{MigrationReport, Migrator};
pub use session::{Registration, Session};
pub use types::*;
