//! Legacy-to-zero-knowledge item migration.
//!
//! Older accounts hold items the server encrypted on their behalf
//! (`encryption_version == 1`). Migration walks those items, encrypts their
//! sensitive fields under the resident org key, and resubmits them marked
//! version 2. Items are independent: one failure is logged and counted, the
//! walk continues.

use crate::api_client::VaultApiClient;
use crate::error::{ClientError, ClientResult};
use crate::keystore::KeyStore;
use crate::types::{Item, ItemUpdate, MigrationStatus, ENCRYPTION_LEGACY, ENCRYPTION_ZERO_KNOWLEDGE};
use covault_crypto::{encrypt_string, OrgKey};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

const PAGE_SIZE: u32 = 100;

/// Tally of a migration run.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub migrated: u64,
    pub failed: u64,
}

/// Drives legacy items onto the zero-knowledge scheme.
pub struct Migrator {
    api: Arc<VaultApiClient>,
    keys: Arc<KeyStore>,
}

impl Migrator {
    pub fn new(api: Arc<VaultApiClient>, keys: Arc<KeyStore>) -> Self {
        Self { api, keys }
    }

    /// Server-side counts of legacy vs migrated items and files.
    pub async fn status(&self) -> ClientResult<MigrationStatus> {
        self.api.migration_status().await
    }

    /// Migrates every legacy item reachable through the item listing,
    /// archived ones included. Requires the org key for `org_id` to be
    /// resident.
    pub async fn migrate_items(&self, org_id: &str) -> ClientResult<MigrationReport> {
        let org_key = self.keys.org_key(org_id).await?;
        let mut report = MigrationReport::default();
        let mut page = 1;

        loop {
            let listing = self.api.list_items(page, PAGE_SIZE, true).await?;
            if listing.items.is_empty() {
                break;
            }
            let last_page = (listing.page as u64 * listing.limit as u64) >= listing.total;

            for item in &listing.items {
                if item.encryption_version != ENCRYPTION_LEGACY {
                    continue;
                }
                match self.migrate_one(item, &org_key).await {
                    Ok(()) => report.migrated += 1,
                    // Losing the session mid-run stops the whole walk; any
                    // other error is scoped to the one item.
                    Err(ClientError::AuthRequired) => return Err(ClientError::AuthRequired),
                    Err(e) => {
                        warn!("item {} migration failed: {e}", item.id);
                        report.failed += 1;
                    }
                }
            }

            if last_page {
                break;
            }
            page += 1;
        }

        info!(
            "item migration: {} migrated, {} failed",
            report.migrated, report.failed
        );
        Ok(report)
    }

    /// Encrypts the item's string field values and notes, then resubmits it
    /// as version 2. Non-string field values pass through unchanged.
    async fn migrate_one(&self, item: &Item, org_key: &OrgKey) -> ClientResult<()> {
        let mut fields = BTreeMap::new();
        for (name, value) in &item.fields {
            let migrated = match value {
                serde_json::Value::String(s) => {
                    serde_json::Value::String(encrypt_string(s, org_key)?)
                }
                other => other.clone(),
            };
            fields.insert(name.clone(), migrated);
        }

        let notes = match &item.notes {
            Some(n) if !n.is_empty() => Some(encrypt_string(n, org_key)?),
            _ => None,
        };

        self.api
            .update_item(
                &item.id,
                &ItemUpdate {
                    notes,
                    fields: Some(fields),
                    encryption_version: Some(ENCRYPTION_ZERO_KNOWLEDGE),
                },
            )
            .await
            .map(|_| ())
    }
}
