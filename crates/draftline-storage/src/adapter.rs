// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of every storage-backed trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use draftline_config::model::StorageConfig;
use draftline_core::types::{
    AutomationSettings, DraftStatus, MailAccount, MailProviderKind, Merchant, MerchantId,
    PolicyDocuments, Persona, PollState, Product, ProductMatch, StoreCredentials, TrackedDraft,
    Watermark,
};
use draftline_core::{
    AdapterType, CredentialVault, DraftStore, DraftlineError, HealthStatus, MailAccountStore,
    MerchantDirectory, PluginAdapter, PollStateStore, ProductIndex, StorageAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage.
///
/// The database is opened by [`StorageAdapter::initialize`]; every other
/// call fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open an initialized in-memory store.
    pub async fn in_memory() -> Result<Self, DraftlineError> {
        let storage = Self::new(StorageConfig {
            database_path: ":memory:".into(),
            wal_mode: false,
        });
        let db = Database::open_in_memory().await?;
        storage.db.set(db).map_err(|_| DraftlineError::Storage {
            source: "storage already initialized".into(),
        })?;
        Ok(storage)
    }

    fn db(&self) -> Result<&Database, DraftlineError> {
        self.db.get().ok_or_else(|| DraftlineError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(&self, db: &Database) -> Result<(), DraftlineError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    // --- Merchant administration ---

    pub async fn upsert_merchant(
        &self,
        id: &MerchantId,
        external_id: &str,
    ) -> Result<Merchant, DraftlineError> {
        queries::merchants::upsert(self.db()?, id, external_id).await
    }

    pub async fn set_persona(&self, merchant: &MerchantId, persona: &Persona) -> Result<(), DraftlineError> {
        queries::merchants::set_persona(self.db()?, merchant, persona).await
    }

    pub async fn set_automation_settings(
        &self,
        merchant: &MerchantId,
        settings: AutomationSettings,
    ) -> Result<(), DraftlineError> {
        queries::merchants::set_automation(self.db()?, merchant, settings).await
    }

    pub async fn set_policies(
        &self,
        merchant: &MerchantId,
        docs: &PolicyDocuments,
    ) -> Result<(), DraftlineError> {
        queries::merchants::set_policies(self.db()?, merchant, docs).await
    }

    pub async fn upsert_mail_account(&self, account: &MailAccount) -> Result<(), DraftlineError> {
        queries::accounts::upsert_mail_account(self.db()?, account).await
    }

    pub async fn set_store_credentials(
        &self,
        merchant: &MerchantId,
        creds: &StoreCredentials,
    ) -> Result<(), DraftlineError> {
        queries::accounts::set_store_credentials(self.db()?, merchant, creds).await
    }

    pub async fn upsert_product(
        &self,
        merchant: &MerchantId,
        product: &Product,
        embedding: &[f32],
    ) -> Result<(), DraftlineError> {
        queries::products::upsert(self.db()?, merchant, product, embedding).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, DraftlineError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DraftlineError> {
        if let Some(db) = self.db.get() {
            self.checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), DraftlineError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| DraftlineError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), DraftlineError> {
        let db = self.db()?;
        self.checkpoint(db).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl PollStateStore for SqliteStorage {
    async fn poll_state(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
    ) -> Result<PollState, DraftlineError> {
        queries::poll_state::get(self.db()?, merchant, provider).await
    }

    async fn advance_watermark(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
        watermark: &Watermark,
    ) -> Result<(), DraftlineError> {
        let moved = queries::poll_state::advance(self.db()?, merchant, provider, watermark).await?;
        if !moved {
            debug!(
                merchant_id = %merchant,
                provider = provider.as_str(),
                "stale watermark ignored"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl DraftStore for SqliteStorage {
    async fn record_draft(&self, draft: &TrackedDraft) -> Result<(), DraftlineError> {
        queries::drafts::insert(self.db()?, draft).await
    }

    async fn draft_for_message(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
        message_id: &str,
    ) -> Result<Option<TrackedDraft>, DraftlineError> {
        queries::drafts::for_message(self.db()?, merchant, provider, message_id).await
    }

    async fn pending_drafts(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
    ) -> Result<Vec<TrackedDraft>, DraftlineError> {
        queries::drafts::pending(self.db()?, merchant, provider).await
    }

    async fn set_draft_status(&self, id: &str, status: DraftStatus) -> Result<(), DraftlineError> {
        queries::drafts::set_status(self.db()?, id, status).await
    }
}

#[async_trait]
impl MerchantDirectory for SqliteStorage {
    async fn resolve_merchant(&self, external_id: &str) -> Result<Option<Merchant>, DraftlineError> {
        queries::merchants::by_external_id(self.db()?, external_id).await
    }

    async fn eligible_merchants(&self, limit: Option<usize>) -> Result<Vec<Merchant>, DraftlineError> {
        queries::merchants::eligible(self.db()?, limit).await
    }

    async fn persona(&self, merchant: &MerchantId) -> Result<Option<Persona>, DraftlineError> {
        queries::merchants::persona(self.db()?, merchant).await
    }

    async fn automation_settings(
        &self,
        merchant: &MerchantId,
    ) -> Result<Option<AutomationSettings>, DraftlineError> {
        queries::merchants::automation(self.db()?, merchant).await
    }

    async fn policies(&self, merchant: &MerchantId) -> Result<Option<PolicyDocuments>, DraftlineError> {
        queries::merchants::policies(self.db()?, merchant).await
    }
}

#[async_trait]
impl CredentialVault for SqliteStorage {
    async fn store_credentials(
        &self,
        merchant: &MerchantId,
    ) -> Result<Option<StoreCredentials>, DraftlineError> {
        queries::accounts::store_credentials(self.db()?, merchant).await
    }
}

#[async_trait]
impl MailAccountStore for SqliteStorage {
    async fn mail_account(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
    ) -> Result<Option<MailAccount>, DraftlineError> {
        queries::accounts::mail_account(self.db()?, merchant, provider).await
    }

    async fn linked_providers(&self, merchant: &MerchantId) -> Result<Vec<MailProviderKind>, DraftlineError> {
        queries::accounts::linked_providers(self.db()?, merchant).await
    }

    async fn update_tokens(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DraftlineError> {
        queries::accounts::update_tokens(
            self.db()?,
            merchant,
            provider,
            access_token,
            refresh_token,
            expires_at,
        )
        .await
    }
}

#[async_trait]
impl ProductIndex for SqliteStorage {
    async fn search(
        &self,
        merchant: &MerchantId,
        embedding: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<ProductMatch>, DraftlineError> {
        queries::products::search(self.db()?, merchant, embedding, top_k, min_score).await
    }
}
