// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full draft stack over a temp SQLite database
//! and mock collaborators: a scripted model, an in-memory commerce store and
//! per-merchant mock mailboxes. Tests seed merchants through the helpers,
//! then drive [`DraftPipeline`] or [`PollScheduler`] directly.

use std::sync::Arc;

use draftline_agent::{ActionExecutor, DraftPipeline, ReplyGenerator};
use draftline_config::model::{PipelineConfig, StorageConfig};
use draftline_context::{ContextResolver, ContextSettings};
use draftline_core::types::{
    AutomationSettings, MailAccount, MailProviderKind, MerchantId, Persona, StoreCredentials,
};
use draftline_core::{CompletionAdapter, DraftlineError, EmbeddingAdapter, StorageAdapter};
use draftline_cron::{InProcessProcessor, PollScheduler, SchedulerSettings};
use draftline_storage::SqliteStorage;
use secrecy::SecretString;

use crate::mock_commerce::MockCommerce;
use crate::mock_mailbox::{MockConnector, MockMailbox};
use crate::mock_provider::MockModel;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    generation_model: bool,
    max_messages_per_run: usize,
    reconcile_outlook: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            generation_model: true,
            max_messages_per_run: 5,
            reconcile_outlook: false,
        }
    }

    /// Queue model completions, consumed in call order by the classifier
    /// and the generator.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Build the generator without a model, so every reply is the template.
    pub fn without_generation_model(mut self) -> Self {
        self.generation_model = false;
        self
    }

    pub fn with_max_messages_per_run(mut self, max: usize) -> Self {
        self.max_messages_per_run = max;
        self
    }

    pub fn with_outlook_reconciliation(mut self) -> Self {
        self.reconcile_outlook = true;
        self
    }

    /// Build the harness, creating every subsystem.
    pub async fn build(self) -> Result<TestHarness, DraftlineError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| DraftlineError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("draftline-test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let storage = Arc::new(storage);

        let model = Arc::new(MockModel::with_responses(self.responses));
        let commerce = Arc::new(MockCommerce::new());
        let connector = Arc::new(MockConnector::new());

        let pipeline_config = PipelineConfig::default();
        let completion = model.clone() as Arc<dyn CompletionAdapter>;
        let pipeline = Arc::new(DraftPipeline::new(
            draftline_triage::SupportClassifier::new(
                Some(completion.clone()),
                None,
                pipeline_config.classifier_body_chars,
            ),
            ContextResolver::new(
                commerce.clone(),
                storage.clone(),
                storage.clone(),
                storage.clone(),
                Some(model.clone() as Arc<dyn EmbeddingAdapter>),
                ContextSettings::from(&pipeline_config),
            ),
            ReplyGenerator::new(
                self.generation_model.then_some(completion),
                None,
                pipeline_config.generation_temperature,
                800,
            ),
            ActionExecutor::new(commerce.clone(), storage.clone()),
            storage.clone(),
            connector.clone(),
        ));

        let scheduler = Arc::new(PollScheduler::new(
            storage.clone(),
            storage.clone(),
            storage.clone(),
            storage.clone(),
            connector.clone(),
            Arc::new(InProcessProcessor::new(pipeline.clone())),
            SchedulerSettings {
                max_messages_per_run: self.max_messages_per_run,
                user_limit: None,
                reconcile_outlook: self.reconcile_outlook,
            },
        ));

        Ok(TestHarness {
            storage,
            model,
            commerce,
            connector,
            pipeline,
            scheduler,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock collaborators and temp storage.
pub struct TestHarness {
    /// SQLite storage (temp DB, removed on drop). Also serves as directory,
    /// credential vault, account store and product index.
    pub storage: Arc<SqliteStorage>,
    /// The scripted model behind classification, generation and embeddings.
    pub model: Arc<MockModel>,
    pub commerce: Arc<MockCommerce>,
    pub connector: Arc<MockConnector>,
    pub pipeline: Arc<DraftPipeline>,
    pub scheduler: Arc<PollScheduler>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Register a merchant with the given automation settings.
    pub async fn add_merchant(
        &self,
        id: &str,
        external_id: &str,
        settings: AutomationSettings,
    ) -> Result<MerchantId, DraftlineError> {
        let merchant = MerchantId(id.to_string());
        self.storage.upsert_merchant(&merchant, external_id).await?;
        self.storage.set_automation_settings(&merchant, settings).await?;
        Ok(merchant)
    }

    pub async fn set_signature(&self, merchant: &MerchantId, signature: &str) -> Result<(), DraftlineError> {
        self.storage
            .set_persona(
                merchant,
                &Persona {
                    signature: signature.to_string(),
                    ..Persona::default()
                },
            )
            .await
    }

    /// Link a mock mailbox: records the account and registers the mailbox
    /// with the connector.
    pub async fn link_mailbox(
        &self,
        merchant: &MerchantId,
        kind: MailProviderKind,
    ) -> Result<Arc<MockMailbox>, DraftlineError> {
        self.link_account(merchant, kind).await?;
        let mailbox = Arc::new(MockMailbox::new(kind));
        self.connector.register(merchant, mailbox.clone()).await;
        Ok(mailbox)
    }

    /// Record a linked account without a working mailbox behind it, as if
    /// its token could no longer be refreshed.
    pub async fn link_account(&self, merchant: &MerchantId, kind: MailProviderKind) -> Result<(), DraftlineError> {
        self.storage
            .upsert_mail_account(&MailAccount {
                merchant_id: merchant.clone(),
                provider: kind,
                email_address: format!("support@{merchant}.test"),
                access_token: None,
                refresh_token: Some(SecretString::from("refresh".to_string())),
                expires_at: None,
            })
            .await
    }

    /// Link a commerce store so order lookups and actions run.
    pub async fn link_store(&self, merchant: &MerchantId) -> Result<(), DraftlineError> {
        self.storage
            .set_store_credentials(
                merchant,
                &StoreCredentials {
                    shop_domain: format!("{merchant}.myshopify.com"),
                    access_token: SecretString::from("shpat_test".to_string()),
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftline_core::MerchantDirectory;

    #[tokio::test]
    async fn harness_seeds_an_eligible_merchant() {
        let harness = TestHarness::builder().build().await.unwrap();
        let merchant = harness
            .add_merchant(
                "m-1",
                "user_1",
                AutomationSettings {
                    auto_draft_enabled: true,
                    ..AutomationSettings::default()
                },
            )
            .await
            .unwrap();
        harness.link_mailbox(&merchant, MailProviderKind::Gmail).await.unwrap();

        let eligible = harness.storage.eligible_merchants(None).await.unwrap();
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].external_id, "user_1");
    }
}
