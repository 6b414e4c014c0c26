// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires configuration into the running pipeline.
//!
//! One SQLite storage instance backs every storage trait (directory,
//! credential vault, account store, product index, poll state, drafts).
//! The model provider is optional: without an API key the classifier rejects
//! anything the deterministic rules let through and the generator answers
//! with the template reply.

use std::sync::Arc;

use draftline_agent::{ActionExecutor, DraftPipeline, ReplyGenerator};
use draftline_config::model::DraftlineConfig;
use draftline_context::{ContextResolver, ContextSettings};
use draftline_core::error::DraftlineError;
use draftline_core::{CompletionAdapter, EmbeddingAdapter, MailConnector, PluginAdapter, StorageAdapter};
use draftline_cron::{
    HttpDraftClient, InProcessProcessor, MessageProcessor, PollScheduler, SchedulerSettings,
};
use draftline_mail::ProviderConnector;
use draftline_openai::OpenAiProvider;
use draftline_prometheus::PrometheusAdapter;
use draftline_shopify::ShopifyClient;
use draftline_storage::SqliteStorage;
use draftline_triage::SupportClassifier;
use tracing::{info, warn};

/// Everything a command needs, built once per process.
pub struct Runtime {
    pub storage: Arc<SqliteStorage>,
    pub pipeline: Arc<DraftPipeline>,
    pub scheduler: Arc<PollScheduler>,
    pub metrics: Option<PrometheusAdapter>,
    /// Long-lived adapters, storage first.
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
}

impl Runtime {
    /// Shuts every adapter down in order. Failures are logged and do not stop
    /// the remaining adapters; the first one is returned.
    pub async fn shutdown(&self) -> Result<(), DraftlineError> {
        let mut first_error = None;
        for adapter in &self.adapters {
            if let Err(e) = adapter.shutdown().await {
                warn!(adapter = adapter.name(), error = %e, "adapter shutdown failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Builds the runtime. `install_metrics` installs the global Prometheus
/// recorder; a failure there only disables `/metrics`.
pub async fn build_runtime(
    config: &DraftlineConfig,
    install_metrics: bool,
) -> Result<Runtime, DraftlineError> {
    let metrics = if install_metrics {
        match PrometheusAdapter::new() {
            Ok(adapter) => Some(adapter),
            Err(e) => {
                warn!(error = %e, "metrics disabled");
                None
            }
        }
    } else {
        None
    };

    let storage = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };
    info!(path = %config.storage.database_path, "storage initialized");

    let model = OpenAiProvider::from_config(&config.openai)?.map(Arc::new);
    let completion = model.clone().map(|m| m as Arc<dyn CompletionAdapter>);
    let embedder = model.clone().map(|m| m as Arc<dyn EmbeddingAdapter>);

    let mut adapters: Vec<Arc<dyn PluginAdapter>> = vec![storage.clone()];
    if let Some(model) = model {
        adapters.push(model);
    }
    if let Some(metrics) = &metrics {
        adapters.push(Arc::new(metrics.clone()));
    }

    let commerce = Arc::new(ShopifyClient::from_config(&config.shopify)?);
    let connector: Arc<dyn MailConnector> = Arc::new(ProviderConnector::new(
        config.gmail.clone(),
        config.outlook.clone(),
        storage.clone(),
    )?);

    let pipeline = Arc::new(DraftPipeline::new(
        SupportClassifier::from_config(completion.clone(), &config.openai, &config.pipeline),
        ContextResolver::new(
            commerce.clone(),
            storage.clone(),
            storage.clone(),
            storage.clone(),
            embedder,
            ContextSettings::from(&config.pipeline),
        ),
        ReplyGenerator::from_config(completion, &config.openai, &config.pipeline),
        ActionExecutor::new(commerce, storage.clone()),
        storage.clone(),
        connector.clone(),
    ));

    let processor: Arc<dyn MessageProcessor> = match &config.scheduler.draft_endpoint {
        Some(endpoint) => {
            info!(%endpoint, "messages are handed to the draft service over HTTP");
            Arc::new(HttpDraftClient::new(
                endpoint.clone(),
                config.gateway.internal_secret.clone(),
            )?)
        }
        None => Arc::new(InProcessProcessor::new(pipeline.clone())),
    };

    let scheduler = Arc::new(PollScheduler::new(
        storage.clone(),
        storage.clone(),
        storage.clone(),
        storage.clone(),
        connector,
        processor,
        SchedulerSettings::from_config(&config.scheduler, &config.outlook),
    ));

    Ok(Runtime {
        storage,
        pipeline,
        scheduler,
        metrics,
        adapters,
    })
}
