// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Draftline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Draftline configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DraftlineConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP trigger surface.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// OpenAI-compatible model API.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Gmail API and OAuth client.
    #[serde(default)]
    pub gmail: GmailConfig,

    /// Microsoft Graph (Outlook) API and OAuth client.
    #[serde(default)]
    pub outlook: OutlookConfig,

    /// Shopify Admin API.
    #[serde(default)]
    pub shopify: ShopifyConfig,

    /// Triage, context and generation tuning.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Poll scheduler settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

fn redacted(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "[redacted]")
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Service name reported in logs and health output.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "draftline".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("draftline").join("draftline.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("draftline.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP trigger surface configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret expected in `x-cron-secret` on poll triggers.
    #[serde(default)]
    pub cron_secret: Option<String>,

    /// Shared secret expected in `x-internal-secret` on poll and draft calls.
    #[serde(default)]
    pub internal_secret: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cron_secret: None,
            internal_secret: None,
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cron_secret", &redacted(&self.cron_secret))
            .field("internal_secret", &redacted(&self.internal_secret))
            .finish()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

/// OpenAI-compatible model API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` falls back to `OPENAI_API_KEY`; with neither, model
    /// calls are disabled and the pipeline uses deterministic fallbacks.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL (without the `/chat/completions` suffix).
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model used for reply generation.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used for the classifier fallback.
    #[serde(default = "default_classify_model")]
    pub classify_model: String,

    /// Model used for product embeddings.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            chat_model: default_chat_model(),
            classify_model: default_classify_model(),
            embedding_model: default_embedding_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("classify_model", &self.classify_model)
            .field("embedding_model", &self.embedding_model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_classify_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_max_tokens() -> u32 {
    1200
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// Gmail API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GmailConfig {
    /// OAuth client id used for token refresh.
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth client secret used for token refresh.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// OAuth token endpoint.
    #[serde(default = "default_gmail_token_url")]
    pub token_url: String,

    /// Gmail REST base URL.
    #[serde(default = "default_gmail_api_base")]
    pub api_base: String,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_url: default_gmail_token_url(),
            api_base: default_gmail_api_base(),
        }
    }
}

impl std::fmt::Debug for GmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GmailConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &redacted(&self.client_secret))
            .field("token_url", &self.token_url)
            .field("api_base", &self.api_base)
            .finish()
    }
}

fn default_gmail_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_gmail_api_base() -> String {
    "https://gmail.googleapis.com/gmail/v1/users/me".to_string()
}

/// Microsoft Graph mail configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutlookConfig {
    /// OAuth client id used for token refresh.
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth client secret used for token refresh.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// OAuth token endpoint.
    #[serde(default = "default_outlook_token_url")]
    pub token_url: String,

    /// Graph REST base URL.
    #[serde(default = "default_outlook_api_base")]
    pub api_base: String,

    /// Reconcile pending Outlook drafts against Graph before each poll.
    #[serde(default)]
    pub reconcile_drafts: bool,
}

impl Default for OutlookConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_url: default_outlook_token_url(),
            api_base: default_outlook_api_base(),
            reconcile_drafts: false,
        }
    }
}

impl std::fmt::Debug for OutlookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlookConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &redacted(&self.client_secret))
            .field("token_url", &self.token_url)
            .field("api_base", &self.api_base)
            .field("reconcile_drafts", &self.reconcile_drafts)
            .finish()
    }
}

fn default_outlook_token_url() -> String {
    "https://login.microsoftonline.com/common/oauth2/v2.0/token".to_string()
}

fn default_outlook_api_base() -> String {
    "https://graph.microsoft.com/v1.0/me".to_string()
}

/// Shopify Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ShopifyConfig {
    /// Admin REST API version segment.
    #[serde(default = "default_shopify_api_version")]
    pub api_version: String,

    /// URL scheme for shop domains (`https`; tests point this at `http`).
    #[serde(default = "default_shopify_scheme")]
    pub scheme: String,
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            api_version: default_shopify_api_version(),
            scheme: default_shopify_scheme(),
        }
    }
}

fn default_shopify_api_version() -> String {
    "2024-10".to_string()
}

fn default_shopify_scheme() -> String {
    "https".to_string()
}

/// Triage, context and generation tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Body characters sent to the classification model.
    #[serde(default = "default_classifier_body_chars")]
    pub classifier_body_chars: usize,

    /// Orders fetched when matching by exact email.
    #[serde(default = "default_order_lookup_limit")]
    pub order_lookup_limit: usize,

    /// Unfiltered orders sampled for client-side email matching.
    #[serde(default = "default_order_sample_size")]
    pub order_sample_size: usize,

    /// Products included in the prompt.
    #[serde(default = "default_product_top_k")]
    pub product_top_k: usize,

    /// Minimum cosine similarity for a product match.
    #[serde(default = "default_product_min_score")]
    pub product_min_score: f32,

    /// Sampling temperature for reply generation.
    #[serde(default = "default_generation_temperature")]
    pub generation_temperature: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            classifier_body_chars: default_classifier_body_chars(),
            order_lookup_limit: default_order_lookup_limit(),
            order_sample_size: default_order_sample_size(),
            product_top_k: default_product_top_k(),
            product_min_score: default_product_min_score(),
            generation_temperature: default_generation_temperature(),
        }
    }
}

fn default_classifier_body_chars() -> usize {
    500
}

fn default_order_lookup_limit() -> usize {
    10
}

fn default_order_sample_size() -> usize {
    50
}

fn default_product_top_k() -> usize {
    5
}

fn default_product_min_score() -> f32 {
    0.3
}

fn default_generation_temperature() -> f32 {
    0.2
}

/// Poll scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Messages run through the pipeline per merchant per provider per run.
    #[serde(default = "default_max_messages_per_run")]
    pub max_messages_per_run: usize,

    /// Cap on merchants considered per run when the trigger gives no limit.
    #[serde(default)]
    pub user_limit: Option<usize>,

    /// Cron expression for the in-process poller started by `serve`.
    /// `None` leaves polling to an external trigger.
    #[serde(default)]
    pub cron: Option<String>,

    /// Remote draft endpoint. When set, the scheduler posts each message to it
    /// instead of running the pipeline in process.
    #[serde(default)]
    pub draft_endpoint: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_messages_per_run: default_max_messages_per_run(),
            user_limit: None,
            cron: None,
            draft_endpoint: None,
        }
    }
}

fn default_max_messages_per_run() -> usize {
    5
}
