// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the adapter traits and pipeline stages.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Internal merchant account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerchantId(pub String);

impl std::fmt::Display for MerchantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A merchant as seen by the pipeline: internal id plus the external identity
/// the trigger surface addresses it by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: MerchantId,
    pub external_id: String,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Completion,
    Embedding,
    Storage,
    Observability,
}

/// Supported mail providers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum MailProviderKind {
    Gmail,
    Outlook,
}

impl MailProviderKind {
    /// Stable lowercase name used in storage rows and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            MailProviderKind::Gmail => "gmail",
            MailProviderKind::Outlook => "outlook",
        }
    }
}

// --- Mail types ---

/// The boundary below which messages count as already processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    pub message_id: String,
    pub received_at: DateTime<Utc>,
}

/// Persisted polling position for one (merchant, provider) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollState {
    pub merchant_id: MerchantId,
    pub provider: MailProviderKind,
    pub last_message_id: Option<String>,
    pub last_received_at: Option<DateTime<Utc>>,
}

impl PollState {
    /// An empty state for a pair that has never been polled.
    pub fn empty(merchant_id: MerchantId, provider: MailProviderKind) -> Self {
        Self {
            merchant_id,
            provider,
            last_message_id: None,
            last_received_at: None,
        }
    }

    /// The stored watermark, if one has been recorded.
    pub fn watermark(&self) -> Option<Watermark> {
        match (&self.last_message_id, self.last_received_at) {
            (Some(id), Some(at)) => Some(Watermark {
                message_id: id.clone(),
                received_at: at,
            }),
            (None, Some(at)) => Some(Watermark {
                message_id: String::new(),
                received_at: at,
            }),
            _ => None,
        }
    }
}

/// Listing-time view of an inbox message, before the body is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMeta {
    pub id: String,
    pub thread_id: String,
    pub sender_email: String,
    pub subject: String,
    pub received_at: DateTime<Utc>,
}

/// A fully fetched inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Provider message id.
    pub id: String,
    /// Provider thread / conversation id.
    pub thread_id: String,
    /// RFC 822 `Message-ID` header, used for reply threading.
    pub rfc822_message_id: Option<String>,
    pub sender_email: String,
    pub sender_name: Option<String>,
    pub subject: String,
    /// Plain-text body (HTML already converted).
    pub body: String,
    pub received_at: DateTime<Utc>,
    /// Whether a `List-Unsubscribe` header was present.
    pub list_unsubscribe: bool,
}

/// Handle to a provider-side draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRef {
    pub provider_draft_id: String,
    pub thread_id: String,
}

/// Local status of a tracked draft.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    Pending,
    Sent,
}

/// Local record of a draft the pipeline created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedDraft {
    pub id: String,
    pub merchant_id: MerchantId,
    pub provider: MailProviderKind,
    /// Inbound message the draft replies to.
    pub message_id: String,
    pub provider_draft_id: String,
    pub thread_id: String,
    pub created_at: DateTime<Utc>,
    pub status: DraftStatus,
}

impl TrackedDraft {
    pub fn draft_ref(&self) -> DraftRef {
        DraftRef {
            provider_draft_id: self.provider_draft_id.clone(),
            thread_id: self.thread_id.clone(),
        }
    }
}

/// OAuth state for one linked mailbox.
#[derive(Debug, Clone)]
pub struct MailAccount {
    pub merchant_id: MerchantId,
    pub provider: MailProviderKind,
    pub email_address: String,
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
}

// --- Merchant configuration ---

/// Merchant voice for generated replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub signature: String,
    pub tone_instructions: String,
    pub example_scenario: String,
}

/// Merchant-configured automation permissions. Everything defaults to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationSettings {
    pub order_updates: bool,
    pub cancel_orders: bool,
    pub auto_refunds: bool,
    pub use_history_as_training: bool,
    pub auto_draft_enabled: bool,
}

/// Merchant-authored policy text, injected verbatim into prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocuments {
    pub refund: String,
    pub shipping: String,
    pub terms: String,
    pub tone_notes: String,
}

impl PolicyDocuments {
    pub fn is_empty(&self) -> bool {
        self.refund.trim().is_empty()
            && self.shipping.trim().is_empty()
            && self.terms.trim().is_empty()
            && self.tone_notes.trim().is_empty()
    }
}

/// Commerce store credentials. The token never appears in `Debug` output.
#[derive(Debug, Clone)]
pub struct StoreCredentials {
    pub shop_domain: String,
    pub access_token: SecretString,
}

// --- Commerce types ---

/// Postal address on an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
}

impl Address {
    /// Single-line rendering, skipping empty parts.
    pub fn one_line(&self) -> String {
        [
            &self.name,
            &self.address1,
            &self.address2,
            &self.zip,
            &self.city,
            &self.province,
            &self.country,
        ]
        .iter()
        .filter_map(|part| part.as_deref())
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }

    pub fn is_empty(&self) -> bool {
        self.one_line().is_empty()
    }
}

/// One line item on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub title: String,
    pub quantity: i64,
}

/// Read-only view of a commerce order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Human order name, e.g. `#8921`.
    pub name: String,
    pub order_number: Option<i64>,
    pub legacy_number: Option<String>,
    pub email: Option<String>,
    pub customer_email: Option<String>,
    pub billing_email: Option<String>,
    pub shipping_email: Option<String>,
    pub fulfillment_status: Option<String>,
    pub financial_status: Option<String>,
    pub shipping_address: Option<Address>,
    pub line_items: Vec<LineItem>,
    pub total_price: String,
    pub currency: Option<String>,
}

impl Order {
    /// Every email address attached to the order.
    pub fn emails(&self) -> impl Iterator<Item = &str> {
        [
            &self.email,
            &self.customer_email,
            &self.billing_email,
            &self.shipping_email,
        ]
        .into_iter()
        .filter_map(|e| e.as_deref())
    }

    /// Status line used in prompts and fallback replies.
    ///
    /// A missing fulfillment status means nothing has shipped yet.
    pub fn status_label(&self) -> String {
        let fulfillment = self
            .fulfillment_status
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("unfulfilled");
        match self.financial_status.as_deref().filter(|s| !s.is_empty()) {
            Some(financial) => format!("{fulfillment} / {financial}"),
            None => fulfillment.to_string(),
        }
    }

    /// The order number as the customer knows it, without the leading `#`.
    pub fn display_number(&self) -> String {
        let trimmed = self.name.trim().trim_start_matches('#');
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
        self.order_number
            .map(|n| n.to_string())
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// A product retrieved from the merchant's catalog index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub price: Option<String>,
    pub description: String,
}

/// A product with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMatch {
    pub product: Product,
    pub score: f32,
}

// --- Actions ---

/// The fixed set of store mutations the model may propose.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    UpdateShippingAddress,
    CancelOrder,
    AddNote,
    AddTag,
}

/// A model-proposed action, validated on receipt.
///
/// `Rejected` keeps a proposal that failed validation in the batch so the
/// result list stays aligned with what the model asked for; it is never
/// executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposedAction {
    UpdateShippingAddress { order_id: i64, address: Address },
    CancelOrder { order_id: i64, reason: Option<String> },
    AddNote { order_id: i64, note: String },
    AddTag { order_id: i64, tag: String },
    Rejected { kind: String, reason: String },
}

impl ProposedAction {
    /// The action kind, or `None` for rejected proposals.
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            ProposedAction::UpdateShippingAddress { .. } => Some(ActionKind::UpdateShippingAddress),
            ProposedAction::CancelOrder { .. } => Some(ActionKind::CancelOrder),
            ProposedAction::AddNote { .. } => Some(ActionKind::AddNote),
            ProposedAction::AddTag { .. } => Some(ActionKind::AddTag),
            ProposedAction::Rejected { .. } => None,
        }
    }

    /// The `type` string reported in results.
    pub fn type_name(&self) -> String {
        match self {
            ProposedAction::Rejected { kind, .. } => kind.clone(),
            other => other
                .kind()
                .map(|k| k.to_string())
                .unwrap_or_default(),
        }
    }

    pub fn order_id(&self) -> Option<i64> {
        match self {
            ProposedAction::UpdateShippingAddress { order_id, .. }
            | ProposedAction::CancelOrder { order_id, .. }
            | ProposedAction::AddNote { order_id, .. }
            | ProposedAction::AddTag { order_id, .. } => Some(*order_id),
            ProposedAction::Rejected { .. } => None,
        }
    }
}

/// Outcome of attempting one proposed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(rename = "type")]
    pub kind: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn success(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ok: true,
            error: None,
        }
    }

    pub fn failure(kind: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ok: false,
            error: Some(error.into()),
        }
    }
}

// --- Classification ---

/// Category buckets the classification model may return.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum MessageCategory {
    Support,
    Spam,
    Notification,
}

/// Classifier verdict for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub accept: bool,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<MessageCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Classification {
    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            accept: false,
            reason: reason.into(),
            category: None,
            explanation: None,
        }
    }
}

// --- Completion types ---

/// Strict JSON schema constraint for structured completions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub schema: serde_json::Value,
}

/// A single chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model override; the adapter's default model is used when `None`.
    pub model: Option<String>,
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub response_format: Option<JsonSchemaFormat>,
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// The provider's reply to a [`CompletionRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
}

/// Input for an embedding adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Output from an embedding adapter, one vector per input text.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingOutput {
    pub embeddings: Vec<Vec<f32>>,
}
