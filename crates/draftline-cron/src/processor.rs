// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Where the scheduler sends each fetched message: the in-process pipeline
//! or a remote draft endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use draftline_agent::{DraftPipeline, OutcomeStatus};
use draftline_core::types::{InboundMessage, Merchant};
use draftline_core::{DraftlineError, MailProvider};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Short account of what happened to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedMessage {
    pub message_id: String,
    /// `drafted`, `rejected` or `already_drafted`.
    pub status: String,
    pub draft_id: Option<String>,
}

/// Runs one message through the draft pipeline.
#[async_trait]
pub trait MessageProcessor: Send + Sync {
    async fn process(
        &self,
        merchant: &Merchant,
        mailbox: &dyn MailProvider,
        message: &InboundMessage,
    ) -> Result<ProcessedMessage, DraftlineError>;
}

/// Processes messages with a [`DraftPipeline`] in this process.
pub struct InProcessProcessor {
    pipeline: Arc<DraftPipeline>,
}

impl InProcessProcessor {
    pub fn new(pipeline: Arc<DraftPipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl MessageProcessor for InProcessProcessor {
    async fn process(
        &self,
        merchant: &Merchant,
        mailbox: &dyn MailProvider,
        message: &InboundMessage,
    ) -> Result<ProcessedMessage, DraftlineError> {
        let outcome = self.pipeline.process(&merchant.id, mailbox, message).await?;
        Ok(ProcessedMessage {
            message_id: outcome.message_id,
            status: outcome.status.as_str().to_string(),
            draft_id: outcome.draft_id,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DraftResponse {
    status: Option<String>,
    draft_id: Option<String>,
    error: Option<String>,
}

/// Posts each message id to a remote `/v1/drafts` endpoint, which fetches
/// and processes it itself.
pub struct HttpDraftClient {
    http: reqwest::Client,
    endpoint: String,
    secret: Option<String>,
}

impl HttpDraftClient {
    pub fn new(endpoint: impl Into<String>, secret: Option<String>) -> Result<Self, DraftlineError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| DraftlineError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            secret,
        })
    }
}

#[async_trait]
impl MessageProcessor for HttpDraftClient {
    async fn process(
        &self,
        merchant: &Merchant,
        mailbox: &dyn MailProvider,
        message: &InboundMessage,
    ) -> Result<ProcessedMessage, DraftlineError> {
        let mut request = self.http.post(&self.endpoint).json(&json!({
            "clerkUserId": merchant.external_id,
            "messageId": message.id,
            "provider": mailbox.kind().as_str(),
        }));
        if let Some(secret) = &self.secret {
            request = request.header("x-internal-secret", secret);
        }

        let response = request.send().await.map_err(|e| DraftlineError::Mail {
            message: format!("draft endpoint unreachable: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })?;
        let status = response.status().as_u16();
        let body: DraftResponse = response.json().await.unwrap_or_default();
        debug!(merchant_id = %merchant.id, message_id = %message.id, status, "draft endpoint answered");

        if !(200..300).contains(&status) {
            let detail = body.error.unwrap_or_else(|| format!("status {status}"));
            return Err(match status {
                400 => DraftlineError::Validation(detail),
                401 | 403 => DraftlineError::Permission(detail),
                404 => DraftlineError::NotFound(detail),
                _ => DraftlineError::Mail {
                    message: format!("draft endpoint failed: {detail}"),
                    status: Some(status),
                    source: None,
                },
            });
        }

        Ok(ProcessedMessage {
            message_id: message.id.clone(),
            status: body
                .status
                .unwrap_or_else(|| OutcomeStatus::Drafted.as_str().to_string()),
            draft_id: body.draft_id,
        })
    }
}
