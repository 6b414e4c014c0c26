// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end handling of one inbound message.
//!
//! draft-exists check -> classify -> resolve context -> generate ->
//! execute actions -> write draft -> record draft.

use std::sync::Arc;

use chrono::Utc;
use draftline_context::ContextResolver;
use draftline_core::types::{
    ActionResult, Classification, DraftStatus, InboundMessage, MailProviderKind, MerchantId,
    TrackedDraft,
};
use draftline_core::{DraftStore, DraftlineError, MailConnector, MailProvider};
use draftline_triage::SupportClassifier;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::executor::ActionExecutor;
use crate::generator::ReplyGenerator;

/// How a message left the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Drafted,
    Rejected,
    AlreadyDrafted,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Drafted => "drafted",
            OutcomeStatus::Rejected => "rejected",
            OutcomeStatus::AlreadyDrafted => "already_drafted",
        }
    }
}

/// Result of processing one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOutcome {
    pub message_id: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    pub automation: Vec<ActionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    pub fallback: bool,
}

impl DraftOutcome {
    fn skipped(message_id: &str, status: OutcomeStatus, classification: Option<Classification>) -> Self {
        Self {
            message_id: message_id.to_string(),
            status,
            draft_id: None,
            reply: None,
            automation: Vec::new(),
            classification,
            fallback: false,
        }
    }
}

pub struct DraftPipeline {
    classifier: SupportClassifier,
    context: ContextResolver,
    generator: ReplyGenerator,
    executor: ActionExecutor,
    drafts: Arc<dyn DraftStore>,
    connector: Arc<dyn MailConnector>,
}

impl DraftPipeline {
    pub fn new(
        classifier: SupportClassifier,
        context: ContextResolver,
        generator: ReplyGenerator,
        executor: ActionExecutor,
        drafts: Arc<dyn DraftStore>,
        connector: Arc<dyn MailConnector>,
    ) -> Self {
        Self {
            classifier,
            context,
            generator,
            executor,
            drafts,
            connector,
        }
    }

    /// The connector used to open merchant mailboxes.
    pub fn connector(&self) -> &Arc<dyn MailConnector> {
        &self.connector
    }

    /// Connects to the merchant's mailbox, fetches `message_id` and processes it.
    pub async fn process_by_id(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
        message_id: &str,
    ) -> Result<DraftOutcome, DraftlineError> {
        let mailbox = self.connector.connect(merchant, provider).await?;
        let message = mailbox.fetch_full(message_id).await?;
        self.process(merchant, mailbox.as_ref(), &message).await
    }

    /// Runs the full pipeline for an already fetched message.
    ///
    /// Rejections and duplicates are normal outcomes. Errors are reserved for
    /// failures that left no draft behind: storage reads, draft creation.
    pub async fn process(
        &self,
        merchant: &MerchantId,
        mailbox: &dyn MailProvider,
        message: &InboundMessage,
    ) -> Result<DraftOutcome, DraftlineError> {
        let provider = mailbox.kind();

        if let Some(existing) = self
            .drafts
            .draft_for_message(merchant, provider, &message.id)
            .await?
        {
            debug!(
                merchant_id = %merchant,
                message_id = %message.id,
                draft_id = %existing.provider_draft_id,
                "draft already exists"
            );
            draftline_prometheus::record_message(OutcomeStatus::AlreadyDrafted.as_str());
            return Ok(DraftOutcome::skipped(&message.id, OutcomeStatus::AlreadyDrafted, None));
        }

        let classification = self.classifier.classify(message).await;
        if !classification.accept {
            info!(
                merchant_id = %merchant,
                provider = %provider,
                message_id = %message.id,
                reason = %classification.reason,
                "message rejected"
            );
            draftline_prometheus::record_message(OutcomeStatus::Rejected.as_str());
            return Ok(DraftOutcome::skipped(
                &message.id,
                OutcomeStatus::Rejected,
                Some(classification),
            ));
        }

        let ctx = self.context.resolve(merchant, message).await;
        let reply = self.generator.generate(message, &ctx).await;
        let automation = self
            .executor
            .execute(merchant, &ctx.profile.automation, &reply.actions)
            .await;

        let draft = match mailbox.create_draft_reply(message, &reply.text).await {
            Ok(draft) => draft,
            Err(e) => {
                warn!(
                    merchant_id = %merchant,
                    provider = %provider,
                    message_id = %message.id,
                    error = %e,
                    "draft creation failed"
                );
                draftline_prometheus::record_message("failed");
                return Err(e);
            }
        };

        let tracked = TrackedDraft {
            id: uuid::Uuid::new_v4().to_string(),
            merchant_id: merchant.clone(),
            provider,
            message_id: message.id.clone(),
            provider_draft_id: draft.provider_draft_id.clone(),
            thread_id: draft.thread_id.clone(),
            created_at: Utc::now(),
            status: DraftStatus::Pending,
        };
        if let Err(e) = self.drafts.record_draft(&tracked).await {
            // The provider draft exists; a lost record only weakens dedup and reconciliation.
            warn!(
                merchant_id = %merchant,
                message_id = %message.id,
                error = %e,
                "failed to record draft"
            );
        }

        info!(
            merchant_id = %merchant,
            provider = %provider,
            message_id = %message.id,
            draft_id = %draft.provider_draft_id,
            actions = automation.len(),
            fallback = reply.fallback,
            "draft created"
        );
        draftline_prometheus::record_message(OutcomeStatus::Drafted.as_str());

        Ok(DraftOutcome {
            message_id: message.id.clone(),
            status: OutcomeStatus::Drafted,
            draft_id: Some(draft.provider_draft_id),
            reply: Some(reply.text),
            automation,
            classification: Some(classification),
            fallback: reply.fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_camel_case() {
        let outcome = DraftOutcome {
            message_id: "m1".into(),
            status: OutcomeStatus::AlreadyDrafted,
            draft_id: None,
            reply: None,
            automation: vec![ActionResult::failure("add_note", "not permitted")],
            classification: None,
            fallback: false,
        };
        let value = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(value["messageId"], "m1");
        assert_eq!(value["status"], "already_drafted");
        assert_eq!(value["automation"][0]["type"], "add_note");
        assert!(value.get("draftId").is_none());
    }
}
