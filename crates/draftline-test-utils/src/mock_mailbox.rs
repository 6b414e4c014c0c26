// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock mailbox for deterministic testing.
//!
//! `MockMailbox` implements `MailProvider` over an in-memory inbox and
//! captures every draft written, so tests can assert on reply bodies and
//! threading. `MockConnector` hands out registered mailboxes per merchant.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use draftline_core::traits::mail::{MailConnector, MailProvider};
use draftline_core::types::{
    DraftRef, InboundMessage, MailProviderKind, MerchantId, MessageMeta, Watermark,
};
use draftline_core::DraftlineError;

/// A draft captured by [`MockMailbox::create_draft_reply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenDraft {
    pub message_id: String,
    pub thread_id: String,
    pub body: String,
    pub draft: DraftRef,
}

/// An in-memory mailbox.
pub struct MockMailbox {
    kind: MailProviderKind,
    inbox: Mutex<Vec<InboundMessage>>,
    drafts: Mutex<Vec<WrittenDraft>>,
    failing_fetches: Mutex<HashSet<String>>,
    fail_listing: Mutex<bool>,
    draft_probe: Mutex<HashMap<String, Option<bool>>>,
    thread_probe: Mutex<HashMap<String, Option<bool>>>,
    fetch_calls: Mutex<Vec<String>>,
}

impl MockMailbox {
    pub fn new(kind: MailProviderKind) -> Self {
        Self {
            kind,
            inbox: Mutex::new(Vec::new()),
            drafts: Mutex::new(Vec::new()),
            failing_fetches: Mutex::new(HashSet::new()),
            fail_listing: Mutex::new(false),
            draft_probe: Mutex::new(HashMap::new()),
            thread_probe: Mutex::new(HashMap::new()),
            fetch_calls: Mutex::new(Vec::new()),
        }
    }

    /// Deliver a message into the inbox.
    pub async fn deliver(&self, message: InboundMessage) {
        self.inbox.lock().await.push(message);
    }

    /// Make `fetch_full` fail with a transient 503 for this message.
    pub async fn fail_fetch(&self, message_id: &str) {
        self.failing_fetches.lock().await.insert(message_id.to_string());
    }

    pub async fn heal_fetch(&self, message_id: &str) {
        self.failing_fetches.lock().await.remove(message_id);
    }

    pub async fn fail_listing(&self, fail: bool) {
        *self.fail_listing.lock().await = fail;
    }

    /// Answer for `draft_still_pending` on this provider draft id.
    /// Unset drafts report `Some(true)`.
    pub async fn set_draft_probe(&self, provider_draft_id: &str, answer: Option<bool>) {
        self.draft_probe
            .lock()
            .await
            .insert(provider_draft_id.to_string(), answer);
    }

    /// Answer for `thread_sent_since` on this thread. Unset threads report `Some(false)`.
    pub async fn set_thread_probe(&self, thread_id: &str, answer: Option<bool>) {
        self.thread_probe.lock().await.insert(thread_id.to_string(), answer);
    }

    pub async fn drafts(&self) -> Vec<WrittenDraft> {
        self.drafts.lock().await.clone()
    }

    pub async fn draft_count(&self) -> usize {
        self.drafts.lock().await.len()
    }

    /// Message ids passed to `fetch_full`, in call order.
    pub async fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.lock().await.clone()
    }
}

fn newer_than(message: &InboundMessage, since: Option<&Watermark>) -> bool {
    match since {
        None => true,
        Some(wm) => {
            message.received_at > wm.received_at
                || (message.received_at == wm.received_at && message.id != wm.message_id)
        }
    }
}

#[async_trait]
impl MailProvider for MockMailbox {
    fn kind(&self) -> MailProviderKind {
        self.kind
    }

    async fn list_candidates(
        &self,
        since: Option<&Watermark>,
        limit: usize,
    ) -> Result<Vec<MessageMeta>, DraftlineError> {
        if *self.fail_listing.lock().await {
            return Err(DraftlineError::Mail {
                message: "mock listing failure".into(),
                status: Some(503),
                source: None,
            });
        }
        let mut listed: Vec<MessageMeta> = self
            .inbox
            .lock()
            .await
            .iter()
            .filter(|m| newer_than(m, since))
            .map(|m| MessageMeta {
                id: m.id.clone(),
                thread_id: m.thread_id.clone(),
                sender_email: m.sender_email.clone(),
                subject: m.subject.clone(),
                received_at: m.received_at,
            })
            .collect();
        listed.sort_by(|a, b| a.received_at.cmp(&b.received_at).then_with(|| a.id.cmp(&b.id)));
        listed.truncate(limit);
        Ok(listed)
    }

    async fn fetch_full(&self, message_id: &str) -> Result<InboundMessage, DraftlineError> {
        self.fetch_calls.lock().await.push(message_id.to_string());
        if self.failing_fetches.lock().await.contains(message_id) {
            return Err(DraftlineError::Mail {
                message: format!("mock fetch failure for {message_id}"),
                status: Some(503),
                source: None,
            });
        }
        self.inbox
            .lock()
            .await
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
            .ok_or_else(|| DraftlineError::Mail {
                message: format!("message {message_id} not found"),
                status: Some(404),
                source: None,
            })
    }

    async fn create_draft_reply(
        &self,
        original: &InboundMessage,
        body: &str,
    ) -> Result<DraftRef, DraftlineError> {
        let mut drafts = self.drafts.lock().await;
        let draft = DraftRef {
            provider_draft_id: format!("draft-{}", drafts.len() + 1),
            thread_id: original.thread_id.clone(),
        };
        drafts.push(WrittenDraft {
            message_id: original.id.clone(),
            thread_id: original.thread_id.clone(),
            body: body.to_string(),
            draft: draft.clone(),
        });
        Ok(draft)
    }

    async fn draft_still_pending(&self, draft: &DraftRef) -> Option<bool> {
        self.draft_probe
            .lock()
            .await
            .get(&draft.provider_draft_id)
            .copied()
            .unwrap_or(Some(true))
    }

    async fn thread_sent_since(&self, thread_id: &str, _since: DateTime<Utc>) -> Option<bool> {
        self.thread_probe
            .lock()
            .await
            .get(thread_id)
            .copied()
            .unwrap_or(Some(false))
    }
}

/// Hands out registered [`MockMailbox`]es.
#[derive(Default)]
pub struct MockConnector {
    mailboxes: Mutex<HashMap<(MerchantId, MailProviderKind), Arc<MockMailbox>>>,
    connects: Mutex<usize>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, merchant: &MerchantId, mailbox: Arc<MockMailbox>) {
        self.mailboxes
            .lock()
            .await
            .insert((merchant.clone(), mailbox.kind()), mailbox);
    }

    pub async fn connect_count(&self) -> usize {
        *self.connects.lock().await
    }
}

#[async_trait]
impl MailConnector for MockConnector {
    async fn connect(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
    ) -> Result<Arc<dyn MailProvider>, DraftlineError> {
        *self.connects.lock().await += 1;
        match self.mailboxes.lock().await.get(&(merchant.clone(), provider)) {
            Some(mailbox) => Ok(Arc::clone(mailbox) as Arc<dyn MailProvider>),
            None => Err(DraftlineError::Permission(format!(
                "no {} account linked for merchant {merchant}",
                provider.as_str()
            ))),
        }
    }
}

/// A plain inbound support message for tests.
pub fn inbound(id: &str, sender: &str, subject: &str, body: &str, received_at: DateTime<Utc>) -> InboundMessage {
    InboundMessage {
        id: id.to_string(),
        thread_id: format!("thread-{id}"),
        rfc822_message_id: Some(format!("<{id}@mail.test>")),
        sender_email: sender.to_string(),
        sender_name: None,
        subject: subject.to_string(),
        body: body.to_string(),
        received_at,
        list_unsubscribe: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn listing_respects_watermark_and_limit() {
        let mailbox = MockMailbox::new(MailProviderKind::Gmail);
        let t0 = Utc::now();
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            mailbox
                .deliver(inbound(id, "x@example.com", "s", "b", t0 + Duration::seconds(i as i64)))
                .await;
        }
        let wm = Watermark {
            message_id: "a".into(),
            received_at: t0,
        };
        let listed = mailbox.list_candidates(Some(&wm), 1).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "b");
    }

    #[tokio::test]
    async fn failing_fetch_is_transient() {
        let mailbox = MockMailbox::new(MailProviderKind::Gmail);
        mailbox.deliver(inbound("a", "x@example.com", "s", "b", Utc::now())).await;
        mailbox.fail_fetch("a").await;
        let err = mailbox.fetch_full("a").await.unwrap_err();
        assert!(err.is_transient());
        mailbox.heal_fetch("a").await;
        assert!(mailbox.fetch_full("a").await.is_ok());
    }

    #[tokio::test]
    async fn connector_without_mailbox_is_permission_error() {
        let connector = MockConnector::new();
        let result = connector
            .connect(&MerchantId("m".into()), MailProviderKind::Outlook)
            .await;
        assert!(matches!(result, Err(DraftlineError::Permission(_))));
    }
}
