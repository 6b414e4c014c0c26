// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mail provider contract shared by the Gmail and Outlook clients.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DraftlineError;
use crate::types::{
    DraftRef, InboundMessage, MailAccount, MailProviderKind, MerchantId, MessageMeta, Watermark,
};

/// One merchant's mailbox on one provider, bound to resolved credentials.
///
/// Instances are built per run by a [`MailConnector`] and dropped afterwards;
/// tokens are never shared across runs.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Which provider this client talks to.
    fn kind(&self) -> MailProviderKind;

    /// Inbox messages strictly newer than `since`, oldest first, with bulk
    /// traffic already removed. Returns at most `limit` entries.
    async fn list_candidates(
        &self,
        since: Option<&Watermark>,
        limit: usize,
    ) -> Result<Vec<MessageMeta>, DraftlineError>;

    /// Fetches a message with its plain-text body resolved.
    async fn fetch_full(&self, message_id: &str) -> Result<InboundMessage, DraftlineError>;

    /// Creates a reply draft threaded under `original`.
    async fn create_draft_reply(
        &self,
        original: &InboundMessage,
        body: &str,
    ) -> Result<DraftRef, DraftlineError>;

    /// `Some(true)` if the draft still exists, `Some(false)` if the provider
    /// reports it gone, `None` when the check was inconclusive.
    async fn draft_still_pending(&self, draft: &DraftRef) -> Option<bool>;

    /// Whether the thread received a sent message at or after `since`.
    /// `None` when inconclusive.
    async fn thread_sent_since(&self, thread_id: &str, since: DateTime<Utc>) -> Option<bool>;
}

/// Builds per-run [`MailProvider`] clients for a merchant.
#[async_trait]
pub trait MailConnector: Send + Sync {
    /// Resolves credentials and returns a ready client.
    ///
    /// Fails with [`DraftlineError::Permission`] when no usable token can be
    /// obtained (missing account, refresh rejected).
    async fn connect(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
    ) -> Result<Arc<dyn MailProvider>, DraftlineError>;
}

/// Durable OAuth token storage for linked mailboxes.
#[async_trait]
pub trait MailAccountStore: Send + Sync {
    /// The linked account for a merchant on a provider, if any.
    async fn mail_account(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
    ) -> Result<Option<MailAccount>, DraftlineError>;

    /// Providers the merchant has linked.
    async fn linked_providers(
        &self,
        merchant: &MerchantId,
    ) -> Result<Vec<MailProviderKind>, DraftlineError>;

    /// Persists a refreshed access token (and rotated refresh token, if any).
    async fn update_tokens(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DraftlineError>;
}
