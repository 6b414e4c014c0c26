// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait and the durable pipeline state it exposes.

use async_trait::async_trait;

use crate::error::DraftlineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{DraftStatus, MailProviderKind, MerchantId, PollState, TrackedDraft, Watermark};

/// Adapter for storage and persistence backends.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), DraftlineError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), DraftlineError>;
}

/// Per (merchant, provider) polling watermark.
#[async_trait]
pub trait PollStateStore: Send + Sync {
    /// The stored state, or an empty state when the pair was never polled.
    async fn poll_state(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
    ) -> Result<PollState, DraftlineError>;

    /// Advances the watermark. Implementations must never move it backwards:
    /// a watermark older than the stored one is ignored.
    async fn advance_watermark(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
        watermark: &Watermark,
    ) -> Result<(), DraftlineError>;
}

/// Local records of drafts the pipeline created.
#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn record_draft(&self, draft: &TrackedDraft) -> Result<(), DraftlineError>;

    /// The draft already created for an inbound message, if any.
    async fn draft_for_message(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
        message_id: &str,
    ) -> Result<Option<TrackedDraft>, DraftlineError>;

    /// Drafts still marked pending.
    async fn pending_drafts(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
    ) -> Result<Vec<TrackedDraft>, DraftlineError>;

    async fn set_draft_status(&self, id: &str, status: DraftStatus) -> Result<(), DraftlineError>;
}
