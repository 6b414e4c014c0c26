// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Draft reconciliation: marks tracked drafts `sent` once the provider shows
//! they left the drafts folder or the thread received a sent reply.

use draftline_core::types::{DraftStatus, MerchantId, TrackedDraft};
use draftline_core::{DraftStore, DraftlineError, MailProvider};
use tracing::{debug, info};

/// Whether a pending draft should now be considered sent.
///
/// Any inconclusive probe keeps the draft pending.
pub async fn draft_was_sent(mailbox: &dyn MailProvider, draft: &TrackedDraft) -> bool {
    match mailbox.draft_still_pending(&draft.draft_ref()).await {
        Some(false) => true,
        Some(true) => matches!(
            mailbox.thread_sent_since(&draft.thread_id, draft.created_at).await,
            Some(true)
        ),
        None => false,
    }
}

/// Checks every pending draft of `merchant` on this mailbox's provider.
/// Returns how many were marked sent.
pub async fn reconcile_drafts(
    drafts: &dyn DraftStore,
    mailbox: &dyn MailProvider,
    merchant: &MerchantId,
) -> Result<usize, DraftlineError> {
    let pending = drafts.pending_drafts(merchant, mailbox.kind()).await?;
    let mut marked = 0;
    for draft in &pending {
        if draft_was_sent(mailbox, draft).await {
            drafts.set_draft_status(&draft.id, DraftStatus::Sent).await?;
            debug!(merchant_id = %merchant, draft_id = %draft.provider_draft_id, "draft marked sent");
            marked += 1;
        }
    }
    if marked > 0 {
        info!(
            merchant_id = %merchant,
            provider = %mailbox.kind(),
            pending = pending.len(),
            marked,
            "drafts reconciled"
        );
    }
    Ok(marked)
}
