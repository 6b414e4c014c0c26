// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gmail and Outlook clients behind the [`MailProvider`](draftline_core::MailProvider)
//! contract.
//!
//! [`ProviderConnector`] resolves a merchant's stored OAuth tokens into a
//! ready client for one run. Both clients list only non-bulk inbox mail newer
//! than the watermark, resolve bodies to plain text and write replies back as
//! threaded drafts.

mod api;
pub mod body;
pub mod connector;
pub mod filter;
pub mod gmail;
pub mod oauth;
pub mod outlook;

use chrono::{DateTime, Utc};
use draftline_core::types::Watermark;

pub use connector::ProviderConnector;
pub use gmail::GmailProvider;
pub use outlook::OutlookProvider;

/// Upper bound on messages listed per run.
const MAX_PAGE: usize = 100;

/// Listing cap for a run that will process at most `limit` messages.
pub(crate) fn page_cap(limit: usize) -> usize {
    limit.saturating_mul(3).clamp(1, MAX_PAGE)
}

/// Whether a message lies strictly beyond the watermark. Equal timestamps
/// count as new unless the id is the watermark message itself.
pub(crate) fn after_watermark(id: &str, received_at: DateTime<Utc>, since: Option<&Watermark>) -> bool {
    match since {
        None => true,
        Some(wm) => received_at > wm.received_at || (received_at == wm.received_at && id != wm.message_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn page_cap_scales_with_budget() {
        assert_eq!(page_cap(5), 15);
        assert_eq!(page_cap(50), 100);
        assert_eq!(page_cap(0), 1);
    }

    #[test]
    fn watermark_excludes_itself_and_older() {
        let now = Utc::now();
        let wm = Watermark {
            message_id: "m1".into(),
            received_at: now,
        };
        assert!(!after_watermark("m1", now, Some(&wm)));
        assert!(!after_watermark("m0", now - Duration::seconds(1), Some(&wm)));
        assert!(after_watermark("m2", now, Some(&wm)));
        assert!(after_watermark("m3", now + Duration::seconds(1), Some(&wm)));
        assert!(after_watermark("m0", now, None));
    }
}
