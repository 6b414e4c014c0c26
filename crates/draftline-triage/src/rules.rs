// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic reject rules.
//!
//! Checked before any model call. A match here is final.

/// Sender fragments that mark automated or social-network mail (contains, case-insensitive).
const BLOCKED_SENDER_FRAGMENTS: &[&str] = &[
    "no-reply", "noreply", "donotreply", "do-not-reply", "newsletter",
    "mailer-daemon", "postmaster", "billing", "notifications", "facebook",
    "linkedin", "twitter", "instagram", "tiktok", "pinterest", "marketing",
    "news@", "updates@",
];

/// Subject fragments of auto-replies and bounces (contains, case-insensitive).
const BLOCKED_SUBJECT_FRAGMENTS: &[&str] = &[
    "auto-reply", "automatic reply", "autoreply", "out of office",
    "out-of-office", "undeliverable", "delivery status notification",
    "mail delivery failed",
];

pub const REASON_BLOCKED_SENDER: &str = "blocked_sender";
pub const REASON_LIST_UNSUBSCRIBE: &str = "list_unsubscribe";
pub const REASON_BLOCKED_SUBJECT: &str = "blocked_subject";

/// Reject reason for a message, or `None` when it needs a closer look.
pub fn deterministic_reject(sender: &str, subject: &str, list_unsubscribe: bool) -> Option<&'static str> {
    let sender = sender.to_lowercase();
    if BLOCKED_SENDER_FRAGMENTS.iter().any(|f| sender.contains(f)) {
        return Some(REASON_BLOCKED_SENDER);
    }
    if list_unsubscribe {
        return Some(REASON_LIST_UNSUBSCRIBE);
    }
    let subject = subject.to_lowercase();
    if BLOCKED_SUBJECT_FRAGMENTS.iter().any(|f| subject.contains(f)) {
        return Some(REASON_BLOCKED_SUBJECT);
    }
    None
}
