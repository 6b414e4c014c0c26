// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listing-time bulk mail filter.
//!
//! Runs before any body is fetched, on headers alone. A message flagged here
//! never reaches the pipeline and does not count against the per-run budget.

use std::sync::LazyLock;

use regex::RegexSet;

/// Sender local parts and domains typical of automated mail.
static BULK_SENDER: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\bno[-_.]?reply\b",
        r"(?i)\bdo[-_.]?not[-_.]?reply\b",
        r"(?i)^(newsletter|news|digest|promo|marketing|mailer-daemon|bounce[s]?)@",
        r"(?i)@(news|newsletter|marketing|promo)\.",
        r"(?i)@.*\b(mailchimp|sendgrid|mcsv|klaviyo|hubspot|substack)\b",
    ])
    .expect("valid bulk sender patterns")
});

static BULK_SUBJECT: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\bnewsletter\b",
        r"(?i)\bweekly digest\b",
        r"(?i)\bunsubscribe\b",
        r"(?i)\b\d{1,2}% off\b",
        r"(?i)\blimited[- ]time offer\b",
    ])
    .expect("valid bulk subject patterns")
});

/// Bulk-mail headers read at listing time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSignals {
    pub list_unsubscribe: bool,
    pub precedence: Option<String>,
    pub auto_submitted: Option<String>,
}

impl BulkSignals {
    /// Collect signals from `(name, value)` header pairs.
    pub fn from_headers<'a>(headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut signals = Self::default();
        for (name, value) in headers {
            if name.eq_ignore_ascii_case("list-unsubscribe") {
                signals.list_unsubscribe = true;
            } else if name.eq_ignore_ascii_case("precedence") {
                signals.precedence = Some(value.trim().to_ascii_lowercase());
            } else if name.eq_ignore_ascii_case("auto-submitted") {
                signals.auto_submitted = Some(value.trim().to_ascii_lowercase());
            }
        }
        signals
    }
}

/// Why a listed message was dropped, or `None` if it looks like a person wrote it.
pub fn bulk_reason(sender: &str, subject: &str, signals: &BulkSignals) -> Option<&'static str> {
    if signals.list_unsubscribe {
        return Some("list_unsubscribe");
    }
    if let Some(precedence) = &signals.precedence
        && matches!(precedence.as_str(), "bulk" | "list" | "junk" | "auto_reply")
    {
        return Some("precedence");
    }
    if let Some(auto) = &signals.auto_submitted
        && auto != "no"
    {
        return Some("auto_submitted");
    }
    if BULK_SENDER.is_match(sender) {
        return Some("bulk_sender");
    }
    if BULK_SUBJECT.is_match(subject) {
        return Some("bulk_subject");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> BulkSignals {
        BulkSignals::default()
    }

    #[test]
    fn customer_mail_passes() {
        assert_eq!(bulk_reason("jane@example.com", "Where is my order #1001?", &quiet()), None);
    }

    #[test]
    fn list_unsubscribe_header_is_bulk() {
        let signals = BulkSignals::from_headers([("List-Unsubscribe", "<mailto:x@y>")]);
        assert_eq!(bulk_reason("jane@example.com", "hi", &signals), Some("list_unsubscribe"));
    }

    #[test]
    fn precedence_and_auto_submitted() {
        let signals = BulkSignals::from_headers([("Precedence", "Bulk")]);
        assert_eq!(bulk_reason("a@b.com", "hi", &signals), Some("precedence"));

        let signals = BulkSignals::from_headers([("Auto-Submitted", "auto-replied")]);
        assert_eq!(bulk_reason("a@b.com", "hi", &signals), Some("auto_submitted"));

        let signals = BulkSignals::from_headers([("Auto-Submitted", "no")]);
        assert_eq!(bulk_reason("a@b.com", "hi", &signals), None);
    }

    #[test]
    fn sender_and_subject_patterns() {
        assert_eq!(bulk_reason("no-reply@shop.com", "hi", &quiet()), Some("bulk_sender"));
        assert_eq!(bulk_reason("news@brand.com", "hi", &quiet()), Some("bulk_sender"));
        assert_eq!(
            bulk_reason("team@brand.com", "Our March Newsletter", &quiet()),
            Some("bulk_subject")
        );
    }
}
