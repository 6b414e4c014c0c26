// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order matching.
//!
//! Three strategies, tried in order until one yields orders:
//! 1. the platform's exact email filter,
//! 2. a sample of recent orders filtered locally on every order email,
//! 3. an order number pulled from the subject, matched against the sample.

use std::sync::LazyLock;

use draftline_core::CommerceStore;
use draftline_core::types::{Order, StoreCredentials};
use regex::Regex;
use tracing::{debug, warn};

/// Order number introduced by a keyword, e.g. `Order #1042`, `ordre 1042`.
static KEYWORD_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:order|ordre)\s*#?\s*(\d{3,})").expect("valid keyword number pattern")
});

/// Any number, optionally introduced by a keyword or `#`.
static ANY_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:order|ordre)?\s*#?\s*(\d{3,})").expect("valid number pattern")
});

/// How the orders in an [`OrderContext`] were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStrategy {
    SenderEmail,
    SampledEmail,
    SubjectNumber,
}

impl OrderStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SenderEmail => "sender_email",
            Self::SampledEmail => "sampled_email",
            Self::SubjectNumber => "subject_number",
        }
    }
}

/// Orders matched for one message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderContext {
    pub orders: Vec<Order>,
    pub strategy: Option<OrderStrategy>,
    /// Set only when the subject-number strategy produced the match.
    pub matched_subject_number: Option<String>,
}

/// Order number mentioned in a subject line.
pub fn extract_subject_number(subject: &str) -> Option<String> {
    KEYWORD_NUMBER
        .captures(subject)
        .or_else(|| ANY_NUMBER.captures(subject))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// Whether `order` is the one a customer means by `number`.
///
/// The text fields (`name`, legacy number) match by substring or by
/// digit-only containment. The numeric `id` and `order_number` are
/// deliberately narrower and match only on equality, so a short number
/// never selects an order whose long internal id happens to contain it.
pub fn order_matches_number(order: &Order, number: &str) -> bool {
    let by_text = |field: &str| field.contains(number) || digits(field).contains(number);
    by_text(&order.name)
        || order.order_number.is_some_and(|n| n.to_string() == number)
        || order.id.to_string() == number
        || order.legacy_number.as_deref().is_some_and(by_text)
}

fn email_matches(order: &Order, email: &str) -> bool {
    order.emails().any(|e| e.trim().eq_ignore_ascii_case(email))
}

pub(crate) struct OrderMatcher<'a> {
    pub commerce: &'a dyn CommerceStore,
    pub lookup_limit: usize,
    pub sample_size: usize,
}

impl OrderMatcher<'_> {
    /// Run the strategies for one message. Lookup failures count as no orders.
    pub async fn resolve(&self, creds: &StoreCredentials, sender: &str, subject: &str) -> OrderContext {
        let email = sender.trim();
        let mut sample: Option<Vec<Order>> = None;

        if !email.is_empty() {
            match self.commerce.orders_by_email(creds, email, self.lookup_limit).await {
                Ok(orders) if !orders.is_empty() => {
                    return OrderContext {
                        orders,
                        strategy: Some(OrderStrategy::SenderEmail),
                        matched_subject_number: None,
                    };
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "order lookup by email failed"),
            }

            let recent = self.sample(creds).await;
            let matched: Vec<Order> = recent
                .iter()
                .filter(|o| email_matches(o, email))
                .take(self.lookup_limit)
                .cloned()
                .collect();
            if !matched.is_empty() {
                return OrderContext {
                    orders: matched,
                    strategy: Some(OrderStrategy::SampledEmail),
                    matched_subject_number: None,
                };
            }
            sample = Some(recent);
        }

        let Some(number) = extract_subject_number(subject) else {
            return OrderContext::default();
        };
        let recent = match sample {
            Some(recent) => recent,
            None => self.sample(creds).await,
        };
        let matched: Vec<Order> = recent
            .into_iter()
            .filter(|o| order_matches_number(o, &number))
            .take(self.lookup_limit)
            .collect();
        if matched.is_empty() {
            debug!(number = %number, "subject number matched no order");
            return OrderContext::default();
        }
        OrderContext {
            orders: matched,
            strategy: Some(OrderStrategy::SubjectNumber),
            matched_subject_number: Some(number),
        }
    }

    async fn sample(&self, creds: &StoreCredentials) -> Vec<Order> {
        match self.commerce.recent_orders(creds, self.sample_size).await {
            Ok(orders) => orders,
            Err(e) => {
                warn!(error = %e, "recent order sample failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn subject_number_prefers_keyword() {
        assert_eq!(extract_subject_number("Order #1042 missing").as_deref(), Some("1042"));
        assert_eq!(extract_subject_number("ordre 5521").as_deref(), Some("5521"));
        assert_eq!(
            extract_subject_number("Ticket 2024: order 1042 late").as_deref(),
            Some("1042")
        );
        assert_eq!(extract_subject_number("Where is #77812?").as_deref(), Some("77812"));
        assert_eq!(extract_subject_number("Question about 12 mugs"), None);
        assert_eq!(extract_subject_number(""), None);
    }

    #[test]
    fn number_matches_name_number_id_and_legacy() {
        let order = Order {
            id: 450789469,
            name: "#SHOP-1042".into(),
            order_number: Some(1042),
            legacy_number: Some("L-77".into()),
            ..Order::default()
        };
        assert!(order_matches_number(&order, "1042"));
        assert!(order_matches_number(&order, "450789469"));
        assert!(!order_matches_number(&order, "4507"));
        assert!(!order_matches_number(&order, "9999"));

        let legacy = Order {
            id: 1,
            name: String::new(),
            legacy_number: Some("A-00991".into()),
            ..Order::default()
        };
        assert!(order_matches_number(&legacy, "00991"));
    }

    #[test]
    fn numeric_fields_need_an_exact_match() {
        let order = Order {
            id: 7_104_221,
            name: String::new(),
            order_number: Some(10421),
            ..Order::default()
        };
        assert!(!order_matches_number(&order, "1042"));
        assert!(!order_matches_number(&order, "0422"));
        assert!(order_matches_number(&order, "10421"));
        assert!(order_matches_number(&order, "7104221"));
    }

    #[test]
    fn email_match_is_case_insensitive_on_any_address() {
        let order = Order {
            billing_email: Some(" Ann@Example.com ".into()),
            ..Order::default()
        };
        assert!(email_matches(&order, "ann@example.com"));
        assert!(!email_matches(&order, "bob@example.com"));
    }

    proptest! {
        #[test]
        fn keyword_number_is_always_found(n in 100u32..10_000_000u32, prefix in "[a-z ]{0,12}") {
            let subject = format!("{prefix} order #{n}");
            prop_assert_eq!(extract_subject_number(&subject), Some(n.to_string()));
        }
    }
}
