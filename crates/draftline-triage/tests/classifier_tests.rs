// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use chrono::Utc;
use draftline_core::CompletionAdapter;
use draftline_core::types::MessageCategory;
use draftline_test_utils::{MockModel, inbound};
use draftline_triage::SupportClassifier;

fn classifier(model: &Arc<MockModel>) -> SupportClassifier {
    let model: Arc<dyn CompletionAdapter> = model.clone();
    SupportClassifier::new(Some(model), Some("classify-model".into()), 500)
}

#[tokio::test]
async fn deterministic_reject_never_calls_the_model() {
    let model = Arc::new(MockModel::new());
    let c = classifier(&model);

    let mut newsletter = inbound("1", "ann@example.com", "Spring picks", "hi", Utc::now());
    newsletter.list_unsubscribe = true;
    let cases = [
        (inbound("2", "noreply@shop.example", "Your receipt", "x", Utc::now()), "blocked_sender"),
        (newsletter, "list_unsubscribe"),
        (inbound("3", "bob@example.com", "Out of office", "x", Utc::now()), "blocked_subject"),
    ];
    for (message, reason) in cases {
        let verdict = c.classify(&message).await;
        assert!(!verdict.accept);
        assert_eq!(verdict.reason, reason);
    }
    assert_eq!(model.completion_calls(), 0);
}

#[tokio::test]
async fn model_fallback_accepts_support() {
    let model = Arc::new(MockModel::with_responses([
        r#"{"category":"support","explanation":"late parcel"}"#,
    ]));
    let verdict = classifier(&model)
        .classify(&inbound("1", "ann@example.com", "Where is my order", "It has been two weeks", Utc::now()))
        .await;
    assert!(verdict.accept);
    assert_eq!(verdict.category, Some(MessageCategory::Support));
    assert_eq!(model.completion_calls(), 1);

    let request = &model.requests().await[0];
    assert_eq!(request.model.as_deref(), Some("classify-model"));
    assert!(request.user.contains("From: ann@example.com"));
    assert!(request.response_format.is_some());
}

#[tokio::test]
async fn body_is_truncated_before_the_model_sees_it() {
    let model = Arc::new(MockModel::with_responses([r#"{"category":"spam","explanation":""}"#]));
    let body = "x".repeat(2_000);
    let verdict = classifier(&model)
        .classify(&inbound("1", "seo@agency.test", "Rank #1", &body, Utc::now()))
        .await;
    assert_eq!(verdict.reason, "llm_spam");

    let request = &model.requests().await[0];
    assert_eq!(request.user.matches('x').count(), 500);
}

#[tokio::test]
async fn model_failure_and_absence_are_rejections() {
    let model = Arc::new(MockModel::new());
    model.push_failure("upstream 500").await;
    let message = inbound("1", "ann@example.com", "Refund", "please", Utc::now());
    assert_eq!(classifier(&model).classify(&message).await.reason, "llm_error");

    let disabled = SupportClassifier::new(None, None, 500);
    let verdict = disabled.classify(&message).await;
    assert!(!verdict.accept);
    assert_eq!(verdict.reason, "llm_unavailable");
}
