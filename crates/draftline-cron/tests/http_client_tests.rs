// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::Utc;
use draftline_core::DraftlineError;
use draftline_core::types::{MailProviderKind, Merchant, MerchantId};
use draftline_cron::{HttpDraftClient, MessageProcessor};
use draftline_test_utils::{MockMailbox, inbound};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn merchant() -> Merchant {
    Merchant {
        id: MerchantId("m-1".into()),
        external_id: "user_1".into(),
    }
}

#[tokio::test]
async fn posts_message_id_with_internal_secret() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/drafts"))
        .and(header("x-internal-secret", "shh"))
        .and(body_json(json!({
            "clerkUserId": "user_1",
            "messageId": "msg-9",
            "provider": "outlook"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "status": "drafted",
            "draftId": "AAMk-draft",
            "automation": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpDraftClient::new(format!("{}/v1/drafts", server.uri()), Some("shh".into())).unwrap();
    let mailbox = MockMailbox::new(MailProviderKind::Outlook);
    let message = inbound("msg-9", "ann@example.com", "Hi", "Body", Utc::now());

    let processed = client.process(&merchant(), &mailbox, &message).await.unwrap();
    assert_eq!(processed.status, "drafted");
    assert_eq!(processed.draft_id.as_deref(), Some("AAMk-draft"));
}

#[tokio::test]
async fn maps_remote_errors_to_kinds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "refresh token revoked"})))
        .mount(&server)
        .await;

    let client = HttpDraftClient::new(server.uri(), None).unwrap();
    let mailbox = MockMailbox::new(MailProviderKind::Gmail);
    let message = inbound("msg-1", "ann@example.com", "Hi", "Body", Utc::now());

    let err = client.process(&merchant(), &mailbox, &message).await.unwrap_err();
    assert!(matches!(err, DraftlineError::Permission(ref m) if m == "refresh token revoked"));
}

#[tokio::test]
async fn upstream_failure_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({"error": "gmail unavailable"})))
        .mount(&server)
        .await;

    let client = HttpDraftClient::new(server.uri(), None).unwrap();
    let mailbox = MockMailbox::new(MailProviderKind::Gmail);
    let message = inbound("msg-1", "ann@example.com", "Hi", "Body", Utc::now());

    let err = client.process(&merchant(), &mailbox, &message).await.unwrap_err();
    assert!(err.is_transient());
}
