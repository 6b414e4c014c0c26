// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gmail, Outlook and OAuth behavior against mocked HTTP endpoints.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use chrono::{DateTime, Duration, TimeZone, Utc};
use draftline_config::model::{GmailConfig, OutlookConfig};
use draftline_core::types::{
    DraftRef, InboundMessage, MailAccount, MailProviderKind, MerchantId, Watermark,
};
use draftline_core::{DraftlineError, MailAccountStore, MailConnector};
use draftline_mail::ProviderConnector;
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{
    body_partial_json, body_string_contains, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct MemoryAccounts {
    accounts: Mutex<HashMap<(String, MailProviderKind), MailAccount>>,
    updates: Mutex<Vec<(String, Option<String>)>>,
}

impl MemoryAccounts {
    fn with(account: MailAccount) -> Arc<Self> {
        let store = Self::default();
        store
            .accounts
            .lock()
            .unwrap()
            .insert((account.merchant_id.0.clone(), account.provider), account);
        Arc::new(store)
    }
}

#[async_trait]
impl MailAccountStore for MemoryAccounts {
    async fn mail_account(
        &self,
        merchant: &MerchantId,
        provider: MailProviderKind,
    ) -> Result<Option<MailAccount>, DraftlineError> {
        Ok(self.accounts.lock().unwrap().get(&(merchant.0.clone(), provider)).cloned())
    }

    async fn linked_providers(&self, merchant: &MerchantId) -> Result<Vec<MailProviderKind>, DraftlineError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .keys()
            .filter(|(m, _)| *m == merchant.0)
            .map(|(_, p)| *p)
            .collect())
    }

    async fn update_tokens(
        &self,
        _merchant: &MerchantId,
        _provider: MailProviderKind,
        access_token: &str,
        refresh_token: Option<&str>,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), DraftlineError> {
        self.updates
            .lock()
            .unwrap()
            .push((access_token.to_string(), refresh_token.map(str::to_string)));
        Ok(())
    }
}

fn merchant() -> MerchantId {
    MerchantId("m-1".into())
}

fn account(provider: MailProviderKind, access: Option<&str>, expires_in: i64) -> MailAccount {
    MailAccount {
        merchant_id: merchant(),
        provider,
        email_address: "support@shop.example".into(),
        access_token: access.map(|t| SecretString::from(t.to_string())),
        refresh_token: Some(SecretString::from("refresh-1".to_string())),
        expires_at: Some(Utc::now() + Duration::seconds(expires_in)),
    }
}

fn connector(server: &MockServer, store: Arc<MemoryAccounts>) -> ProviderConnector {
    let gmail = GmailConfig {
        token_url: format!("{}/token", server.uri()),
        api_base: format!("{}/gmail/v1/users/me", server.uri()),
        ..GmailConfig::default()
    };
    let outlook = OutlookConfig {
        token_url: format!("{}/token", server.uri()),
        api_base: format!("{}/v1.0/me", server.uri()),
        ..OutlookConfig::default()
    };
    ProviderConnector::new(gmail, outlook, store).unwrap()
}

fn gmail_metadata(id: &str, ms: i64, from: &str, subject: &str, extra: &[(&str, &str)]) -> Value {
    let mut headers = vec![
        json!({"name": "From", "value": from}),
        json!({"name": "Subject", "value": subject}),
    ];
    headers.extend(extra.iter().map(|(n, v)| json!({"name": n, "value": v})));
    json!({
        "id": id,
        "threadId": format!("t-{id}"),
        "internalDate": ms.to_string(),
        "labelIds": ["INBOX"],
        "payload": {"mimeType": "text/plain", "headers": headers}
    })
}

async fn mount_metadata(server: &MockServer, body: Value) {
    let id = body["id"].as_str().unwrap().to_string();
    Mock::given(method("GET"))
        .and(path(format!("/gmail/v1/users/me/messages/{id}")))
        .and(query_param("format", "metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn gmail_lists_non_bulk_messages_after_watermark_oldest_first() {
    let server = MockServer::start().await;
    let store = MemoryAccounts::with(account(MailProviderKind::Gmail, Some("access-1"), 3600));

    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .and(query_param("labelIds", "INBOX"))
        .and(query_param("maxResults", "500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{"id": "new2"}, {"id": "promo"}, {"id": "new1"}, {"id": "seen"}]
        })))
        .mount(&server)
        .await;

    let base = 1_700_000_000_000_i64;
    mount_metadata(&server, gmail_metadata("new2", base + 2000, "Bo <bo@example.com>", "Refund?", &[])).await;
    mount_metadata(
        &server,
        gmail_metadata("promo", base + 1500, "Shop <deals@example.com>", "Big sale", &[("List-Unsubscribe", "<mailto:x>")]),
    )
    .await;
    mount_metadata(&server, gmail_metadata("new1", base + 1000, "Ann <ANN@example.com>", "Order 1001", &[])).await;
    mount_metadata(&server, gmail_metadata("seen", base, "Cy <cy@example.com>", "Hi", &[])).await;

    let client = connector(&server, store).connect(&merchant(), MailProviderKind::Gmail).await.unwrap();
    let watermark = Watermark {
        message_id: "seen".into(),
        received_at: Utc.timestamp_millis_opt(base).single().unwrap(),
    };
    let listed = client.list_candidates(Some(&watermark), 5).await.unwrap();

    let ids: Vec<_> = listed.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["new1", "new2"]);
    assert_eq!(listed[0].sender_email, "ann@example.com");
    assert_eq!(listed[0].thread_id, "t-new1");
}

#[tokio::test]
async fn gmail_backlog_beyond_page_cap_starts_from_oldest() {
    let server = MockServer::start().await;
    let store = MemoryAccounts::with(account(MailProviderKind::Gmail, Some("access-1"), 3600));

    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{"id": "m5"}, {"id": "m4"}, {"id": "m3"}],
            "nextPageToken": "page-2"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{"id": "m2"}, {"id": "m1"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = 1_700_000_000_000_i64;
    for (i, id) in ["m1", "m2", "m3", "m4", "m5"].iter().enumerate() {
        let ms = base + 1000 * (i as i64 + 1);
        mount_metadata(&server, gmail_metadata(id, ms, "Ann <ann@example.com>", "Where is my order", &[])).await;
    }

    let client = connector(&server, store).connect(&merchant(), MailProviderKind::Gmail).await.unwrap();
    let watermark = Watermark {
        message_id: "m0".into(),
        received_at: Utc.timestamp_millis_opt(base).single().unwrap(),
    };
    let listed = client.list_candidates(Some(&watermark), 1).await.unwrap();

    let ids: Vec<_> = listed.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["m1"]);
}

#[tokio::test]
async fn gmail_backlog_over_listing_bound_is_an_error() {
    let server = MockServer::start().await;
    let store = MemoryAccounts::with(account(MailProviderKind::Gmail, Some("access-1"), 3600));

    // Every page points at another one.
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{"id": "m9"}],
            "nextPageToken": "more"
        })))
        .mount(&server)
        .await;

    let client = connector(&server, store).connect(&merchant(), MailProviderKind::Gmail).await.unwrap();
    let watermark = Watermark {
        message_id: "m0".into(),
        received_at: Utc::now() - Duration::days(1),
    };
    let err = client.list_candidates(Some(&watermark), 5).await.unwrap_err();
    assert!(matches!(err, DraftlineError::Mail { .. }), "got {err:?}");
}

#[tokio::test]
async fn gmail_refreshes_once_on_401_and_persists_token() {
    let server = MockServer::start().await;
    let store = MemoryAccounts::with(account(MailProviderKind::Gmail, Some("stale"), 3600));

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh", "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages/abc"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages/abc"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "abc",
            "threadId": "t-abc",
            "internalDate": "1700000000000",
            "payload": {
                "mimeType": "multipart/alternative",
                "headers": [
                    {"name": "From", "value": "\"Ann Lee\" <ann@example.com>"},
                    {"name": "Subject", "value": "Where is my parcel"},
                    {"name": "Message-ID", "value": "<orig@mail.example>"}
                ],
                "parts": [
                    {"mimeType": "text/html", "body": {"data": URL_SAFE.encode("<p>html body</p>")}},
                    {"mimeType": "text/plain", "body": {"data": URL_SAFE.encode("plain body")}}
                ]
            }
        })))
        .mount(&server)
        .await;

    let client = connector(&server, Arc::clone(&store))
        .connect(&merchant(), MailProviderKind::Gmail)
        .await
        .unwrap();
    let message = client.fetch_full("abc").await.unwrap();

    assert_eq!(message.body, "plain body");
    assert_eq!(message.sender_name.as_deref(), Some("Ann Lee"));
    assert_eq!(message.rfc822_message_id.as_deref(), Some("<orig@mail.example>"));
    assert_eq!(store.updates.lock().unwrap().as_slice(), &[("fresh".to_string(), None)]);
}

#[tokio::test]
async fn rejected_refresh_is_a_permission_error() {
    let server = MockServer::start().await;
    let store = MemoryAccounts::with(account(MailProviderKind::Gmail, Some("expired"), 10));

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;

    let result = connector(&server, store).connect(&merchant(), MailProviderKind::Gmail).await;
    assert!(matches!(result, Err(DraftlineError::Permission(_))));
}

#[tokio::test]
async fn missing_account_is_a_permission_error() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryAccounts::default());
    let result = connector(&server, store).connect(&merchant(), MailProviderKind::Outlook).await;
    assert!(matches!(result, Err(DraftlineError::Permission(_))));
}

#[tokio::test]
async fn gmail_draft_is_threaded_reply() {
    let server = MockServer::start().await;
    let store = MemoryAccounts::with(account(MailProviderKind::Gmail, Some("access-1"), 3600));

    Mock::given(method("POST"))
        .and(path("/gmail/v1/users/me/drafts"))
        .and(body_partial_json(json!({"message": {"threadId": "t-1"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "d-1", "message": {"id": "x", "threadId": "t-1"}
        })))
        .mount(&server)
        .await;

    let client = connector(&server, store).connect(&merchant(), MailProviderKind::Gmail).await.unwrap();
    let original = InboundMessage {
        id: "m-1".into(),
        thread_id: "t-1".into(),
        rfc822_message_id: Some("<orig@mail.example>".into()),
        sender_email: "ann@example.com".into(),
        sender_name: Some("Ann".into()),
        subject: "Where is my order".into(),
        body: "Hello".into(),
        received_at: Utc::now(),
        list_unsubscribe: false,
    };
    let draft = client.create_draft_reply(&original, "Hi Ann, it shipped.").await.unwrap();
    assert_eq!(draft.provider_draft_id, "d-1");
    assert_eq!(draft.thread_id, "t-1");

    let requests = server.received_requests().await.unwrap();
    let post = requests.iter().find(|r| r.url.path().ends_with("/drafts")).unwrap();
    let body: Value = serde_json::from_slice(&post.body).unwrap();
    let raw = URL_SAFE.decode(body["message"]["raw"].as_str().unwrap()).unwrap();
    let raw = String::from_utf8(raw).unwrap();
    assert!(raw.contains("Subject: Re: Where is my order"));
    assert!(raw.contains("In-Reply-To: <orig@mail.example>"));
    assert!(raw.contains("References: <orig@mail.example>"));
    assert!(raw.contains("To: ann@example.com"));
}

#[tokio::test]
async fn gmail_draft_probe_distinguishes_gone_from_inconclusive() {
    let server = MockServer::start().await;
    let store = MemoryAccounts::with(account(MailProviderKind::Gmail, Some("access-1"), 3600));

    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/drafts/live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "live"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/drafts/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/drafts/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = connector(&server, store).connect(&merchant(), MailProviderKind::Gmail).await.unwrap();
    let probe = |id: &str| DraftRef {
        provider_draft_id: id.into(),
        thread_id: "t".into(),
    };
    assert_eq!(client.draft_still_pending(&probe("live")).await, Some(true));
    assert_eq!(client.draft_still_pending(&probe("gone")).await, Some(false));
    assert_eq!(client.draft_still_pending(&probe("flaky")).await, None);
}

#[tokio::test]
async fn gmail_thread_sent_since_checks_sent_label_and_time() {
    let server = MockServer::start().await;
    let store = MemoryAccounts::with(account(MailProviderKind::Gmail, Some("access-1"), 3600));
    let created = Utc.timestamp_millis_opt(1_700_000_000_000).single().unwrap();

    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/threads/t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                {"id": "a", "labelIds": ["INBOX"], "internalDate": "1699999999000"},
                {"id": "b", "labelIds": ["SENT"], "internalDate": "1700000005000"}
            ]
        })))
        .mount(&server)
        .await;

    let client = connector(&server, store).connect(&merchant(), MailProviderKind::Gmail).await.unwrap();
    assert_eq!(client.thread_sent_since("t-1", created).await, Some(true));
    assert_eq!(
        client.thread_sent_since("t-1", created + Duration::seconds(10)).await,
        Some(false)
    );
}

#[tokio::test]
async fn outlook_converts_html_body_and_writes_reply_draft() {
    let server = MockServer::start().await;
    let store = MemoryAccounts::with(account(MailProviderKind::Outlook, Some("access-1"), 3600));

    Mock::given(method("GET"))
        .and(path("/v1.0/me/messages/o-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "o-1",
            "conversationId": "conv-1",
            "subject": "Cancel please",
            "receivedDateTime": "2024-05-01T10:00:00Z",
            "from": {"emailAddress": {"name": "Dee", "address": "Dee@Example.com"}},
            "body": {"contentType": "html", "content": "<p>Please cancel order 1002</p>"},
            "internetMessageId": "<o1@outlook.example>"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1.0/me/messages/o-1/createReply"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "draft-9", "conversationId": "conv-1", "isDraft": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v1.0/me/messages/draft-9"))
        .and(body_partial_json(json!({"body": {"contentType": "Text", "content": "Done, Dee."}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "draft-9"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = connector(&server, store).connect(&merchant(), MailProviderKind::Outlook).await.unwrap();
    let message = client.fetch_full("o-1").await.unwrap();
    assert_eq!(message.sender_email, "dee@example.com");
    assert_eq!(message.thread_id, "conv-1");
    assert!(message.body.contains("Please cancel order 1002"));
    assert!(!message.body.contains("<p>"));

    let draft = client.create_draft_reply(&message, "Done, Dee.").await.unwrap();
    assert_eq!(draft.provider_draft_id, "draft-9");
    assert_eq!(draft.thread_id, "conv-1");
}

#[tokio::test]
async fn outlook_follows_next_link_and_filters_bulk() {
    let server = MockServer::start().await;
    let store = MemoryAccounts::with(account(MailProviderKind::Outlook, Some("access-1"), 3600));

    Mock::given(method("GET"))
        .and(path("/v1.0/me/mailFolders/inbox/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{
                "id": "o-2",
                "conversationId": "c-2",
                "subject": "Weekly digest",
                "receivedDateTime": "2024-05-01T10:00:00Z",
                "from": {"emailAddress": {"address": "digest@example.com"}},
                "internetMessageHeaders": [{"name": "Precedence", "value": "bulk"}]
            }],
            "@odata.nextLink": format!("{}/v1.0/me/page2", server.uri())
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.0/me/page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{
                "id": "o-3",
                "conversationId": "c-3",
                "subject": "Damaged item",
                "receivedDateTime": "2024-05-01T11:00:00Z",
                "from": {"emailAddress": {"address": "eve@example.com"}}
            }]
        })))
        .mount(&server)
        .await;

    let client = connector(&server, store).connect(&merchant(), MailProviderKind::Outlook).await.unwrap();
    let listed = client.list_candidates(None, 5).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "o-3");
    assert_eq!(listed[0].thread_id, "c-3");
}
