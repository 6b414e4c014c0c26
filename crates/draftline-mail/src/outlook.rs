// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Microsoft Graph mail client.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use draftline_core::types::{DraftRef, InboundMessage, MailProviderKind, MessageMeta, Watermark};
use draftline_core::{DraftlineError, MailProvider};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::body::html_to_text;
use crate::filter::{BulkSignals, bulk_reason};
use crate::{after_watermark, page_cap};

const LIST_SELECT: &str =
    "id,conversationId,subject,receivedDateTime,from,internetMessageHeaders";
const FULL_SELECT: &str =
    "id,conversationId,subject,receivedDateTime,from,body,internetMessageId,internetMessageHeaders";

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Recipient {
    #[serde(rename = "emailAddress")]
    email_address: EmailAddress,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EmailAddress {
    name: Option<String>,
    address: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ItemBody {
    content_type: String,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphMessage {
    id: String,
    #[serde(default)]
    conversation_id: String,
    #[serde(default)]
    subject: Option<String>,
    received_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    from: Option<Recipient>,
    #[serde(default)]
    body: Option<ItemBody>,
    #[serde(default)]
    internet_message_id: Option<String>,
    #[serde(default)]
    internet_message_headers: Vec<Header>,
    #[serde(default)]
    is_draft: Option<bool>,
}

impl GraphMessage {
    fn sender(&self) -> (Option<String>, String) {
        match &self.from {
            Some(r) => (
                r.email_address.name.clone().filter(|n| !n.trim().is_empty()),
                r.email_address.address.trim().to_ascii_lowercase(),
            ),
            None => (None, String::new()),
        }
    }

    fn bulk_signals(&self) -> BulkSignals {
        BulkSignals::from_headers(
            self.internet_message_headers
                .iter()
                .map(|h| (h.name.as_str(), h.value.as_str())),
        )
    }

    fn text_body(&self) -> String {
        match &self.body {
            Some(b) if b.content_type.eq_ignore_ascii_case("html") => html_to_text(&b.content),
            Some(b) => b.content.trim().to_string(),
            None => String::new(),
        }
    }
}

/// One merchant's Outlook mailbox.
pub struct OutlookProvider {
    api: ApiClient,
    api_base: String,
}

impl OutlookProvider {
    pub(crate) fn new(api: ApiClient, api_base: &str) -> Self {
        Self {
            api,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    fn list_url(&self, since: Option<&Watermark>, page_size: usize) -> Result<url::Url, DraftlineError> {
        let mut params = vec![
            ("$select", LIST_SELECT.to_string()),
            ("$top", page_size.to_string()),
        ];
        match since {
            Some(wm) => {
                params.push((
                    "$filter",
                    format!(
                        "receivedDateTime ge {}",
                        wm.received_at.to_rfc3339_opts(SecondsFormat::Secs, true)
                    ),
                ));
                params.push(("$orderby", "receivedDateTime asc".to_string()));
            }
            // First run: start from the newest page rather than the oldest mail.
            None => params.push(("$orderby", "receivedDateTime desc".to_string())),
        }
        url::Url::parse_with_params(&self.url("mailFolders/inbox/messages"), &params)
            .map_err(|e| DraftlineError::mail(format!("invalid graph url: {e}")))
    }
}

#[async_trait]
impl MailProvider for OutlookProvider {
    fn kind(&self) -> MailProviderKind {
        MailProviderKind::Outlook
    }

    async fn list_candidates(
        &self,
        since: Option<&Watermark>,
        limit: usize,
    ) -> Result<Vec<MessageMeta>, DraftlineError> {
        let cap = page_cap(limit);
        let mut next = Some(self.list_url(since, cap)?.to_string());
        let mut listed: Vec<GraphMessage> = Vec::new();

        while let Some(url) = next.take() {
            let page: Page<GraphMessage> = self
                .api
                .json(|http| http.get(&url), "list messages")
                .await?;
            listed.extend(page.value);
            match page.next_link {
                Some(link) if listed.len() < cap => next = Some(link),
                Some(_) => info!(cap, "outlook listing reached page cap, remaining messages deferred"),
                None => {}
            }
        }
        listed.truncate(cap);

        let mut candidates = Vec::with_capacity(listed.len());
        for message in listed {
            let Some(received_at) = message.received_date_time else {
                continue;
            };
            if !after_watermark(&message.id, received_at, since) {
                continue;
            }
            let (_, sender_email) = message.sender();
            let subject = message.subject.clone().unwrap_or_default();
            if let Some(reason) = bulk_reason(&sender_email, &subject, &message.bulk_signals()) {
                debug!(message_id = %message.id, reason, "skipping bulk message");
                continue;
            }
            candidates.push(MessageMeta {
                id: message.id,
                thread_id: message.conversation_id,
                sender_email,
                subject,
                received_at,
            });
        }
        candidates.sort_by(|a, b| a.received_at.cmp(&b.received_at).then_with(|| a.id.cmp(&b.id)));
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn fetch_full(&self, message_id: &str) -> Result<InboundMessage, DraftlineError> {
        let url = url::Url::parse_with_params(
            &self.url(&format!("messages/{message_id}")),
            &[("$select", FULL_SELECT)],
        )
        .map_err(|e| DraftlineError::mail(format!("invalid graph url: {e}")))?;
        let message: GraphMessage = self
            .api
            .json(|http| http.get(url.clone()), "get message")
            .await?;

        let (sender_name, sender_email) = message.sender();
        let list_unsubscribe = message
            .internet_message_headers
            .iter()
            .any(|h| h.name.eq_ignore_ascii_case("List-Unsubscribe"));
        Ok(InboundMessage {
            body: message.text_body(),
            id: message.id,
            thread_id: message.conversation_id,
            rfc822_message_id: message.internet_message_id,
            sender_email,
            sender_name,
            subject: message.subject.unwrap_or_default(),
            received_at: message.received_date_time.unwrap_or_else(Utc::now),
            list_unsubscribe,
        })
    }

    async fn create_draft_reply(
        &self,
        original: &InboundMessage,
        body: &str,
    ) -> Result<DraftRef, DraftlineError> {
        let create_url = self.url(&format!("messages/{}/createReply", original.id));
        let draft: GraphMessage = self
            .api
            .json(|http| http.post(&create_url).json(&json!({})), "create reply")
            .await?;

        let patch_url = self.url(&format!("messages/{}", draft.id));
        let patch = json!({ "body": { "contentType": "Text", "content": body } });
        self.api
            .send_ok(|http| http.patch(&patch_url).json(&patch), "update draft body")
            .await?;

        let thread_id = if draft.conversation_id.is_empty() {
            original.thread_id.clone()
        } else {
            draft.conversation_id
        };
        info!(message_id = %original.id, draft_id = %draft.id, "outlook draft created");
        Ok(DraftRef {
            provider_draft_id: draft.id,
            thread_id,
        })
    }

    async fn draft_still_pending(&self, draft: &DraftRef) -> Option<bool> {
        let url = match url::Url::parse_with_params(
            &self.url(&format!("messages/{}", draft.provider_draft_id)),
            &[("$select", "id,isDraft")],
        ) {
            Ok(url) => url,
            Err(e) => {
                warn!(draft_id = %draft.provider_draft_id, error = %e, "invalid draft url");
                return None;
            }
        };
        let response = match self.api.send(|http| http.get(url.clone())).await {
            Ok(response) => response,
            Err(e) => {
                warn!(draft_id = %draft.provider_draft_id, error = %e, "draft probe failed");
                return None;
            }
        };
        match response.status() {
            StatusCode::NOT_FOUND => Some(false),
            status if status.is_success() => match response.json::<GraphMessage>().await {
                Ok(message) => Some(message.is_draft.unwrap_or(true)),
                Err(e) => {
                    warn!(draft_id = %draft.provider_draft_id, error = %e, "malformed draft probe response");
                    None
                }
            },
            status => {
                warn!(draft_id = %draft.provider_draft_id, status = status.as_u16(), "draft probe inconclusive");
                None
            }
        }
    }

    async fn thread_sent_since(&self, thread_id: &str, since: DateTime<Utc>) -> Option<bool> {
        let filter = format!(
            "conversationId eq '{}' and sentDateTime ge {}",
            thread_id.replace('\'', "''"),
            since.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        let url = match url::Url::parse_with_params(
            &self.url("mailFolders/sentitems/messages"),
            &[("$filter", filter.as_str()), ("$top", "1"), ("$select", "id")],
        ) {
            Ok(url) => url,
            Err(e) => {
                warn!(thread_id, error = %e, "invalid sent items url");
                return None;
            }
        };
        match self
            .api
            .json::<Page<serde_json::Value>, _>(|http| http.get(url.clone()), "list sent items")
            .await
        {
            Ok(page) => Some(!page.value.is_empty()),
            Err(e) => {
                warn!(thread_id, error = %e, "sent items probe failed");
                None
            }
        }
    }
}
