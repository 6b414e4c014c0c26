// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gmail REST client.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use chrono::{DateTime, TimeZone, Utc};
use draftline_core::types::{DraftRef, InboundMessage, MailProviderKind, MessageMeta, Watermark};
use draftline_core::{DraftlineError, MailProvider};
use lettre::Message;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::body::{GmailPart, parse_address, reply_subject};
use crate::filter::{BulkSignals, bulk_reason};
use crate::{after_watermark, page_cap};

/// Page size while walking a watermark window (the API maximum).
const BACKLOG_PAGE_SIZE: usize = 500;

/// Pages walked before a watermark window is declared too large to list.
const MAX_BACKLOG_PAGES: usize = 20;

const METADATA_HEADERS: [&str; 6] = [
    "From",
    "Subject",
    "Message-ID",
    "List-Unsubscribe",
    "Precedence",
    "Auto-Submitted",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageStub>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageStub {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    id: String,
    #[serde(default)]
    thread_id: String,
    #[serde(default)]
    label_ids: Vec<String>,
    #[serde(default)]
    internal_date: Option<String>,
    #[serde(default)]
    payload: GmailPart,
}

impl GmailMessage {
    fn received_at(&self) -> DateTime<Utc> {
        self.internal_date
            .as_deref()
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or_else(Utc::now)
    }

    fn bulk_signals(&self) -> BulkSignals {
        BulkSignals::from_headers(
            self.payload
                .headers
                .iter()
                .map(|h| (h.name.as_str(), h.value.as_str())),
        )
    }
}

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    #[serde(default)]
    messages: Vec<GmailMessage>,
}

#[derive(Debug, Deserialize)]
struct DraftResponse {
    id: String,
    #[serde(default)]
    message: Option<DraftMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftMessage {
    #[serde(default)]
    thread_id: Option<String>,
}

/// One merchant's Gmail mailbox.
pub struct GmailProvider {
    api: ApiClient,
    api_base: String,
    account_email: String,
}

impl GmailProvider {
    pub(crate) fn new(api: ApiClient, api_base: &str, account_email: String) -> Self {
        Self {
            api,
            api_base: api_base.trim_end_matches('/').to_string(),
            account_email,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    /// Inbox ids to consider this run, in listing order (newest first).
    ///
    /// Without a watermark the newest `cap` ids are enough. With one, the whole
    /// `after:` window is paged through so the oldest `cap` ids can be taken;
    /// a window larger than the backlog bound is an error rather than a
    /// listing that silently skips its oldest messages.
    async fn list_ids(&self, since: Option<&Watermark>, cap: usize) -> Result<Vec<String>, DraftlineError> {
        let mut query = String::from("in:inbox");
        if let Some(wm) = since {
            // `after:` has second granularity and is exclusive; step back one
            // second and let the local filter drop what was already seen.
            query.push_str(&format!(" after:{}", wm.received_at.timestamp() - 1));
        }

        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0;
        loop {
            let page_size = if since.is_some() { BACKLOG_PAGE_SIZE } else { cap - ids.len() };
            let mut params = vec![
                ("q", query.clone()),
                ("labelIds", "INBOX".to_string()),
                ("maxResults", page_size.to_string()),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }
            let url = url::Url::parse_with_params(&self.url("messages"), &params)
                .map_err(|e| DraftlineError::mail(format!("invalid gmail url: {e}")))?;

            let page: ListResponse = self
                .api
                .json(|http| http.get(url.clone()), "list messages")
                .await?;
            ids.extend(page.messages.into_iter().map(|m| m.id));
            pages += 1;

            match page.next_page_token {
                None => break,
                Some(token) if since.is_some() => {
                    if pages >= MAX_BACKLOG_PAGES {
                        warn!(pages, listed = ids.len(), "gmail backlog since watermark exceeds listing bound");
                        return Err(DraftlineError::mail(format!(
                            "gmail backlog since watermark exceeds {} messages",
                            BACKLOG_PAGE_SIZE * MAX_BACKLOG_PAGES
                        )));
                    }
                    page_token = Some(token);
                }
                Some(token) if ids.len() < cap => page_token = Some(token),
                Some(_) => {
                    info!(cap, "gmail listing reached page cap, older messages skipped on first run");
                    break;
                }
            }
        }

        if since.is_some() && ids.len() > cap {
            debug!(listed = ids.len(), cap, "gmail backlog larger than page cap, newer messages deferred");
            // Listing is newest first; the oldest messages sit at the tail.
            ids.drain(..ids.len() - cap);
        } else {
            ids.truncate(cap);
        }
        Ok(ids)
    }

    async fn get_message(&self, id: &str, format: &str) -> Result<GmailMessage, DraftlineError> {
        let mut params = vec![("format", format.to_string())];
        if format == "metadata" {
            params.extend(METADATA_HEADERS.iter().map(|h| ("metadataHeaders", h.to_string())));
        }
        let url = url::Url::parse_with_params(&self.url(&format!("messages/{id}")), &params)
            .map_err(|e| DraftlineError::mail(format!("invalid gmail url: {e}")))?;
        self.api.json(|http| http.get(url.clone()), "get message").await
    }

    fn build_reply(&self, original: &InboundMessage, body: &str) -> Result<Vec<u8>, DraftlineError> {
        let from: Mailbox = self
            .account_email
            .parse()
            .map_err(|e| DraftlineError::mail(format!("invalid account address: {e}")))?;
        let to: Mailbox = original
            .sender_email
            .parse()
            .map_err(|e| DraftlineError::Validation(format!("invalid sender address: {e}")))?;

        let mut builder = Message::builder()
            .from(from)
            .to(to)
            .subject(reply_subject(&original.subject))
            .header(ContentType::TEXT_PLAIN);
        if let Some(message_id) = &original.rfc822_message_id {
            builder = builder
                .in_reply_to(message_id.clone())
                .references(message_id.clone());
        }
        let message = builder
            .body(body.to_string())
            .map_err(|e| DraftlineError::mail(format!("failed to build reply: {e}")))?;
        Ok(message.formatted())
    }
}

#[async_trait]
impl MailProvider for GmailProvider {
    fn kind(&self) -> MailProviderKind {
        MailProviderKind::Gmail
    }

    async fn list_candidates(
        &self,
        since: Option<&Watermark>,
        limit: usize,
    ) -> Result<Vec<MessageMeta>, DraftlineError> {
        let ids = self.list_ids(since, page_cap(limit)).await?;
        let mut candidates = Vec::with_capacity(ids.len());
        for id in ids {
            let message = self.get_message(&id, "metadata").await?;
            let received_at = message.received_at();
            if !after_watermark(&message.id, received_at, since) {
                continue;
            }
            let from = message.payload.header("From").unwrap_or_default();
            let (_, sender_email) = parse_address(from);
            let subject = message.payload.header("Subject").unwrap_or_default().to_string();
            if let Some(reason) = bulk_reason(&sender_email, &subject, &message.bulk_signals()) {
                debug!(message_id = %message.id, reason, "skipping bulk message");
                continue;
            }
            candidates.push(MessageMeta {
                id: message.id,
                thread_id: message.thread_id,
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
        let message = self.get_message(message_id, "full").await?;
        let received_at = message.received_at();
        let payload = &message.payload;
        let (sender_name, sender_email) = parse_address(payload.header("From").unwrap_or_default());
        Ok(InboundMessage {
            id: message.id.clone(),
            thread_id: message.thread_id.clone(),
            rfc822_message_id: payload.header("Message-ID").map(str::to_string),
            sender_email,
            sender_name,
            subject: payload.header("Subject").unwrap_or_default().to_string(),
            body: payload.text_body(),
            received_at,
            list_unsubscribe: payload.header("List-Unsubscribe").is_some(),
        })
    }

    async fn create_draft_reply(
        &self,
        original: &InboundMessage,
        body: &str,
    ) -> Result<DraftRef, DraftlineError> {
        let raw = URL_SAFE.encode(self.build_reply(original, body)?);
        let payload = json!({
            "message": {
                "raw": raw,
                "threadId": original.thread_id,
            }
        });
        let url = self.url("drafts");
        let draft: DraftResponse = self
            .api
            .json(|http| http.post(&url).json(&payload), "create draft")
            .await?;
        let thread_id = draft
            .message
            .and_then(|m| m.thread_id)
            .unwrap_or_else(|| original.thread_id.clone());
        info!(message_id = %original.id, draft_id = %draft.id, "gmail draft created");
        Ok(DraftRef {
            provider_draft_id: draft.id,
            thread_id,
        })
    }

    async fn draft_still_pending(&self, draft: &DraftRef) -> Option<bool> {
        let url = self.url(&format!("drafts/{}", draft.provider_draft_id));
        match self.api.send(|http| http.get(&url)).await {
            Ok(response) if response.status().is_success() => Some(true),
            Ok(response) if response.status() == StatusCode::NOT_FOUND => Some(false),
            Ok(response) => {
                warn!(draft_id = %draft.provider_draft_id, status = response.status().as_u16(), "draft probe inconclusive");
                None
            }
            Err(e) => {
                warn!(draft_id = %draft.provider_draft_id, error = %e, "draft probe failed");
                None
            }
        }
    }

    async fn thread_sent_since(&self, thread_id: &str, since: DateTime<Utc>) -> Option<bool> {
        let url = match url::Url::parse_with_params(
            &self.url(&format!("threads/{thread_id}")),
            &[("format", "minimal")],
        ) {
            Ok(url) => url,
            Err(e) => {
                warn!(thread_id, error = %e, "invalid thread url");
                return None;
            }
        };
        match self
            .api
            .json::<ThreadResponse, _>(|http| http.get(url.clone()), "get thread")
            .await
        {
            Ok(thread) => Some(thread.messages.iter().any(|m| {
                m.label_ids.iter().any(|l| l == "SENT") && m.received_at() >= since
            })),
            Err(e) => {
                warn!(thread_id, error = %e, "thread probe failed");
                None
            }
        }
    }
}
