// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply generation.
//!
//! One schema-constrained model call produces the reply text and any proposed
//! store actions. When the model is missing, fails, or answers with nothing
//! usable, a deterministic template reply is used instead so every accepted
//! message still gets a draft.

use std::sync::Arc;

use draftline_config::model::{OpenAiConfig, PipelineConfig};
use draftline_context::{OrderContext, ResolvedContext};
use draftline_core::CompletionAdapter;
use draftline_core::types::{CompletionRequest, InboundMessage, ProposedAction};
use tracing::{debug, info, warn};

use crate::actions::{ModelReply, parse_model_reply, reply_schema};
use crate::prompt::{system_prompt, user_prompt};

/// Final reply for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedReply {
    /// Reply text with the merchant signature applied.
    pub text: String,
    pub actions: Vec<ProposedAction>,
    /// Whether the template reply was used.
    pub fallback: bool,
}

pub struct ReplyGenerator {
    model: Option<Arc<dyn CompletionAdapter>>,
    model_name: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl ReplyGenerator {
    pub fn new(
        model: Option<Arc<dyn CompletionAdapter>>,
        model_name: Option<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            model,
            model_name,
            temperature,
            max_tokens,
        }
    }

    pub fn from_config(
        model: Option<Arc<dyn CompletionAdapter>>,
        openai: &OpenAiConfig,
        pipeline: &PipelineConfig,
    ) -> Self {
        Self::new(
            model,
            Some(openai.chat_model.clone()),
            pipeline.generation_temperature,
            openai.max_tokens,
        )
    }

    /// Produces the reply for `message`. Never fails.
    pub async fn generate(&self, message: &InboundMessage, ctx: &ResolvedContext) -> GeneratedReply {
        let signature = &ctx.profile.persona.signature;
        let ModelReply { reply, actions } = self.ask_model(message, ctx).await;

        match reply {
            Some(reply) => {
                debug!(message_id = %message.id, actions = actions.len(), "model reply accepted");
                GeneratedReply {
                    text: with_signature(&reply, signature),
                    actions,
                    fallback: false,
                }
            }
            None => {
                info!(message_id = %message.id, "using template reply");
                draftline_prometheus::record_generation_fallback();
                GeneratedReply {
                    text: with_signature(&fallback_reply(message, &ctx.orders), signature),
                    // Proposals without a reply to explain them are not executed.
                    actions: Vec::new(),
                    fallback: true,
                }
            }
        }
    }

    async fn ask_model(&self, message: &InboundMessage, ctx: &ResolvedContext) -> ModelReply {
        let Some(model) = &self.model else {
            return ModelReply::default();
        };
        let request = CompletionRequest {
            model: self.model_name.clone(),
            system: system_prompt(&ctx.profile.persona, &ctx.profile.policies),
            user: user_prompt(message, ctx),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: Some(reply_schema()),
        };
        match model.complete(request).await {
            Ok(response) => parse_model_reply(&response.content),
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "reply generation failed");
                ModelReply::default()
            }
        }
    }
}

/// Appends the merchant signature unless the reply already contains it
/// verbatim. An empty signature leaves the reply as is.
pub fn with_signature(reply: &str, signature: &str) -> String {
    let reply = reply.trim_end();
    let signature = signature.trim();
    if signature.is_empty() || reply.contains(signature) {
        return reply.to_string();
    }
    format!("{reply}\n\n{signature}")
}

/// Template reply: greeting, acknowledgement, known order states, closing.
pub fn fallback_reply(message: &InboundMessage, orders: &OrderContext) -> String {
    let name = greeting_name(message).unwrap_or_else(|| "there".to_string());
    let mut reply = format!(
        "Hi {name},\n\nThank you for reaching out. We have received your message and will get back to you as soon as possible."
    );
    if !orders.orders.is_empty() {
        reply.push_str("\n\nHere is the current status of your order");
        if orders.orders.len() > 1 {
            reply.push('s');
        }
        reply.push(':');
        for order in &orders.orders {
            reply.push_str(&format!(
                "\nOrder #{}: {}",
                order.display_number(),
                order.status_label()
            ));
        }
    }
    reply.push_str("\n\nKind regards,");
    reply
}

/// First token of the display name, else the capitalised first part of the
/// email local part.
fn greeting_name(message: &InboundMessage) -> Option<String> {
    if let Some(first) = message
        .sender_name
        .as_deref()
        .and_then(|name| name.split_whitespace().next())
        .map(|first| first.trim_matches(|c: char| c == '"' || c == '\'' || c == ','))
        .filter(|first| !first.is_empty() && !first.contains('@'))
    {
        return Some(first.to_string());
    }

    let local = message.sender_email.split('@').next()?;
    let part = local
        .split(['.', '_', '-', '+'])
        .find(|p| p.chars().any(char::is_alphabetic))?;
    let mut chars = part.chars();
    let head = chars.next()?;
    Some(head.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect())
}
