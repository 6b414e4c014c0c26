// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Support-mail classifier.
//!
//! Two stages: the deterministic reject list in [`crate::rules`], then a
//! single schema-constrained model call for everything that survives it.
//! Classification never fails: model trouble becomes a reject reason.

use std::sync::Arc;

use draftline_config::model::{OpenAiConfig, PipelineConfig};
use draftline_core::CompletionAdapter;
use draftline_core::types::{
    Classification, CompletionRequest, InboundMessage, JsonSchemaFormat, MessageCategory,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::rules::deterministic_reject;

pub const REASON_LLM_SUPPORT: &str = "llm_support";
pub const REASON_LLM_INVALID_OUTPUT: &str = "llm_invalid_output";
pub const REASON_LLM_ERROR: &str = "llm_error";
pub const REASON_LLM_UNAVAILABLE: &str = "llm_unavailable";

const SYSTEM_PROMPT: &str = "You triage email arriving at an online store's support inbox. \
Classify the message as exactly one of: \
\"support\" (a customer or prospective customer writing about orders, shipping, returns, \
products, payments or their account), \
\"spam\" (unsolicited sales pitches, phishing, SEO or partnership offers), \
\"notification\" (automated mail from platforms, apps or services). \
Answer with JSON only.";

const MAX_OUTPUT_TOKENS: u32 = 200;

#[derive(Debug, Deserialize)]
struct Verdict {
    category: String,
    #[serde(default)]
    explanation: Option<String>,
}

fn verdict_schema() -> JsonSchemaFormat {
    JsonSchemaFormat {
        name: "triage_verdict".into(),
        schema: json!({
            "type": "object",
            "properties": {
                "category": {"type": "string", "enum": ["support", "spam", "notification"]},
                "explanation": {"type": "string"}
            },
            "required": ["category", "explanation"],
            "additionalProperties": false
        }),
    }
}

/// Accept/reject decision for inbound mail.
pub struct SupportClassifier {
    model: Option<Arc<dyn CompletionAdapter>>,
    model_name: Option<String>,
    body_chars: usize,
}

impl SupportClassifier {
    /// A classifier that falls back to `model` for anything the reject list
    /// lets through. With `None` those messages are rejected as unavailable.
    pub fn new(model: Option<Arc<dyn CompletionAdapter>>, model_name: Option<String>, body_chars: usize) -> Self {
        Self {
            model,
            model_name,
            body_chars,
        }
    }

    pub fn from_config(
        model: Option<Arc<dyn CompletionAdapter>>,
        openai: &OpenAiConfig,
        pipeline: &PipelineConfig,
    ) -> Self {
        Self::new(model, Some(openai.classify_model.clone()), pipeline.classifier_body_chars)
    }

    pub async fn classify(&self, message: &InboundMessage) -> Classification {
        if let Some(reason) =
            deterministic_reject(&message.sender_email, &message.subject, message.list_unsubscribe)
        {
            debug!(message_id = %message.id, reason, "deterministic reject");
            return Classification::reject(reason);
        }

        let Some(model) = &self.model else {
            return Classification::reject(REASON_LLM_UNAVAILABLE);
        };

        let body: String = message.body.chars().take(self.body_chars).collect();
        let request = CompletionRequest {
            model: self.model_name.clone(),
            system: SYSTEM_PROMPT.to_string(),
            user: format!(
                "From: {}\nSubject: {}\n\n{}",
                message.sender_email, message.subject, body
            ),
            temperature: 0.0,
            max_tokens: MAX_OUTPUT_TOKENS,
            response_format: Some(verdict_schema()),
        };

        let response = match model.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "classification call failed");
                return Classification::reject(REASON_LLM_ERROR);
            }
        };

        let classification = parse_verdict(&response.content);
        info!(
            message_id = %message.id,
            accept = classification.accept,
            reason = %classification.reason,
            "message classified"
        );
        classification
    }
}

/// Map raw model output to a classification.
fn parse_verdict(content: &str) -> Classification {
    let verdict: Verdict = match serde_json::from_str(content.trim()) {
        Ok(v) => v,
        Err(_) => return Classification::reject(REASON_LLM_INVALID_OUTPUT),
    };
    let category: MessageCategory = match verdict.category.trim().parse() {
        Ok(c) => c,
        Err(_) => return Classification::reject(REASON_LLM_INVALID_OUTPUT),
    };
    let explanation = verdict.explanation.filter(|e| !e.trim().is_empty());
    match category {
        MessageCategory::Support => Classification {
            accept: true,
            reason: REASON_LLM_SUPPORT.to_string(),
            category: Some(category),
            explanation,
        },
        other => Classification {
            accept: false,
            reason: format!("llm_{other}"),
            category: Some(other),
            explanation,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn support_is_accepted() {
        let c = parse_verdict(r#"{"category":"support","explanation":"asks about an order"}"#);
        assert!(c.accept);
        assert_eq!(c.reason, "llm_support");
        assert_eq!(c.category, Some(MessageCategory::Support));
        assert_eq!(c.explanation.as_deref(), Some("asks about an order"));
    }

    #[test]
    fn other_categories_are_rejected_with_prefixed_reason() {
        let c = parse_verdict(r#"{"category":"spam","explanation":"seo pitch"}"#);
        assert!(!c.accept);
        assert_eq!(c.reason, "llm_spam");
        let c = parse_verdict(r#"{"category":"Notification","explanation":""}"#);
        assert_eq!(c.reason, "llm_notification");
        assert_eq!(c.explanation, None);
    }

    #[test]
    fn malformed_output_is_invalid() {
        assert_eq!(parse_verdict("support").reason, "llm_invalid_output");
        assert_eq!(parse_verdict(r#"{"category":"refund"}"#).reason, "llm_invalid_output");
        assert_eq!(parse_verdict("{}").reason, "llm_invalid_output");
    }
}
