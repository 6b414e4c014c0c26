// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible model adapter for Draftline.
//!
//! Implements [`CompletionAdapter`] over Chat Completions (with strict JSON
//! schema output) and [`EmbeddingAdapter`] over the Embeddings endpoint.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use draftline_config::model::OpenAiConfig;
use draftline_core::error::DraftlineError;
use draftline_core::traits::{CompletionAdapter, EmbeddingAdapter, PluginAdapter};
use draftline_core::types::{
    AdapterType, CompletionRequest, CompletionResponse, EmbeddingInput, EmbeddingOutput,
    HealthStatus, TokenUsage,
};
use tracing::info;

use crate::client::OpenAiClient;
use crate::types::{ChatMessage, ChatRequest, EmbeddingRequest, ResponseFormat};

/// Chat + embedding provider for any OpenAI-compatible endpoint.
pub struct OpenAiProvider {
    client: OpenAiClient,
    chat_model: String,
    embedding_model: String,
}

impl OpenAiProvider {
    /// Builds the provider, or `None` when no API key is configured.
    ///
    /// Key resolution: `openai.api_key`, then `OPENAI_API_KEY`.
    pub fn from_config(config: &OpenAiConfig) -> Result<Option<Self>, DraftlineError> {
        let Some(api_key) = resolve_api_key(&config.api_key) else {
            info!("no model API key configured; generation and LLM triage disabled");
            return Ok(None);
        };
        let client = OpenAiClient::new(
            &api_key,
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(
            base_url = %config.base_url,
            chat_model = %config.chat_model,
            "model provider initialized"
        );
        Ok(Some(Self {
            client,
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
        }))
    }

    fn to_chat_request(&self, request: &CompletionRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(ChatMessage::system(&request.system));
        }
        messages.push(ChatMessage::user(&request.user));

        ChatRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.chat_model.clone()),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request
                .response_format
                .as_ref()
                .map(|f| ResponseFormat::strict_schema(&f.name, f.schema.clone())),
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, DraftlineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DraftlineError> {
        Ok(())
    }
}

#[async_trait]
impl CompletionAdapter for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, DraftlineError> {
        let chat = self.to_chat_request(&request);
        let response = self.client.chat(&chat).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DraftlineError::provider("model returned no choices"))?;
        if let Some(refusal) = choice.message.refusal {
            return Err(DraftlineError::provider(format!("model refused: {refusal}")));
        }
        let content = choice
            .message
            .content
            .ok_or_else(|| DraftlineError::provider("model returned empty content"))?;
        let usage = response.usage.unwrap_or_default();

        Ok(CompletionResponse {
            content,
            model: if response.model.is_empty() {
                chat.model
            } else {
                response.model
            },
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }
}

#[async_trait]
impl EmbeddingAdapter for OpenAiProvider {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, DraftlineError> {
        let expected = input.texts.len();
        let response = self
            .client
            .embed(&EmbeddingRequest {
                model: self.embedding_model.clone(),
                input: input.texts,
            })
            .await?;

        let mut data = response.data;
        if data.len() != expected {
            return Err(DraftlineError::provider(format!(
                "expected {expected} embeddings, got {}",
                data.len()
            )));
        }
        data.sort_by_key(|d| d.index);
        Ok(EmbeddingOutput {
            embeddings: data.into_iter().map(|d| d.embedding).collect(),
        })
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Option<String> {
    if let Some(key) = config_key
        && !key.trim().is_empty()
    {
        return Some(key.clone());
    }
    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
}
