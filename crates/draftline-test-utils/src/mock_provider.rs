// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock model adapter for deterministic testing.
//!
//! `MockModel` implements both `CompletionAdapter` and `EmbeddingAdapter`
//! with pre-configured responses and counts every call, so tests can assert
//! that a code path never reached the model.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use draftline_core::traits::adapter::PluginAdapter;
use draftline_core::traits::completion::CompletionAdapter;
use draftline_core::traits::embedding::EmbeddingAdapter;
use draftline_core::types::{
    AdapterType, CompletionRequest, CompletionResponse, EmbeddingInput, EmbeddingOutput,
    HealthStatus, TokenUsage,
};
use draftline_core::DraftlineError;

/// A mock model that returns queued completions.
///
/// Responses are popped from a FIFO queue. A queued `Err` is returned as a
/// provider error. When the queue is empty, `"mock response"` is returned.
pub struct MockModel {
    responses: Arc<Mutex<VecDeque<Result<String, String>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    completion_calls: AtomicUsize,
    embedding_calls: AtomicUsize,
    embedding: Mutex<Option<Vec<f32>>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self::with_queue(VecDeque::new())
    }

    fn with_queue(queue: VecDeque<Result<String, String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(queue)),
            requests: Arc::new(Mutex::new(Vec::new())),
            completion_calls: AtomicUsize::new(0),
            embedding_calls: AtomicUsize::new(0),
            embedding: Mutex::new(Some(vec![1.0, 0.0, 0.0])),
        }
    }

    /// Create a mock pre-loaded with successful responses.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_queue(responses.into_iter().map(|s| Ok(s.into())).collect())
    }

    /// Queue a successful completion.
    pub async fn push_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(Ok(text.into()));
    }

    /// Queue a failed completion.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.responses.lock().await.push_back(Err(message.into()));
    }

    /// The vector returned for every embedded text; `None` makes embedding fail.
    pub async fn set_embedding(&self, vector: Option<Vec<f32>>) {
        *self.embedding.lock().await = vector;
    }

    pub fn completion_calls(&self) -> usize {
        self.completion_calls.load(Ordering::SeqCst)
    }

    pub fn embedding_calls(&self) -> usize {
        self.embedding_calls.load(Ordering::SeqCst)
    }

    /// Every completion request received, in order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockModel {
    fn name(&self) -> &str {
        "mock-model"
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
impl CompletionAdapter for MockModel {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, DraftlineError> {
        self.completion_calls.fetch_add(1, Ordering::SeqCst);
        let model = request.model.clone().unwrap_or_else(|| "mock-model".to_string());
        self.requests.lock().await.push(request);
        let next = self
            .responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok("mock response".to_string()));
        match next {
            Ok(content) => Ok(CompletionResponse {
                content,
                model,
                usage: TokenUsage {
                    input_tokens: 10,
                    output_tokens: 20,
                },
            }),
            Err(message) => Err(DraftlineError::provider(message)),
        }
    }
}

#[async_trait]
impl EmbeddingAdapter for MockModel {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, DraftlineError> {
        self.embedding_calls.fetch_add(1, Ordering::SeqCst);
        match self.embedding.lock().await.clone() {
            Some(vector) => Ok(EmbeddingOutput {
                embeddings: input.texts.iter().map(|_| vector.clone()).collect(),
            }),
            None => Err(DraftlineError::provider("mock embedding failure")),
        }
    }
}
