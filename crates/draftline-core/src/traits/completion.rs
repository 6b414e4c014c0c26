// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion adapter trait for chat-completion language models.

use async_trait::async_trait;

use crate::error::DraftlineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CompletionRequest, CompletionResponse};

/// Adapter for chat-completion model APIs.
///
/// Used by the classifier fallback and the reply generator. Both treat any
/// error from this trait as a recoverable degradation, never as a run failure.
#[async_trait]
pub trait CompletionAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: CompletionRequest)
    -> Result<CompletionResponse, DraftlineError>;
}
