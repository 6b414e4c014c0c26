// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Draftline support-draft pipeline.
//!
//! This crate provides the trait seams, error type, and shared domain types
//! used throughout the workspace. Mail providers, the model client, the
//! commerce client and storage all implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::DraftlineError;
pub use types::{AdapterType, HealthStatus, MailProviderKind, MerchantId};

pub use traits::{
    CommerceStore, CompletionAdapter, CredentialVault, DraftStore, EmbeddingAdapter,
    MailAccountStore, MailConnector, MailProvider, MerchantDirectory, PluginAdapter,
    PollStateStore, ProductIndex, StorageAdapter,
};
