// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter and collaborator trait definitions.
//!
//! Long-lived adapters extend [`PluginAdapter`]; collaborator traits are plain
//! `Send + Sync` seams so tests can swap in in-memory implementations. All use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod commerce;
pub mod completion;
pub mod directory;
pub mod embedding;
pub mod mail;
pub mod storage;

pub use adapter::PluginAdapter;
pub use commerce::CommerceStore;
pub use completion::CompletionAdapter;
pub use directory::{CredentialVault, MerchantDirectory, ProductIndex};
pub use embedding::EmbeddingAdapter;
pub use mail::{MailAccountStore, MailConnector, MailProvider};
pub use storage::{DraftStore, PollStateStore, StorageAdapter};
