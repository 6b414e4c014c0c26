// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Draftline integration tests.
//!
//! Provides mock collaborators and a test harness for fast, deterministic,
//! CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockModel`] - Scripted completion and embedding model with call counters
//! - [`MockMailbox`] / [`MockConnector`] - In-memory mailboxes capturing drafts
//! - [`MockCommerce`] - In-memory commerce store recording writes
//! - [`TestHarness`] - The full pipeline and scheduler over temp SQLite

pub mod harness;
pub mod mock_commerce;
pub mod mock_mailbox;
pub mod mock_provider;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_commerce::{CommerceCall, MockCommerce, order};
pub use mock_mailbox::{MockConnector, MockMailbox, WrittenDraft, inbound};
pub use mock_provider::MockModel;
