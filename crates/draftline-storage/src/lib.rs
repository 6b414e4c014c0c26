// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for Draftline.
//!
//! WAL-mode SQLite with embedded migrations and a single-writer connection
//! via `tokio-rusqlite`. Holds the pipeline's own state (poll watermarks,
//! tracked drafts) and the merchant records it reads (accounts, credentials,
//! persona, automation settings, policies, product embeddings).

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
