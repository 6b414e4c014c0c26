// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply generation, action execution and the per-message draft pipeline.
//!
//! [`DraftPipeline`] ties the stages together for one message. The
//! generator and executor are usable on their own for callers that build
//! their own flow.

pub mod actions;
pub mod executor;
pub mod generator;
pub mod pipeline;
pub mod prompt;

pub use actions::{ModelReply, parse_model_reply, reply_schema};
pub use executor::{ActionExecutor, NOT_PERMITTED};
pub use generator::{GeneratedReply, ReplyGenerator, fallback_reply, with_signature};
pub use pipeline::{DraftOutcome, DraftPipeline, OutcomeStatus};
