// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decides whether an inbound message deserves an automated reply.
//!
//! - [`rules`]: zero-cost deterministic reject list (senders, bulk headers, subjects)
//! - [`SupportClassifier`]: reject list first, then one model call
//!
//! Rejections are ordinary outcomes carrying a reason code, never errors.

pub mod classifier;
pub mod rules;

pub use classifier::SupportClassifier;
pub use rules::deterministic_reject;
