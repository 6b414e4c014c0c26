// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Poll scheduling for Draftline.
//!
//! [`PollScheduler`] drives the draft pipeline per merchant and keeps the
//! per-provider watermark. [`reconcile`] moves drafts to `sent` once the
//! merchant has acted on them, and [`ticker`] runs the scheduler on a cron
//! schedule inside the server process.

pub mod processor;
pub mod reconcile;
pub mod scheduler;
pub mod ticker;

pub use processor::{HttpDraftClient, InProcessProcessor, MessageProcessor, ProcessedMessage};
pub use reconcile::reconcile_drafts;
pub use scheduler::{
    MerchantRunResult, PollError, PollPhase, PollReport, PollRequest, PollScheduler,
    ProviderSummary, SchedulerSettings,
};
pub use ticker::{parse_schedule, spawn_poller};
