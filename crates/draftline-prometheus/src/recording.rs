// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call is
//! a no-op, so pipeline code records unconditionally.

use metrics::describe_counter;

pub const MESSAGES_TOTAL: &str = "draftline_messages_total";
pub const ACTIONS_TOTAL: &str = "draftline_actions_total";
pub const POLL_RUNS_TOTAL: &str = "draftline_poll_runs_total";
pub const GENERATION_FALLBACKS_TOTAL: &str = "draftline_generation_fallbacks_total";

/// Register all Draftline metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(MESSAGES_TOTAL, "Inbound messages handled, by outcome");
    describe_counter!(ACTIONS_TOTAL, "Proposed store actions, by type and result");
    describe_counter!(POLL_RUNS_TOTAL, "Completed poll runs");
    describe_counter!(
        GENERATION_FALLBACKS_TOTAL,
        "Replies written from the fallback template"
    );
}

/// Record a handled message (`drafted`, `rejected`, `already_drafted`, `failed`).
pub fn record_message(outcome: &str) {
    metrics::counter!(MESSAGES_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

/// Record one executed or refused action.
pub fn record_action(kind: &str, ok: bool) {
    metrics::counter!(
        ACTIONS_TOTAL,
        "type" => kind.to_string(),
        "ok" => if ok { "true" } else { "false" }
    )
    .increment(1);
}

pub fn record_poll_run() {
    metrics::counter!(POLL_RUNS_TOTAL).increment(1);
}

pub fn record_generation_fallback() {
    metrics::counter!(GENERATION_FALLBACKS_TOTAL).increment(1);
}
