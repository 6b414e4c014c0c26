// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot commands: `draftline poll` and `draftline process`.
//!
//! Both print their result as pretty JSON on stdout, the same shapes the
//! gateway returns.

use draftline_config::model::DraftlineConfig;
use draftline_core::error::DraftlineError;
use draftline_core::types::{MailProviderKind, MerchantId};
use draftline_core::MerchantDirectory;
use draftline_cron::{PollError, PollRequest};
use serde::Serialize;

use crate::runtime::build_runtime;

fn print_json<T: Serialize>(value: &T) -> Result<(), DraftlineError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| DraftlineError::Internal(format!("failed to render result: {e}")))?;
    println!("{rendered}");
    Ok(())
}

/// Runs one poll over the given external ids, or over every eligible
/// merchant when none are given.
pub async fn run_poll(
    config: DraftlineConfig,
    merchants: Vec<String>,
    limit: Option<usize>,
) -> Result<(), DraftlineError> {
    let runtime = build_runtime(&config, false).await?;

    let request = PollRequest {
        external_ids: merchants,
        user_limit: limit,
    };
    let report = match runtime.scheduler.run(request).await {
        Ok(report) => report,
        Err(PollError::Busy) => {
            return Err(DraftlineError::Internal("a poll run is already in progress".into()));
        }
        Err(PollError::Failed(e)) => return Err(e),
    };

    print_json(&report)?;
    runtime.shutdown().await
}

/// Drafts a reply to one message, addressed by the merchant's external id.
pub async fn run_process(
    config: DraftlineConfig,
    merchant: &str,
    message_id: &str,
    provider: MailProviderKind,
) -> Result<(), DraftlineError> {
    let runtime = build_runtime(&config, false).await?;

    let merchant_id = resolve(runtime.storage.as_ref(), merchant).await?;
    let outcome = runtime
        .pipeline
        .process_by_id(&merchant_id, provider, message_id)
        .await?;

    print_json(&outcome)?;
    runtime.shutdown().await
}

async fn resolve(directory: &dyn MerchantDirectory, external_id: &str) -> Result<MerchantId, DraftlineError> {
    directory
        .resolve_merchant(external_id)
        .await?
        .map(|m| m.id)
        .ok_or_else(|| DraftlineError::NotFound(format!("no merchant with external id {external_id}")))
}
