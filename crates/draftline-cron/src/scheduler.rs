// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Poll scheduler.
//!
//! One run walks merchants sequentially. For each linked provider it
//! reconciles pending drafts, lists messages newer than the stored watermark,
//! hands up to `max_messages_per_run` of them to the [`MessageProcessor`] and
//! then advances the watermark over the messages it actually considered.
//! Failures are contained per merchant and reported in the run results.

use std::fmt;
use std::sync::Arc;

use draftline_config::model::{OutlookConfig, SchedulerConfig};
use draftline_core::types::{MailProviderKind, Merchant, MessageMeta, Watermark};
use draftline_core::{
    DraftStore, DraftlineError, MailAccountStore, MailConnector, MerchantDirectory, PollStateStore,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::processor::MessageProcessor;
use crate::reconcile::reconcile_drafts;

/// Lifecycle of one (merchant, provider) poll, logged as it advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Listing,
    Processing(usize),
    AdvancingWatermark,
}

impl fmt::Display for PollPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollPhase::Idle => f.write_str("idle"),
            PollPhase::Listing => f.write_str("listing"),
            PollPhase::Processing(n) => write!(f, "processing({n})"),
            PollPhase::AdvancingWatermark => f.write_str("advancing_watermark"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// Another run holds the poll lock.
    #[error("a poll run is already in progress")]
    Busy,

    #[error(transparent)]
    Failed(#[from] DraftlineError),
}

/// Which merchants a run covers.
#[derive(Debug, Clone, Default)]
pub struct PollRequest {
    /// Explicit external ids. Empty means every eligible merchant.
    pub external_ids: Vec<String>,
    pub user_limit: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    pub max_messages_per_run: usize,
    pub user_limit: Option<usize>,
    pub reconcile_outlook: bool,
}

impl SchedulerSettings {
    pub fn from_config(scheduler: &SchedulerConfig, outlook: &OutlookConfig) -> Self {
        Self {
            max_messages_per_run: scheduler.max_messages_per_run,
            user_limit: scheduler.user_limit,
            reconcile_outlook: outlook.reconcile_drafts,
        }
    }
}

/// Counters for one provider of one merchant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub provider: String,
    pub listed: usize,
    pub considered: usize,
    pub drafted: usize,
    pub rejected: usize,
    pub already_drafted: usize,
    pub failed: usize,
    pub reconciled: usize,
    pub watermark_advanced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One entry per attempted merchant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantRunResult {
    pub merchant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<ProviderSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollReport {
    pub processed: usize,
    pub results: Vec<MerchantRunResult>,
}

pub struct PollScheduler {
    directory: Arc<dyn MerchantDirectory>,
    accounts: Arc<dyn MailAccountStore>,
    poll_state: Arc<dyn PollStateStore>,
    drafts: Arc<dyn DraftStore>,
    connector: Arc<dyn MailConnector>,
    processor: Arc<dyn MessageProcessor>,
    settings: SchedulerSettings,
    running: Mutex<()>,
}

impl PollScheduler {
    pub fn new(
        directory: Arc<dyn MerchantDirectory>,
        accounts: Arc<dyn MailAccountStore>,
        poll_state: Arc<dyn PollStateStore>,
        drafts: Arc<dyn DraftStore>,
        connector: Arc<dyn MailConnector>,
        processor: Arc<dyn MessageProcessor>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            directory,
            accounts,
            poll_state,
            drafts,
            connector,
            processor,
            settings,
            running: Mutex::new(()),
        }
    }

    /// Runs one poll. Fails with [`PollError::Busy`] while another run is in flight.
    pub async fn run(&self, request: PollRequest) -> Result<PollReport, PollError> {
        let _guard = self.running.try_lock().map_err(|_| PollError::Busy)?;
        draftline_prometheus::record_poll_run();

        let limit = request.user_limit.or(self.settings.user_limit);
        let mut results = Vec::new();
        let merchants = if request.external_ids.is_empty() {
            self.directory.eligible_merchants(limit).await?
        } else {
            let mut resolved = Vec::new();
            for external_id in request.external_ids.iter().take(limit.unwrap_or(usize::MAX)) {
                match self.directory.resolve_merchant(external_id).await {
                    Ok(Some(merchant)) => resolved.push(merchant),
                    Ok(None) => results.push(MerchantRunResult {
                        merchant_id: external_id.clone(),
                        external_id: Some(external_id.clone()),
                        error: Some("unknown merchant".into()),
                        ..MerchantRunResult::default()
                    }),
                    Err(e) => results.push(MerchantRunResult {
                        merchant_id: external_id.clone(),
                        external_id: Some(external_id.clone()),
                        error: Some(e.to_string()),
                        ..MerchantRunResult::default()
                    }),
                }
            }
            resolved
        };

        info!(merchants = merchants.len(), "poll run started");
        for merchant in &merchants {
            results.push(self.run_merchant(merchant).await);
        }

        let report = PollReport {
            processed: results.len(),
            results,
        };
        info!(
            merchants = report.processed,
            failed = report.results.iter().filter(|r| r.error.is_some()).count(),
            "poll run finished"
        );
        Ok(report)
    }

    async fn run_merchant(&self, merchant: &Merchant) -> MerchantRunResult {
        let mut result = MerchantRunResult {
            merchant_id: merchant.id.to_string(),
            external_id: Some(merchant.external_id.clone()),
            ..MerchantRunResult::default()
        };

        let providers = match self.accounts.linked_providers(&merchant.id).await {
            Ok(providers) => providers,
            Err(e) => {
                warn!(merchant_id = %merchant.id, error = %e, "failed to read linked providers");
                result.error = Some(e.to_string());
                return result;
            }
        };

        let mut errors = Vec::new();
        for provider in providers {
            let summary = self.run_provider(merchant, provider).await;
            if let Some(error) = &summary.error {
                errors.push(format!("{provider}: {error}"));
            }
            result.providers.push(summary);
        }
        if !errors.is_empty() {
            result.error = Some(errors.join("; "));
        }
        result
    }

    async fn run_provider(&self, merchant: &Merchant, provider: MailProviderKind) -> ProviderSummary {
        let mut summary = ProviderSummary {
            provider: provider.to_string(),
            ..ProviderSummary::default()
        };
        if let Err(e) = self.poll_provider(merchant, provider, &mut summary).await {
            warn!(
                merchant_id = %merchant.id,
                provider = %provider,
                error = %e,
                "provider poll failed"
            );
            summary.error = Some(e.to_string());
        }
        log_phase(merchant, provider, PollPhase::Idle);
        summary
    }

    async fn poll_provider(
        &self,
        merchant: &Merchant,
        provider: MailProviderKind,
        summary: &mut ProviderSummary,
    ) -> Result<(), DraftlineError> {
        log_phase(merchant, provider, PollPhase::Listing);
        let mailbox = self.connector.connect(&merchant.id, provider).await?;

        if provider == MailProviderKind::Gmail || self.settings.reconcile_outlook {
            match reconcile_drafts(self.drafts.as_ref(), mailbox.as_ref(), &merchant.id).await {
                Ok(marked) => summary.reconciled = marked,
                Err(e) => {
                    warn!(merchant_id = %merchant.id, provider = %provider, error = %e, "draft reconciliation failed")
                }
            }
        }

        let state = self.poll_state.poll_state(&merchant.id, provider).await?;
        let since = state.watermark();
        let candidates = mailbox
            .list_candidates(since.as_ref(), self.settings.max_messages_per_run)
            .await?;
        summary.listed = candidates.len();

        let batch: Vec<&MessageMeta> = candidates
            .iter()
            .take(self.settings.max_messages_per_run)
            .collect();
        log_phase(merchant, provider, PollPhase::Processing(batch.len()));

        let mut considered: Vec<&MessageMeta> = Vec::new();
        let mut stopped: Option<DraftlineError> = None;
        let mut held_back: Option<usize> = None;
        for meta in batch {
            let message = match mailbox.fetch_full(&meta.id).await {
                Ok(message) => message,
                Err(e) if e.is_transient() => {
                    // Leave this message (and everything after it) for the next run.
                    stopped = Some(e);
                    break;
                }
                Err(e) => {
                    warn!(
                        merchant_id = %merchant.id,
                        provider = %provider,
                        message_id = %meta.id,
                        error = %e,
                        "skipping message that cannot be fetched"
                    );
                    considered.push(meta);
                    summary.failed += 1;
                    continue;
                }
            };

            match self.processor.process(merchant, mailbox.as_ref(), &message).await {
                Ok(processed) => match processed.status.as_str() {
                    "drafted" => summary.drafted += 1,
                    "rejected" => summary.rejected += 1,
                    "already_drafted" => summary.already_drafted += 1,
                    other => debug!(status = other, "unrecognised processing status"),
                },
                Err(e) if e.is_transient() => {
                    // Later messages still run; the watermark stops short of this one.
                    warn!(
                        merchant_id = %merchant.id,
                        provider = %provider,
                        message_id = %meta.id,
                        error = %e,
                        "message processing failed, will retry"
                    );
                    held_back.get_or_insert(considered.len());
                    summary.failed += 1;
                }
                Err(e) => {
                    warn!(
                        merchant_id = %merchant.id,
                        provider = %provider,
                        message_id = %meta.id,
                        error = %e,
                        "message processing failed"
                    );
                    summary.failed += 1;
                }
            }
            considered.push(meta);
        }
        summary.considered = considered.len();

        let settled = &considered[..held_back.unwrap_or(considered.len())];
        if let Some(newest) = newest(settled) {
            log_phase(merchant, provider, PollPhase::AdvancingWatermark);
            self.poll_state
                .advance_watermark(&merchant.id, provider, &newest)
                .await?;
            summary.watermark_advanced = true;
        }

        match stopped {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// The latest considered message, which becomes the new watermark.
fn newest(considered: &[&MessageMeta]) -> Option<Watermark> {
    considered
        .iter()
        .max_by(|a, b| a.received_at.cmp(&b.received_at).then_with(|| a.id.cmp(&b.id)))
        .map(|meta| Watermark {
            message_id: meta.id.clone(),
            received_at: meta.received_at,
        })
}

fn log_phase(merchant: &Merchant, provider: MailProviderKind, phase: PollPhase) {
    debug!(merchant_id = %merchant.id, provider = %provider, phase = %phase, "poll phase");
}
