// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Permission-gated execution of model-proposed store actions.
//!
//! Each proposal yields exactly one [`ActionResult`], in proposal order.
//! Permissions come from the merchant's automation settings; denied actions
//! never reach the store. Store credentials are resolved once per batch.

use std::sync::Arc;

use draftline_core::types::{
    ActionKind, ActionResult, AutomationSettings, MerchantId, ProposedAction, StoreCredentials,
};
use draftline_core::{CommerceStore, CredentialVault, DraftlineError};
use tracing::{debug, info, warn};

pub const NOT_PERMITTED: &str = "not permitted";
pub const STORE_NOT_CONNECTED: &str = "store not connected";

/// Whether the merchant allows this kind of mutation.
pub fn is_permitted(kind: ActionKind, settings: &AutomationSettings) -> bool {
    match kind {
        ActionKind::UpdateShippingAddress | ActionKind::AddNote | ActionKind::AddTag => {
            settings.order_updates
        }
        ActionKind::CancelOrder => settings.cancel_orders,
    }
}

/// Whether `tags` (comma-separated) already holds `tag`, ignoring case and padding.
pub fn has_tag(tags: &str, tag: &str) -> bool {
    let wanted = tag.trim();
    tags.split(',')
        .map(str::trim)
        .any(|existing| existing.eq_ignore_ascii_case(wanted))
}

pub struct ActionExecutor {
    commerce: Arc<dyn CommerceStore>,
    vault: Arc<dyn CredentialVault>,
}

impl ActionExecutor {
    pub fn new(commerce: Arc<dyn CommerceStore>, vault: Arc<dyn CredentialVault>) -> Self {
        Self { commerce, vault }
    }

    pub async fn execute(
        &self,
        merchant: &MerchantId,
        settings: &AutomationSettings,
        actions: &[ProposedAction],
    ) -> Vec<ActionResult> {
        if actions.is_empty() {
            return Vec::new();
        }

        let permitted: Vec<bool> = actions
            .iter()
            .map(|a| a.kind().is_some_and(|k| is_permitted(k, settings)))
            .collect();

        let creds = if permitted.iter().any(|p| *p) {
            Some(self.credentials(merchant).await)
        } else {
            None
        };

        let mut results = Vec::with_capacity(actions.len());
        for (action, allowed) in actions.iter().zip(permitted) {
            let type_name = action.type_name();
            let result = match (action, allowed, &creds) {
                (ProposedAction::Rejected { reason, .. }, _, _) => {
                    ActionResult::failure(type_name, reason.clone())
                }
                (_, false, _) => {
                    debug!(merchant_id = %merchant, action = %type_name, "action not permitted");
                    ActionResult::failure(type_name, NOT_PERMITTED)
                }
                (_, true, Some(Ok(creds))) => match self.apply(creds, action).await {
                    Ok(()) => ActionResult::success(type_name),
                    Err(e) => {
                        warn!(merchant_id = %merchant, action = %type_name, error = %e, "action failed");
                        ActionResult::failure(type_name, e.to_string())
                    }
                },
                (_, true, Some(Err(reason))) => ActionResult::failure(type_name, reason.clone()),
                (_, true, None) => ActionResult::failure(type_name, STORE_NOT_CONNECTED),
            };
            draftline_prometheus::record_action(&result.kind, result.ok);
            results.push(result);
        }

        info!(
            merchant_id = %merchant,
            proposed = results.len(),
            succeeded = results.iter().filter(|r| r.ok).count(),
            "actions executed"
        );
        results
    }

    async fn credentials(&self, merchant: &MerchantId) -> Result<StoreCredentials, String> {
        match self.vault.store_credentials(merchant).await {
            Ok(Some(creds)) => Ok(creds),
            Ok(None) => Err(STORE_NOT_CONNECTED.to_string()),
            Err(e) => {
                warn!(merchant_id = %merchant, error = %e, "store credential lookup failed");
                Err(format!("store credentials unavailable: {e}"))
            }
        }
    }

    async fn apply(&self, creds: &StoreCredentials, action: &ProposedAction) -> Result<(), DraftlineError> {
        match action {
            ProposedAction::UpdateShippingAddress { order_id, address } => {
                self.commerce
                    .update_shipping_address(creds, *order_id, address)
                    .await
            }
            ProposedAction::CancelOrder { order_id, reason } => {
                self.commerce
                    .cancel_order(creds, *order_id, reason.as_deref())
                    .await
            }
            ProposedAction::AddNote { order_id, note } => {
                let existing = self.commerce.order_note(creds, *order_id).await?;
                let updated = match existing.as_deref().map(str::trim_end) {
                    Some(current) if current.contains(note.as_str()) => return Ok(()),
                    Some(current) if !current.is_empty() => format!("{current}\n{note}"),
                    _ => note.clone(),
                };
                self.commerce.set_order_note(creds, *order_id, &updated).await
            }
            ProposedAction::AddTag { order_id, tag } => {
                let tags = self.commerce.order_tags(creds, *order_id).await?;
                if has_tag(&tags, tag) {
                    return Ok(());
                }
                let updated = if tags.trim().is_empty() {
                    tag.clone()
                } else {
                    format!("{}, {tag}", tags.trim().trim_end_matches(','))
                };
                self.commerce.set_order_tags(creds, *order_id, &updated).await
            }
            ProposedAction::Rejected { reason, .. } => Err(DraftlineError::Validation(reason.clone())),
        }
    }
}
