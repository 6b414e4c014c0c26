// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merchant configuration reads. Each falls back to its default on error.

use draftline_core::MerchantDirectory;
use draftline_core::types::{AutomationSettings, MerchantId, Persona, PolicyDocuments};
use tracing::warn;

/// Persona, automation switches and policy text for one merchant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MerchantProfile {
    pub persona: Persona,
    pub automation: AutomationSettings,
    pub policies: PolicyDocuments,
}

pub async fn load_profile(directory: &dyn MerchantDirectory, merchant: &MerchantId) -> MerchantProfile {
    let (persona, automation, policies) = tokio::join!(
        directory.persona(merchant),
        directory.automation_settings(merchant),
        directory.policies(merchant),
    );
    MerchantProfile {
        persona: or_default(persona, merchant, "persona"),
        automation: or_default(automation, merchant, "automation settings"),
        policies: or_default(policies, merchant, "policies"),
    }
}

fn or_default<T: Default>(
    result: Result<Option<T>, draftline_core::DraftlineError>,
    merchant: &MerchantId,
    what: &str,
) -> T {
    match result {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            warn!(merchant_id = %merchant, error = %e, "failed to load {what}, using defaults");
            T::default()
        }
    }
}
