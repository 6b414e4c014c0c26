// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merchant-facing collaborators: identity lookup, configuration reads,
//! credential resolution and the product index.

use async_trait::async_trait;

use crate::error::DraftlineError;
use crate::types::{
    AutomationSettings, Merchant, MerchantId, PolicyDocuments, Persona, ProductMatch,
    StoreCredentials,
};

/// Merchant identity and configuration reads.
#[async_trait]
pub trait MerchantDirectory: Send + Sync {
    /// Maps an external identity to the internal merchant.
    async fn resolve_merchant(&self, external_id: &str) -> Result<Option<Merchant>, DraftlineError>;

    /// Merchants with the master auto-draft flag on, oldest first.
    async fn eligible_merchants(&self, limit: Option<usize>)
    -> Result<Vec<Merchant>, DraftlineError>;

    async fn persona(&self, merchant: &MerchantId) -> Result<Option<Persona>, DraftlineError>;

    async fn automation_settings(
        &self,
        merchant: &MerchantId,
    ) -> Result<Option<AutomationSettings>, DraftlineError>;

    async fn policies(&self, merchant: &MerchantId)
    -> Result<Option<PolicyDocuments>, DraftlineError>;
}

/// Secret-gated store credential lookup.
#[async_trait]
pub trait CredentialVault: Send + Sync {
    /// Store credentials for the merchant, `None` when no store is linked.
    async fn store_credentials(
        &self,
        merchant: &MerchantId,
    ) -> Result<Option<StoreCredentials>, DraftlineError>;
}

/// Per-merchant product vector index.
#[async_trait]
pub trait ProductIndex: Send + Sync {
    /// Top `top_k` products whose similarity to `embedding` is at least `min_score`,
    /// best first.
    async fn search(
        &self,
        merchant: &MerchantId,
        embedding: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<ProductMatch>, DraftlineError>;
}
