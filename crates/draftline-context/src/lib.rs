// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Business context for reply generation.
//!
//! Gathers three independent pieces for one inbound message:
//! - **Orders**: matched by sender email, then by sampled email, then by
//!   a number in the subject ([`orders`])
//! - **Products**: catalog entries semantically close to the message ([`products`])
//! - **Merchant profile**: persona, automation switches, policies ([`merchant`])
//!
//! Every piece degrades to empty or default on failure. Resolution never
//! fails the message.

pub mod merchant;
pub mod orders;
pub mod products;

use std::sync::Arc;

use draftline_config::model::PipelineConfig;
use draftline_core::types::{InboundMessage, MerchantId, ProductMatch};
use draftline_core::{CommerceStore, CredentialVault, EmbeddingAdapter, MerchantDirectory, ProductIndex};
use tracing::{debug, warn};

pub use merchant::{MerchantProfile, load_profile};
pub use orders::{OrderContext, OrderStrategy, extract_subject_number};
pub use products::render_products;

use crate::orders::OrderMatcher;

/// Everything the generator knows about a message beyond its text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedContext {
    pub orders: OrderContext,
    pub products: Vec<ProductMatch>,
    pub profile: MerchantProfile,
}

impl ResolvedContext {
    /// Rendered product lines, empty when nothing matched.
    pub fn product_context(&self) -> String {
        render_products(&self.products)
    }
}

/// Tuning knobs, taken from `[pipeline]`.
#[derive(Debug, Clone, Copy)]
pub struct ContextSettings {
    pub order_lookup_limit: usize,
    pub order_sample_size: usize,
    pub product_top_k: usize,
    pub product_min_score: f32,
}

impl From<&PipelineConfig> for ContextSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            order_lookup_limit: config.order_lookup_limit,
            order_sample_size: config.order_sample_size,
            product_top_k: config.product_top_k,
            product_min_score: config.product_min_score,
        }
    }
}

/// Resolves [`ResolvedContext`] from the merchant's collaborators.
pub struct ContextResolver {
    commerce: Arc<dyn CommerceStore>,
    vault: Arc<dyn CredentialVault>,
    directory: Arc<dyn MerchantDirectory>,
    products: Arc<dyn ProductIndex>,
    embedder: Option<Arc<dyn EmbeddingAdapter>>,
    settings: ContextSettings,
}

impl ContextResolver {
    pub fn new(
        commerce: Arc<dyn CommerceStore>,
        vault: Arc<dyn CredentialVault>,
        directory: Arc<dyn MerchantDirectory>,
        products: Arc<dyn ProductIndex>,
        embedder: Option<Arc<dyn EmbeddingAdapter>>,
        settings: ContextSettings,
    ) -> Self {
        Self {
            commerce,
            vault,
            directory,
            products,
            embedder,
            settings,
        }
    }

    pub async fn resolve(&self, merchant: &MerchantId, message: &InboundMessage) -> ResolvedContext {
        let (orders, products, profile) = tokio::join!(
            self.resolve_orders(merchant, message),
            self.resolve_products(merchant, message),
            load_profile(self.directory.as_ref(), merchant),
        );
        debug!(
            merchant_id = %merchant,
            message_id = %message.id,
            orders = orders.orders.len(),
            strategy = orders.strategy.map(|s| s.as_str()).unwrap_or("none"),
            products = products.len(),
            "context resolved"
        );
        ResolvedContext {
            orders,
            products,
            profile,
        }
    }

    async fn resolve_orders(&self, merchant: &MerchantId, message: &InboundMessage) -> OrderContext {
        let creds = match self.vault.store_credentials(merchant).await {
            Ok(Some(creds)) => creds,
            Ok(None) => {
                debug!(merchant_id = %merchant, "no store linked, skipping order lookup");
                return OrderContext::default();
            }
            Err(e) => {
                warn!(merchant_id = %merchant, error = %e, "store credential lookup failed");
                return OrderContext::default();
            }
        };
        OrderMatcher {
            commerce: self.commerce.as_ref(),
            lookup_limit: self.settings.order_lookup_limit,
            sample_size: self.settings.order_sample_size,
        }
        .resolve(&creds, &message.sender_email, &message.subject)
        .await
    }

    async fn resolve_products(&self, merchant: &MerchantId, message: &InboundMessage) -> Vec<ProductMatch> {
        let Some(embedder) = &self.embedder else {
            return Vec::new();
        };
        let Some(text) = products::query_text(&message.subject, &message.body) else {
            return Vec::new();
        };
        match products::find_products(
            embedder.as_ref(),
            self.products.as_ref(),
            merchant,
            text,
            self.settings.product_top_k,
            self.settings.product_min_score,
        )
        .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!(merchant_id = %merchant, error = %e, "product search failed");
                Vec::new()
            }
        }
    }
}
