// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shopify Admin REST client for order lookups and the order writes behind
//! automated actions.

pub mod client;
pub mod error;
mod types;

pub use client::ShopifyClient;
pub use error::CommerceError;
