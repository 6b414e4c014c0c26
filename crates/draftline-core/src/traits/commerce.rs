// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Commerce platform contract: order reads and the write calls behind actions.

use async_trait::async_trait;

use crate::error::DraftlineError;
use crate::types::{Address, Order, StoreCredentials};

/// Order read/write API of the merchant's store.
///
/// Every call takes the credentials explicitly: callers resolve them once per
/// run and pass them down, so no client holds a process-wide token.
#[async_trait]
pub trait CommerceStore: Send + Sync {
    /// Orders placed with exactly this email address.
    async fn orders_by_email(
        &self,
        creds: &StoreCredentials,
        email: &str,
        limit: usize,
    ) -> Result<Vec<Order>, DraftlineError>;

    /// The most recent orders, unfiltered.
    async fn recent_orders(
        &self,
        creds: &StoreCredentials,
        limit: usize,
    ) -> Result<Vec<Order>, DraftlineError>;

    /// The order's raw comma-separated tag string.
    async fn order_tags(&self, creds: &StoreCredentials, order_id: i64)
    -> Result<String, DraftlineError>;

    /// Replaces the order's tag string.
    async fn set_order_tags(
        &self,
        creds: &StoreCredentials,
        order_id: i64,
        tags: &str,
    ) -> Result<(), DraftlineError>;

    /// The order's current note, if any.
    async fn order_note(
        &self,
        creds: &StoreCredentials,
        order_id: i64,
    ) -> Result<Option<String>, DraftlineError>;

    /// Replaces the order's note.
    async fn set_order_note(
        &self,
        creds: &StoreCredentials,
        order_id: i64,
        note: &str,
    ) -> Result<(), DraftlineError>;

    async fn update_shipping_address(
        &self,
        creds: &StoreCredentials,
        order_id: i64,
        address: &Address,
    ) -> Result<(), DraftlineError>;

    async fn cancel_order(
        &self,
        creds: &StoreCredentials,
        order_id: i64,
        reason: Option<&str>,
    ) -> Result<(), DraftlineError>;
}
