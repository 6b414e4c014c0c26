// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock commerce store: an in-memory order book that records every write.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use draftline_core::traits::commerce::CommerceStore;
use draftline_core::types::{Address, Order, StoreCredentials};
use draftline_core::DraftlineError;

/// One write call observed by [`MockCommerce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommerceCall {
    SetTags { order_id: i64, tags: String },
    SetNote { order_id: i64, note: String },
    UpdateAddress { order_id: i64, address: Address },
    Cancel { order_id: i64, reason: Option<String> },
}

#[derive(Default)]
pub struct MockCommerce {
    orders: Mutex<Vec<Order>>,
    tags: Mutex<HashMap<i64, String>>,
    notes: Mutex<HashMap<i64, String>>,
    writes: Mutex<Vec<CommerceCall>>,
    reads: Mutex<usize>,
    failing_orders: Mutex<HashSet<i64>>,
    fail_reads: Mutex<bool>,
}

impl MockCommerce {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_order(&self, order: Order) {
        self.orders.lock().await.push(order);
    }

    pub async fn set_tags(&self, order_id: i64, tags: &str) {
        self.tags.lock().await.insert(order_id, tags.to_string());
    }

    pub async fn set_note(&self, order_id: i64, note: &str) {
        self.notes.lock().await.insert(order_id, note.to_string());
    }

    /// Writes to this order fail with a 422.
    pub async fn fail_writes_for(&self, order_id: i64) {
        self.failing_orders.lock().await.insert(order_id);
    }

    pub async fn fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().await = fail;
    }

    pub async fn writes(&self) -> Vec<CommerceCall> {
        self.writes.lock().await.clone()
    }

    /// Every call that touched the store, reads included.
    pub async fn call_count(&self) -> usize {
        *self.reads.lock().await + self.writes.lock().await.len()
    }

    pub async fn tags_of(&self, order_id: i64) -> String {
        self.tags.lock().await.get(&order_id).cloned().unwrap_or_default()
    }

    pub async fn note_of(&self, order_id: i64) -> Option<String> {
        self.notes.lock().await.get(&order_id).cloned()
    }

    async fn read(&self) -> Result<(), DraftlineError> {
        *self.reads.lock().await += 1;
        if *self.fail_reads.lock().await {
            return Err(DraftlineError::Commerce {
                message: "mock read failure".into(),
                status: Some(500),
                source: None,
            });
        }
        Ok(())
    }

    async fn write(&self, call: CommerceCall, order_id: i64) -> Result<(), DraftlineError> {
        self.writes.lock().await.push(call);
        if self.failing_orders.lock().await.contains(&order_id) {
            return Err(DraftlineError::Commerce {
                message: format!("shopify returned 422 for order {order_id}"),
                status: Some(422),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CommerceStore for MockCommerce {
    async fn orders_by_email(
        &self,
        _creds: &StoreCredentials,
        email: &str,
        limit: usize,
    ) -> Result<Vec<Order>, DraftlineError> {
        self.read().await?;
        // The platform's email filter matches the order email exactly.
        Ok(self
            .orders
            .lock()
            .await
            .iter()
            .filter(|o| o.email.as_deref() == Some(email))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn recent_orders(&self, _creds: &StoreCredentials, limit: usize) -> Result<Vec<Order>, DraftlineError> {
        self.read().await?;
        Ok(self.orders.lock().await.iter().take(limit).cloned().collect())
    }

    async fn order_tags(&self, _creds: &StoreCredentials, order_id: i64) -> Result<String, DraftlineError> {
        self.read().await?;
        Ok(self.tags_of(order_id).await)
    }

    async fn set_order_tags(&self, _creds: &StoreCredentials, order_id: i64, tags: &str) -> Result<(), DraftlineError> {
        self.write(
            CommerceCall::SetTags {
                order_id,
                tags: tags.to_string(),
            },
            order_id,
        )
        .await?;
        self.tags.lock().await.insert(order_id, tags.to_string());
        Ok(())
    }

    async fn order_note(&self, _creds: &StoreCredentials, order_id: i64) -> Result<Option<String>, DraftlineError> {
        self.read().await?;
        Ok(self.note_of(order_id).await)
    }

    async fn set_order_note(&self, _creds: &StoreCredentials, order_id: i64, note: &str) -> Result<(), DraftlineError> {
        self.write(
            CommerceCall::SetNote {
                order_id,
                note: note.to_string(),
            },
            order_id,
        )
        .await?;
        self.notes.lock().await.insert(order_id, note.to_string());
        Ok(())
    }

    async fn update_shipping_address(
        &self,
        _creds: &StoreCredentials,
        order_id: i64,
        address: &Address,
    ) -> Result<(), DraftlineError> {
        self.write(
            CommerceCall::UpdateAddress {
                order_id,
                address: address.clone(),
            },
            order_id,
        )
        .await
    }

    async fn cancel_order(
        &self,
        _creds: &StoreCredentials,
        order_id: i64,
        reason: Option<&str>,
    ) -> Result<(), DraftlineError> {
        self.write(
            CommerceCall::Cancel {
                order_id,
                reason: reason.map(str::to_string),
            },
            order_id,
        )
        .await
    }
}

/// A paid, unfulfilled order placed with `email`.
pub fn order(id: i64, number: i64, email: &str) -> Order {
    Order {
        id,
        name: format!("#{number}"),
        order_number: Some(number),
        email: Some(email.to_string()),
        financial_status: Some("paid".into()),
        total_price: "25.00".into(),
        currency: Some("USD".into()),
        ..Order::default()
    }
}
