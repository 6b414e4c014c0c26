// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shopify Admin REST client.
//!
//! Every request goes through [`ShopifyClient::request`], which resolves the
//! shop URL, attaches `X-Shopify-Access-Token` and turns non-2xx responses
//! into [`CommerceError::Status`].

use std::time::Duration;

use async_trait::async_trait;
use draftline_config::model::ShopifyConfig;
use draftline_core::types::{Address, Order, StoreCredentials};
use draftline_core::{CommerceStore, DraftlineError};
use reqwest::{Method, Response};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::CommerceError;
use crate::types::{OrderEnvelope, OrdersEnvelope, WireAddress};

const TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const MAX_PAGE_SIZE: usize = 250;
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cancellation reasons the Admin API accepts.
const CANCEL_REASONS: [&str; 5] = ["customer", "fraud", "inventory", "declined", "other"];

#[derive(Debug, Clone)]
pub struct ShopifyClient {
    http: reqwest::Client,
    scheme: String,
    api_version: String,
}

impl ShopifyClient {
    pub fn from_config(config: &ShopifyConfig) -> Result<Self, DraftlineError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| DraftlineError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            scheme: config.scheme.clone(),
            api_version: config.api_version.clone(),
        })
    }

    fn admin_url(&self, creds: &StoreCredentials, path: &str) -> Result<url::Url, CommerceError> {
        let domain = normalize_domain(&creds.shop_domain)?;
        let raw = format!(
            "{}://{}/admin/api/{}/{}",
            self.scheme, domain, self.api_version, path
        );
        url::Url::parse(&raw).map_err(|_| CommerceError::InvalidDomain(creds.shop_domain.clone()))
    }

    /// Shared request helper for every read and write.
    pub async fn request(
        &self,
        creds: &StoreCredentials,
        method: Method,
        url: url::Url,
        body: Option<&Value>,
    ) -> Result<Response, CommerceError> {
        debug!(%method, path = url.path(), "shopify request");
        let mut builder = self
            .http
            .request(method, url)
            .header(TOKEN_HEADER, creds.access_token.expose_secret());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CommerceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        creds: &StoreCredentials,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, CommerceError> {
        let mut url = self.admin_url(creds, path)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        let response = self.request(creds, Method::GET, url, None).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| CommerceError::Decode(e.to_string()))
    }

    async fn put_order(&self, creds: &StoreCredentials, order_id: i64, fields: Value) -> Result<(), CommerceError> {
        let mut order = json!({ "id": order_id });
        if let (Some(target), Value::Object(extra)) = (order.as_object_mut(), fields) {
            target.extend(extra);
        }
        let url = self.admin_url(creds, &format!("orders/{order_id}.json"))?;
        self.request(creds, Method::PUT, url, Some(&json!({ "order": order })))
            .await?;
        Ok(())
    }

    async fn order_field(
        &self,
        creds: &StoreCredentials,
        order_id: i64,
        field: &str,
    ) -> Result<OrderEnvelope, CommerceError> {
        self.get_json(
            creds,
            &format!("orders/{order_id}.json"),
            &[("fields", format!("id,{field}"))],
        )
        .await
    }

    async fn list_orders(
        &self,
        creds: &StoreCredentials,
        email: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Order>, CommerceError> {
        let mut params = vec![
            ("status", "any".to_string()),
            ("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string()),
        ];
        if let Some(email) = email {
            params.push(("email", email.to_string()));
        }
        let envelope: OrdersEnvelope = self.get_json(creds, "orders.json", &params).await?;
        Ok(envelope.orders.into_iter().map(Order::from).collect())
    }
}

/// Reduce a stored shop domain to `host[:port]`.
fn normalize_domain(raw: &str) -> Result<String, CommerceError> {
    let trimmed = raw.trim();
    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/');
    if host.is_empty() || host.contains(['/', ' ', '?', '#', '@']) {
        return Err(CommerceError::InvalidDomain(raw.to_string()));
    }
    Ok(host.to_ascii_lowercase())
}

#[async_trait]
impl CommerceStore for ShopifyClient {
    async fn orders_by_email(
        &self,
        creds: &StoreCredentials,
        email: &str,
        limit: usize,
    ) -> Result<Vec<Order>, DraftlineError> {
        Ok(self.list_orders(creds, Some(email), limit).await?)
    }

    async fn recent_orders(&self, creds: &StoreCredentials, limit: usize) -> Result<Vec<Order>, DraftlineError> {
        Ok(self.list_orders(creds, None, limit).await?)
    }

    async fn order_tags(&self, creds: &StoreCredentials, order_id: i64) -> Result<String, DraftlineError> {
        let envelope = self.order_field(creds, order_id, "tags").await?;
        Ok(envelope.order.tags.unwrap_or_default())
    }

    async fn set_order_tags(&self, creds: &StoreCredentials, order_id: i64, tags: &str) -> Result<(), DraftlineError> {
        self.put_order(creds, order_id, json!({ "tags": tags })).await?;
        info!(order_id, "order tags updated");
        Ok(())
    }

    async fn order_note(&self, creds: &StoreCredentials, order_id: i64) -> Result<Option<String>, DraftlineError> {
        let envelope = self.order_field(creds, order_id, "note").await?;
        Ok(envelope.order.note.filter(|n| !n.trim().is_empty()))
    }

    async fn set_order_note(&self, creds: &StoreCredentials, order_id: i64, note: &str) -> Result<(), DraftlineError> {
        self.put_order(creds, order_id, json!({ "note": note })).await?;
        info!(order_id, "order note updated");
        Ok(())
    }

    async fn update_shipping_address(
        &self,
        creds: &StoreCredentials,
        order_id: i64,
        address: &Address,
    ) -> Result<(), DraftlineError> {
        let wire = WireAddress::from(address);
        let value = serde_json::to_value(&wire)
            .map_err(|e| DraftlineError::Internal(format!("failed to encode address: {e}")))?;
        self.put_order(creds, order_id, json!({ "shipping_address": value })).await?;
        info!(order_id, "order shipping address updated");
        Ok(())
    }

    async fn cancel_order(
        &self,
        creds: &StoreCredentials,
        order_id: i64,
        reason: Option<&str>,
    ) -> Result<(), DraftlineError> {
        let reason = reason
            .map(|r| r.trim().to_ascii_lowercase())
            .filter(|r| CANCEL_REASONS.contains(&r.as_str()))
            .unwrap_or_else(|| "customer".to_string());
        let url = self.admin_url(creds, &format!("orders/{order_id}/cancel.json"))?;
        self.request(creds, Method::POST, url, Some(&json!({ "reason": reason })))
            .await?;
        info!(order_id, reason = %reason, "order cancelled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_normalization_strips_scheme_and_slash() {
        assert_eq!(normalize_domain("https://Shop.myshopify.com/").unwrap(), "shop.myshopify.com");
        assert_eq!(normalize_domain("127.0.0.1:8080").unwrap(), "127.0.0.1:8080");
        assert!(normalize_domain("shop.com/admin").is_err());
        assert!(normalize_domain("  ").is_err());
    }
}
