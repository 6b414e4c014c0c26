// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin REST wire types and their mapping onto [`Order`].

use draftline_core::types::{Address, LineItem, Order};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersEnvelope {
    #[serde(default)]
    pub orders: Vec<ShopifyOrder>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderEnvelope {
    pub order: ShopifyOrder,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ShopifyOrder {
    pub id: i64,
    pub name: String,
    pub number: Option<i64>,
    pub order_number: Option<i64>,
    pub email: Option<String>,
    pub contact_email: Option<String>,
    pub customer: Option<Customer>,
    pub billing_address: Option<WireAddress>,
    pub shipping_address: Option<WireAddress>,
    pub fulfillment_status: Option<String>,
    pub financial_status: Option<String>,
    pub line_items: Vec<WireLineItem>,
    pub total_price: Option<String>,
    pub currency: Option<String>,
    pub tags: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Customer {
    pub email: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct WireAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Present on some checkouts; never serialized back.
    #[serde(skip_serializing)]
    pub email: Option<String>,
}

impl From<&Address> for WireAddress {
    fn from(a: &Address) -> Self {
        Self {
            name: a.name.clone(),
            address1: a.address1.clone(),
            address2: a.address2.clone(),
            city: a.city.clone(),
            province: a.province.clone(),
            zip: a.zip.clone(),
            country: a.country.clone(),
            phone: a.phone.clone(),
            email: None,
        }
    }
}

impl From<WireAddress> for Address {
    fn from(a: WireAddress) -> Self {
        Self {
            name: a.name,
            address1: a.address1,
            address2: a.address2,
            city: a.city,
            province: a.province,
            zip: a.zip,
            country: a.country,
            phone: a.phone,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireLineItem {
    pub title: String,
    pub quantity: i64,
}

impl From<ShopifyOrder> for Order {
    fn from(o: ShopifyOrder) -> Self {
        let billing_email = o.billing_address.as_ref().and_then(|a| a.email.clone());
        let shipping_email = o.shipping_address.as_ref().and_then(|a| a.email.clone());
        Order {
            id: o.id,
            name: o.name,
            order_number: o.order_number,
            legacy_number: o.number.map(|n| n.to_string()),
            email: o.email.or(o.contact_email),
            customer_email: o.customer.and_then(|c| c.email),
            billing_email,
            shipping_email,
            fulfillment_status: o.fulfillment_status,
            financial_status: o.financial_status,
            shipping_address: o.shipping_address.map(Address::from),
            line_items: o
                .line_items
                .into_iter()
                .map(|li| LineItem {
                    title: li.title,
                    quantity: li.quantity,
                })
                .collect(),
            total_price: o.total_price.unwrap_or_default(),
            currency: o.currency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_maps_every_email_source() {
        let raw = serde_json::json!({
            "id": 450789469,
            "name": "#1001",
            "number": 1,
            "order_number": 1001,
            "email": "buyer@example.com",
            "customer": {"email": "customer@example.com"},
            "billing_address": {"email": "billing@example.com", "city": "Oslo"},
            "shipping_address": {"name": "Ann", "address1": "Main St 1", "city": "Bergen"},
            "fulfillment_status": null,
            "financial_status": "paid",
            "line_items": [{"title": "Mug", "quantity": 2}],
            "total_price": "19.90",
            "currency": "EUR"
        });
        let order: Order = serde_json::from_value::<ShopifyOrder>(raw).unwrap().into();
        let emails: Vec<_> = order.emails().collect();
        assert_eq!(
            emails,
            vec!["buyer@example.com", "customer@example.com", "billing@example.com"]
        );
        assert_eq!(order.legacy_number.as_deref(), Some("1"));
        assert_eq!(order.status_label(), "unfulfilled / paid");
        assert_eq!(order.line_items[0].quantity, 2);
        assert_eq!(order.shipping_address.unwrap().city.as_deref(), Some("Bergen"));
    }

    #[test]
    fn address_serializes_without_empty_fields() {
        let wire = WireAddress::from(&Address {
            address1: Some("New Road 5".into()),
            city: Some("Trondheim".into()),
            ..Address::default()
        });
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json, serde_json::json!({"address1": "New Road 5", "city": "Trondheim"}));
    }
}
