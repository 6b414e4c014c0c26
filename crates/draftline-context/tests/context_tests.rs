// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use chrono::Utc;
use draftline_context::{ContextResolver, ContextSettings, OrderStrategy};
use draftline_core::EmbeddingAdapter;
use draftline_core::types::{AutomationSettings, MerchantId, Persona, Product, StoreCredentials};
use draftline_storage::SqliteStorage;
use draftline_test_utils::{MockCommerce, MockModel, inbound, order};
use secrecy::SecretString;

struct Fixture {
    merchant: MerchantId,
    storage: Arc<SqliteStorage>,
    commerce: Arc<MockCommerce>,
    model: Arc<MockModel>,
}

impl Fixture {
    async fn new() -> Self {
        let storage = Arc::new(SqliteStorage::in_memory().await.unwrap());
        let merchant = MerchantId("m-1".into());
        storage.upsert_merchant(&merchant, "user_1").await.unwrap();
        storage
            .set_store_credentials(
                &merchant,
                &StoreCredentials {
                    shop_domain: "shop.myshopify.com".into(),
                    access_token: SecretString::from("shpat".to_string()),
                },
            )
            .await
            .unwrap();
        Self {
            merchant,
            storage,
            commerce: Arc::new(MockCommerce::new()),
            model: Arc::new(MockModel::new()),
        }
    }

    fn resolver(&self) -> ContextResolver {
        ContextResolver::new(
            self.commerce.clone(),
            self.storage.clone(),
            self.storage.clone(),
            self.storage.clone(),
            Some(self.model.clone() as Arc<dyn EmbeddingAdapter>),
            ContextSettings {
                order_lookup_limit: 10,
                order_sample_size: 50,
                product_top_k: 5,
                product_min_score: 0.3,
            },
        )
    }
}

#[tokio::test]
async fn email_match_beats_subject_number() {
    let fx = Fixture::new().await;
    fx.commerce.add_order(order(1, 1001, "ann@example.com")).await;
    fx.commerce.add_order(order(2, 2002, "other@example.com")).await;

    let message = inbound("msg", "ann@example.com", "About order #2002", "hi", Utc::now());
    let ctx = fx.resolver().resolve(&fx.merchant, &message).await;

    assert_eq!(ctx.orders.strategy, Some(OrderStrategy::SenderEmail));
    assert_eq!(ctx.orders.orders.len(), 1);
    assert_eq!(ctx.orders.orders[0].id, 1);
    assert_eq!(ctx.orders.matched_subject_number, None);
}

#[tokio::test]
async fn sampled_orders_match_email_case_insensitively() {
    let fx = Fixture::new().await;
    let mut placed = order(3, 3003, "someone@example.com");
    placed.shipping_email = Some("ANN@Example.com".into());
    fx.commerce.add_order(placed).await;

    let message = inbound("msg", "ann@example.com", "Parcel", "hi", Utc::now());
    let ctx = fx.resolver().resolve(&fx.merchant, &message).await;

    assert_eq!(ctx.orders.strategy, Some(OrderStrategy::SampledEmail));
    assert_eq!(ctx.orders.orders[0].id, 3);
    assert_eq!(ctx.orders.matched_subject_number, None);
}

#[tokio::test]
async fn subject_number_is_last_resort() {
    let fx = Fixture::new().await;
    fx.commerce.add_order(order(4, 4004, "gift-buyer@example.com")).await;

    let message = inbound("msg", "recipient@example.com", "Ordre #4004 damaged", "hi", Utc::now());
    let ctx = fx.resolver().resolve(&fx.merchant, &message).await;

    assert_eq!(ctx.orders.strategy, Some(OrderStrategy::SubjectNumber));
    assert_eq!(ctx.orders.matched_subject_number.as_deref(), Some("4004"));
    assert_eq!(ctx.orders.orders[0].id, 4);
}

#[tokio::test]
async fn commerce_failure_degrades_to_no_orders() {
    let fx = Fixture::new().await;
    fx.commerce.add_order(order(1, 1001, "ann@example.com")).await;
    fx.commerce.fail_reads(true).await;

    let message = inbound("msg", "ann@example.com", "Order 1001", "hi", Utc::now());
    let ctx = fx.resolver().resolve(&fx.merchant, &message).await;

    assert!(ctx.orders.orders.is_empty());
    assert_eq!(ctx.orders.strategy, None);
}

#[tokio::test]
async fn no_store_means_no_commerce_calls() {
    let fx = Fixture::new().await;
    let other = MerchantId("m-2".into());
    fx.storage.upsert_merchant(&other, "user_2").await.unwrap();

    let message = inbound("msg", "ann@example.com", "Order 1001", "hi", Utc::now());
    let ctx = fx.resolver().resolve(&other, &message).await;

    assert!(ctx.orders.orders.is_empty());
    assert_eq!(fx.commerce.call_count().await, 0);
}

#[tokio::test]
async fn products_respect_similarity_floor() {
    let fx = Fixture::new().await;
    let product = |id: &str, title: &str| Product {
        id: id.into(),
        title: title.into(),
        price: Some("10.00".into()),
        description: format!("{title} description"),
    };
    fx.storage
        .upsert_product(&fx.merchant, &product("p1", "Wool socks"), &[1.0, 0.0, 0.0])
        .await
        .unwrap();
    fx.storage
        .upsert_product(&fx.merchant, &product("p2", "Teapot"), &[0.0, 1.0, 0.0])
        .await
        .unwrap();

    let message = inbound("msg", "ann@example.com", "Socks", "Do your socks shrink?", Utc::now());
    let ctx = fx.resolver().resolve(&fx.merchant, &message).await;

    assert_eq!(ctx.products.len(), 1);
    assert_eq!(ctx.products[0].product.id, "p1");
    assert!(ctx.product_context().starts_with("Product: Wool socks | Price: 10.00"));
    assert_eq!(fx.model.embedding_calls(), 1);
}

#[tokio::test]
async fn embedding_failure_yields_empty_products() {
    let fx = Fixture::new().await;
    fx.model.set_embedding(None).await;
    let message = inbound("msg", "ann@example.com", "Socks", "question", Utc::now());
    let ctx = fx.resolver().resolve(&fx.merchant, &message).await;
    assert!(ctx.products.is_empty());
    assert_eq!(ctx.product_context(), "");
}

#[tokio::test]
async fn profile_uses_stored_values_or_defaults() {
    let fx = Fixture::new().await;
    let message = inbound("msg", "ann@example.com", "Hi", "question", Utc::now());

    let ctx = fx.resolver().resolve(&fx.merchant, &message).await;
    assert_eq!(ctx.profile.persona, Persona::default());
    assert_eq!(ctx.profile.automation, AutomationSettings::default());

    let persona = Persona {
        signature: "Best,\nMia at Sockshop".into(),
        tone_instructions: "Warm and brief".into(),
        example_scenario: String::new(),
    };
    fx.storage.set_persona(&fx.merchant, &persona).await.unwrap();
    let ctx = fx.resolver().resolve(&fx.merchant, &message).await;
    assert_eq!(ctx.profile.persona, persona);
}
