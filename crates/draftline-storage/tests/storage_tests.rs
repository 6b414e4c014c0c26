// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the SQLite storage adapter.

use chrono::{Duration, Utc};
use draftline_config::model::StorageConfig;
use draftline_core::types::{
    AutomationSettings, MailAccount, MailProviderKind, MerchantId, Persona, Product,
    StoreCredentials,
};
use draftline_core::{
    AdapterType, CredentialVault, HealthStatus, MailAccountStore, MerchantDirectory,
    PluginAdapter, ProductIndex, StorageAdapter,
};
use draftline_storage::SqliteStorage;
use secrecy::{ExposeSecret, SecretString};
use tempfile::tempdir;

fn make_config(path: &std::path::Path) -> StorageConfig {
    StorageConfig {
        database_path: path.to_str().unwrap().to_string(),
        wal_mode: true,
    }
}

#[tokio::test]
async fn lifecycle_through_plugin_adapter() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("lifecycle.db");
    let storage = SqliteStorage::new(make_config(&db_path));

    assert_eq!(storage.name(), "sqlite");
    assert_eq!(storage.adapter_type(), AdapterType::Storage);
    assert!(storage.health_check().await.is_err(), "not initialized yet");

    storage.initialize().await.unwrap();
    assert!(db_path.exists());
    assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    assert!(storage.initialize().await.is_err(), "second initialize should fail");

    storage.close().await.unwrap();
    storage.shutdown().await.unwrap();
}

#[tokio::test]
async fn eligible_merchants_require_master_flag() {
    let storage = SqliteStorage::in_memory().await.unwrap();
    let on = MerchantId("m-on".into());
    let off = MerchantId("m-off".into());
    let bare = MerchantId("m-bare".into());
    storage.upsert_merchant(&on, "user_on").await.unwrap();
    storage.upsert_merchant(&off, "user_off").await.unwrap();
    storage.upsert_merchant(&bare, "user_bare").await.unwrap();

    storage
        .set_automation_settings(
            &on,
            AutomationSettings {
                auto_draft_enabled: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    storage
        .set_automation_settings(&off, AutomationSettings::default())
        .await
        .unwrap();

    let eligible = storage.eligible_merchants(None).await.unwrap();
    assert_eq!(eligible.len(), 1);
    assert_eq!(eligible[0].id, on);
    assert!(storage.eligible_merchants(Some(0)).await.unwrap().is_empty());

    let resolved = storage.resolve_merchant("user_bare").await.unwrap().unwrap();
    assert_eq!(resolved.id, bare);
    assert!(storage.resolve_merchant("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn merchant_configuration_reads_back() {
    let storage = SqliteStorage::in_memory().await.unwrap();
    let merchant = MerchantId("m1".into());
    storage.upsert_merchant(&merchant, "user_1").await.unwrap();

    assert!(storage.persona(&merchant).await.unwrap().is_none());
    let persona = Persona {
        signature: "-- Ana, Sunny Socks".into(),
        tone_instructions: "Warm and brief.".into(),
        example_scenario: String::new(),
    };
    storage.set_persona(&merchant, &persona).await.unwrap();
    assert_eq!(storage.persona(&merchant).await.unwrap(), Some(persona));
    assert!(storage.policies(&merchant).await.unwrap().is_none());
}

#[tokio::test]
async fn refreshed_tokens_keep_refresh_token_unless_rotated() {
    let storage = SqliteStorage::in_memory().await.unwrap();
    let merchant = MerchantId("m1".into());
    storage.upsert_merchant(&merchant, "user_1").await.unwrap();
    storage
        .upsert_mail_account(&MailAccount {
            merchant_id: merchant.clone(),
            provider: MailProviderKind::Gmail,
            email_address: "shop@example.com".into(),
            access_token: Some(SecretString::from("old-access".to_string())),
            refresh_token: Some(SecretString::from("refresh-1".to_string())),
            expires_at: Some(Utc::now() - Duration::minutes(5)),
        })
        .await
        .unwrap();

    let expires = Utc::now() + Duration::hours(1);
    storage
        .update_tokens(&merchant, MailProviderKind::Gmail, "new-access", None, expires)
        .await
        .unwrap();

    let account = storage
        .mail_account(&merchant, MailProviderKind::Gmail)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.access_token.unwrap().expose_secret(), "new-access");
    assert_eq!(account.refresh_token.unwrap().expose_secret(), "refresh-1");
    assert_eq!(
        storage.linked_providers(&merchant).await.unwrap(),
        vec![MailProviderKind::Gmail]
    );

    let missing = storage
        .update_tokens(&merchant, MailProviderKind::Outlook, "x", None, expires)
        .await;
    assert!(missing.is_err());
}

#[tokio::test]
async fn store_credentials_round_trip() {
    let storage = SqliteStorage::in_memory().await.unwrap();
    let merchant = MerchantId("m1".into());
    storage.upsert_merchant(&merchant, "user_1").await.unwrap();
    assert!(storage.store_credentials(&merchant).await.unwrap().is_none());

    storage
        .set_store_credentials(
            &merchant,
            &StoreCredentials {
                shop_domain: "sunny-socks.myshopify.com".into(),
                access_token: SecretString::from("shpat_123".to_string()),
            },
        )
        .await
        .unwrap();
    let creds = storage.store_credentials(&merchant).await.unwrap().unwrap();
    assert_eq!(creds.shop_domain, "sunny-socks.myshopify.com");
    assert_eq!(creds.access_token.expose_secret(), "shpat_123");
}

#[tokio::test]
async fn product_search_applies_floor_and_top_k() {
    let storage = SqliteStorage::in_memory().await.unwrap();
    let merchant = MerchantId("m1".into());
    storage.upsert_merchant(&merchant, "user_1").await.unwrap();

    let product = |id: &str, title: &str| Product {
        id: id.into(),
        title: title.into(),
        price: Some("12.00".into()),
        description: String::new(),
    };
    storage
        .upsert_product(&merchant, &product("p1", "Wool socks"), &[1.0, 0.0, 0.0])
        .await
        .unwrap();
    storage
        .upsert_product(&merchant, &product("p2", "Cotton socks"), &[0.8, 0.6, 0.0])
        .await
        .unwrap();
    storage
        .upsert_product(&merchant, &product("p3", "Gift card"), &[0.0, 0.0, 1.0])
        .await
        .unwrap();

    let hits = storage.search(&merchant, &[1.0, 0.0, 0.0], 5, 0.3).await.unwrap();
    let titles: Vec<&str> = hits.iter().map(|m| m.product.title.as_str()).collect();
    assert_eq!(titles, vec!["Wool socks", "Cotton socks"]);

    let top_one = storage.search(&merchant, &[1.0, 0.0, 0.0], 1, 0.3).await.unwrap();
    assert_eq!(top_one.len(), 1);

    let other = MerchantId("m2".into());
    assert!(storage.search(&other, &[1.0, 0.0, 0.0], 5, 0.0).await.unwrap().is_empty());
}
