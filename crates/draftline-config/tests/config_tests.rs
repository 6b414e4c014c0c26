// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Draftline configuration system.

use draftline_config::diagnostic::ConfigError;
use draftline_config::model::DraftlineConfig;
use draftline_config::{load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[service]
name = "draftline-staging"
log_level = "debug"

[storage]
database_path = "/tmp/draftline-test.db"
wal_mode = false

[gateway]
host = "0.0.0.0"
port = 9090
cron_secret = "cron"
internal_secret = "internal"

[openai]
api_key = "sk-test"
base_url = "http://localhost:4000/v1"
chat_model = "gpt-4o"

[gmail]
client_id = "gid"
client_secret = "gsecret"

[outlook]
client_id = "oid"
reconcile_drafts = true

[shopify]
api_version = "2025-01"

[pipeline]
order_sample_size = 25
product_top_k = 3

[scheduler]
max_messages_per_run = 2
draft_endpoint = "http://drafts.internal/v1/drafts"
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should load");
    assert_eq!(config.service.name, "draftline-staging");
    assert_eq!(config.storage.database_path, "/tmp/draftline-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.gateway.port, 9090);
    assert_eq!(config.gateway.cron_secret.as_deref(), Some("cron"));
    assert_eq!(config.openai.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.openai.chat_model, "gpt-4o");
    assert_eq!(config.gmail.client_id.as_deref(), Some("gid"));
    assert!(config.outlook.reconcile_drafts);
    assert_eq!(config.shopify.api_version, "2025-01");
    assert_eq!(config.pipeline.order_sample_size, 25);
    assert_eq!(config.pipeline.product_top_k, 3);
    assert_eq!(config.scheduler.max_messages_per_run, 2);
    assert_eq!(
        config.scheduler.draft_endpoint.as_deref(),
        Some("http://drafts.internal/v1/drafts")
    );
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.service.log_level, "info");
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert!(config.gateway.internal_secret.is_none());
    assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
    assert_eq!(config.pipeline.order_sample_size, 50);
    assert_eq!(config.pipeline.product_top_k, 5);
    assert!((config.pipeline.product_min_score - 0.3).abs() < f32::EPSILON);
    assert_eq!(config.scheduler.max_messages_per_run, 5);
    assert!(config.scheduler.cron.is_none());
}

#[test]
fn unknown_key_gets_suggestion() {
    let toml = r#"
[scheduler]
max_mesages_per_run = 3
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { suggestion, .. } => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("max_messages_per_run"));
}

#[test]
fn unknown_section_is_rejected() {
    let errors = load_and_validate_str("[telegram]\nbot_token = \"x\"\n")
        .expect_err("unknown section should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::UnknownKey { key, .. } if key == "telegram"))
    );
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[gateway]\nport = \"eighty\"\n")
        .expect_err("string port should fail");
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn validation_runs_after_parse() {
    let errors = load_and_validate_str("[scheduler]\ndraft_endpoint = \"not a url\"\n")
        .expect_err("bad endpoint should fail validation");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
fn defaults_round_trip_through_toml() {
    let rendered = toml::to_string(&DraftlineConfig::default()).expect("serialize defaults");
    let reparsed = load_config_from_str(&rendered).expect("defaults should parse back");
    assert_eq!(reparsed.pipeline.product_top_k, 5);
}
