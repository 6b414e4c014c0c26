// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::DraftlineConfig;

/// Longest message body excerpt sent to the classification model.
pub const MAX_CLASSIFIER_BODY_CHARS: usize = 500;

/// Validate a deserialized configuration, collecting every problem.
pub fn validate_config(config: &DraftlineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        fail(format!("gateway.host `{host}` is not a valid IP address or hostname"));
    }

    for (key, secret) in [
        ("gateway.cron_secret", &config.gateway.cron_secret),
        ("gateway.internal_secret", &config.gateway.internal_secret),
    ] {
        if secret.as_deref().is_some_and(|s| s.trim().is_empty()) {
            fail(format!("{key} must not be blank when set"));
        }
    }

    for (key, value) in [
        ("openai.base_url", &config.openai.base_url),
        ("gmail.token_url", &config.gmail.token_url),
        ("gmail.api_base", &config.gmail.api_base),
        ("outlook.token_url", &config.outlook.token_url),
        ("outlook.api_base", &config.outlook.api_base),
    ] {
        if url::Url::parse(value).is_err() {
            fail(format!("{key} `{value}` is not a valid URL"));
        }
    }

    if let Some(endpoint) = &config.scheduler.draft_endpoint
        && url::Url::parse(endpoint).is_err()
    {
        fail(format!("scheduler.draft_endpoint `{endpoint}` is not a valid URL"));
    }

    if let Some(expr) = &config.scheduler.cron
        && expr.parse::<croner::Cron>().is_err()
    {
        fail(format!("scheduler.cron `{expr}` is not a valid cron expression"));
    }

    if config.scheduler.max_messages_per_run == 0 {
        fail("scheduler.max_messages_per_run must be at least 1".to_string());
    }

    if !matches!(config.shopify.scheme.as_str(), "http" | "https") {
        fail(format!(
            "shopify.scheme must be `http` or `https`, got `{}`",
            config.shopify.scheme
        ));
    }

    let pipeline = &config.pipeline;
    if !(0.0..=1.0).contains(&pipeline.product_min_score) {
        fail(format!(
            "pipeline.product_min_score must be between 0.0 and 1.0, got {}",
            pipeline.product_min_score
        ));
    }
    if !(0.0..=2.0).contains(&pipeline.generation_temperature) {
        fail(format!(
            "pipeline.generation_temperature must be between 0.0 and 2.0, got {}",
            pipeline.generation_temperature
        ));
    }
    if !(1..=MAX_CLASSIFIER_BODY_CHARS).contains(&pipeline.classifier_body_chars) {
        fail(format!(
            "pipeline.classifier_body_chars must be between 1 and {MAX_CLASSIFIER_BODY_CHARS}, got {}",
            pipeline.classifier_body_chars
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
