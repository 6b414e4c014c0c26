// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `draftline config check` command implementation.
//!
//! Configuration has already been loaded and validated by the time this runs;
//! the checks here cover what validation cannot see: whether the database
//! opens, which integrations are actually usable, and whether the gateway
//! would accept any trigger at all.

use std::path::Path;
use std::time::{Duration, Instant};

use draftline_config::model::{DraftlineConfig, StorageConfig};
use draftline_core::error::DraftlineError;
use draftline_core::types::HealthStatus;
use draftline_core::{PluginAdapter, StorageAdapter};
use draftline_openai::OpenAiProvider;
use draftline_storage::SqliteStorage;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Runs the `draftline config check` command. Fails when any check fails.
pub async fn run_check(config: &DraftlineConfig) -> Result<(), DraftlineError> {
    let mut results = vec![CheckResult::new(
        "Configuration",
        CheckStatus::Pass,
        "loaded and validated",
        Instant::now(),
    )];
    results.push(check_database(&config.storage).await);
    results.push(check_model(config));
    results.extend(static_checks(config));

    println!();
    println!("  draftline config check");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;
    for result in &results {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => {
                warn_count += 1;
                "[WARN]"
            }
            CheckStatus::Fail => {
                fail_count += 1;
                "[FAIL]"
            }
        };
        println!(
            "    {tag} {:<20} {} ({}ms)",
            result.name,
            result.message,
            result.duration.as_millis()
        );
    }

    println!("  {}", "-".repeat(50));
    println!("  {} checks, {warn_count} warnings, {fail_count} failures", results.len());
    println!();

    if fail_count > 0 {
        return Err(DraftlineError::Config(format!("{fail_count} check(s) failed")));
    }
    Ok(())
}

async fn check_database(storage_config: &StorageConfig) -> CheckResult {
    let start = Instant::now();
    let db_path = &storage_config.database_path;
    let existed = Path::new(db_path).exists();
    let storage = SqliteStorage::new(storage_config.clone());

    if let Err(e) = storage.initialize().await {
        return CheckResult::new("Database", CheckStatus::Fail, e.to_string(), start);
    }
    let health = storage.health_check().await;
    let _ = storage.close().await;

    match health {
        Ok(HealthStatus::Healthy) => {
            let message = if existed {
                format!("{db_path} is up to date")
            } else {
                format!("{db_path} created")
            };
            CheckResult::new("Database", CheckStatus::Pass, message, start)
        }
        Ok(HealthStatus::Degraded(detail)) => {
            CheckResult::new("Database", CheckStatus::Warn, detail, start)
        }
        Ok(HealthStatus::Unhealthy(detail)) => {
            CheckResult::new("Database", CheckStatus::Fail, detail, start)
        }
        Err(e) => CheckResult::new("Database", CheckStatus::Fail, e.to_string(), start),
    }
}

fn check_model(config: &DraftlineConfig) -> CheckResult {
    let start = Instant::now();
    match OpenAiProvider::from_config(&config.openai) {
        Ok(Some(_)) => CheckResult::new(
            "Model API",
            CheckStatus::Pass,
            format!("{} via {}", config.openai.chat_model, config.openai.base_url),
            start,
        ),
        Ok(None) => CheckResult::new(
            "Model API",
            CheckStatus::Warn,
            "no API key; non-rule messages are rejected and replies use the template",
            start,
        ),
        Err(e) => CheckResult::new("Model API", CheckStatus::Fail, e.to_string(), start),
    }
}

/// Checks that need no I/O.
fn static_checks(config: &DraftlineConfig) -> Vec<CheckResult> {
    let start = Instant::now();
    let mut results = Vec::new();

    for (name, client_id, client_secret) in [
        ("Gmail OAuth", &config.gmail.client_id, &config.gmail.client_secret),
        ("Outlook OAuth", &config.outlook.client_id, &config.outlook.client_secret),
    ] {
        let result = if client_id.is_some() && client_secret.is_some() {
            CheckResult::new(name, CheckStatus::Pass, "client configured", start)
        } else {
            CheckResult::new(
                name,
                CheckStatus::Warn,
                "client id or secret missing; expired tokens cannot be refreshed",
                start,
            )
        };
        results.push(result);
    }

    let secrets = [&config.gateway.cron_secret, &config.gateway.internal_secret]
        .iter()
        .filter(|s| s.as_deref().is_some_and(|s| !s.is_empty()))
        .count();
    results.push(match secrets {
        0 => CheckResult::new(
            "Gateway secrets",
            CheckStatus::Warn,
            "none set; every trigger request will be refused",
            start,
        ),
        _ => CheckResult::new("Gateway secrets", CheckStatus::Pass, format!("{secrets} of 2 set"), start),
    });

    results.push(match &config.scheduler.cron {
        None => CheckResult::new("Schedule", CheckStatus::Pass, "external trigger only", start),
        Some(expr) => match draftline_cron::parse_schedule(expr) {
            Ok(_) => CheckResult::new("Schedule", CheckStatus::Pass, format!("in-process poller `{expr}`"), start),
            Err(e) => CheckResult::new("Schedule", CheckStatus::Fail, e.to_string(), start),
        },
    });

    results
}
