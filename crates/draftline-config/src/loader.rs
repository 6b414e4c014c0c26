// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered config loading with Figment.
//!
//! Lookup order: `/etc/draftline/draftline.toml`, then
//! `~/.config/draftline/draftline.toml`, then `./draftline.toml`, with
//! `DRAFTLINE_*` environment variables on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DraftlineConfig;

/// Top-level sections that environment variables may address.
const SECTIONS: &[&str] = &[
    "service",
    "storage",
    "gateway",
    "openai",
    "gmail",
    "outlook",
    "shopify",
    "pipeline",
    "scheduler",
];

/// Config files consulted by [`load_config`], lowest precedence first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/draftline/draftline.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("draftline").join("draftline.toml"));
    }
    paths.push(PathBuf::from("draftline.toml"));
    paths
}

/// Build the Figment used by [`load_config`] without extracting it.
pub fn build_figment() -> Figment {
    config_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(DraftlineConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<DraftlineConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<DraftlineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DraftlineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file, still honoring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<DraftlineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DraftlineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Map `DRAFTLINE_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `DRAFTLINE_GATEWAY_CRON_SECRET` lands on `gateway.cron_secret`.
fn env_provider() -> Env {
    Env::prefixed("DRAFTLINE_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    // Figment hands over the variable name in its original case.
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(map_env_key("gateway_cron_secret"), "gateway.cron_secret");
        assert_eq!(
            map_env_key("scheduler_max_messages_per_run"),
            "scheduler.max_messages_per_run"
        );
        assert_eq!(map_env_key("openai_api_key"), "openai.api_key");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn env_keys_are_lowercased_before_mapping() {
        assert_eq!(map_env_key("GATEWAY_PORT"), "gateway.port");
        assert_eq!(map_env_key("Service_Log_Level"), "service.log_level");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("draftline.toml", "[gateway]\nport = 9000\n")?;
            jail.set_env("DRAFTLINE_GATEWAY_PORT", "9100");
            jail.set_env("DRAFTLINE_OUTLOOK_RECONCILE_DRAFTS", "true");
            let config = load_config_from_path(Path::new("draftline.toml"))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.gateway.port, 9100);
            assert!(config.outlook.reconcile_drafts);
            Ok(())
        });
    }
}
