// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for Draftline.
//!
//! TOML files in the XDG hierarchy, `DRAFTLINE_*` environment overrides,
//! strict unknown-key rejection and miette diagnostics with typo hints.
//!
//! ```no_run
//! use draftline_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("listening on {}:{}", config.gateway.host, config.gateway.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::DraftlineConfig;

/// Load from the standard hierarchy and validate.
pub fn load_and_validate() -> Result<DraftlineConfig, Vec<ConfigError>> {
    finish(loader::load_config())
}

/// Load from an explicit file (plus env overrides) and validate.
pub fn load_and_validate_path(path: &Path) -> Result<DraftlineConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path))
}

/// Load from a TOML string and validate.
pub fn load_and_validate_str(toml_content: &str) -> Result<DraftlineConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content))
}

#[allow(clippy::result_large_err)]
fn finish(
    loaded: Result<DraftlineConfig, figment::Error>,
) -> Result<DraftlineConfig, Vec<ConfigError>> {
    let config = loaded.map_err(diagnostic::figment_to_config_errors)?;
    validation::validate_config(&config)?;
    Ok(config)
}
