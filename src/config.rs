// src/config.rs

//! Configuration loading utilities.
//!
//! Resolution order: TOML file, then environment overrides, then validation.

use std::path::Path;

use crate::error::Result;
use crate::models::Config;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "pathwise.toml";

/// Load, overlay the environment and validate.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    resolve(base_config(path)?, |key| std::env::var(key).ok())
}

/// Load and overlay the environment without validating.
pub fn read_config(path: Option<&Path>) -> Result<Config> {
    Ok(base_config(path)?.with_env_from(|key| std::env::var(key).ok()))
}

/// An explicit path must load; a broken default file falls back to
/// defaults with a warning and a missing one is skipped.
fn base_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path).map_err(|e| {
            log::error!("Config load failed from {}: {}", path.display(), e);
            e
        }),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            Ok(Config::load_or_default(DEFAULT_CONFIG_FILE))
        }
        None => Ok(Config::default()),
    }
}

/// Apply overrides from `lookup` and validate the result.
pub fn resolve(base: Config, lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let config = base.with_env_from(lookup);
    config.validate()?;
    log::debug!(
        "Config resolved: api={} static={} timeout={}ms",
        config.api.base_url,
        config.api.static_base,
        config.api.timeout_ms
    );
    Ok(config)
}
