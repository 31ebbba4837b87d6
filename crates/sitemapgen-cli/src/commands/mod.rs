//! Command implementations for the sitemapgen CLI

mod check;
mod config;
mod generate;

pub use check::run as run_check;
pub use config::run as run_config;
pub use generate::execute as generate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sitemapgen_core::GeneratorConfig;

use crate::error::CliError;

/// Resolve the configuration file location: explicit path or platform default.
pub(crate) fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(GeneratorConfig::default_path()?),
    }
}

/// Load the configuration and apply environment overrides.
///
/// An explicitly named file must exist; the default location may be absent.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<GeneratorConfig> {
    let path = config_path(explicit)?;

    let mut config = if explicit.is_some() {
        if !path.exists() {
            return Err(CliError::not_found(anyhow::anyhow!(
                "configuration file not found: {}",
                path.display()
            ))
            .into());
        }
        GeneratorConfig::load(&path)
    } else {
        GeneratorConfig::load_or_default(&path)
    }
    .with_context(|| format!("failed to load configuration from {}", path.display()))?;

    config.apply_env_overrides();
    Ok(config)
}
