//! `sitemapgen config`: create and inspect the configuration file.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use sitemapgen_core::{GeneratorConfig, validate_base_url};

use super::{config_path, load_config};
use crate::cli::{ConfigCommand, OutputFormat};
use crate::error::CliError;

pub fn run(command: ConfigCommand, explicit: Option<&Path>) -> Result<()> {
    match command {
        ConfigCommand::Init { base_url, force } => init(explicit, base_url, force),
        ConfigCommand::Show { format } => show(explicit, format),
        ConfigCommand::Path => {
            println!("{}", config_path(explicit)?.display());
            Ok(())
        },
    }
}

fn init(explicit: Option<&Path>, base_url: Option<String>, force: bool) -> Result<()> {
    let path = config_path(explicit)?;
    if path.exists() && !force {
        return Err(CliError::usage(anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ))
        .into());
    }

    let mut config = GeneratorConfig::default();
    if let Some(base_url) = base_url {
        config.site.base_url = validate_base_url(&base_url)?.to_string();
    }

    config.save(&path)?;
    tracing::info!(path = %path.display(), "Wrote configuration");
    println!("{}", path.display());
    Ok(())
}

fn show(explicit: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = load_config(explicit)?;

    let rendered = match format {
        OutputFormat::Text => {
            toml::to_string_pretty(&config).context("failed to render configuration")?
        },
        OutputFormat::Json => {
            serde_json::to_string_pretty(&config).context("failed to render configuration")?
        },
    };
    println!("{}", rendered.trim_end());
    Ok(())
}
