//! `sitemapgen check`: run a single validator from the shell.

use anyhow::{Context, Result};
use colored::Colorize;
use sitemapgen_core::{validate_base_url, validate_change_frequency, validate_priority, validate_url};

use crate::cli::CheckCommand;

pub fn run(command: &CheckCommand) -> Result<()> {
    let normalized = match command {
        CheckCommand::Priority { value } => validate_priority(value.as_str())
            .with_context(|| format!("'{value}' is not a valid priority"))?
            .to_string(),
        CheckCommand::Changefreq { value } => validate_change_frequency(value)
            .with_context(|| format!("'{value}' is not a valid change frequency"))?
            .to_string(),
        CheckCommand::Url { base_url, location } => {
            let base = validate_base_url(base_url)?;
            validate_url(&base, location)
                .with_context(|| format!("'{location}' is not a valid location under {base}"))?
                .to_string()
        },
    };

    println!("{} {normalized}", "valid:".green());
    Ok(())
}
