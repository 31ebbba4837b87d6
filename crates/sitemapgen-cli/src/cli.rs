//! # CLI Structure and Argument Parsing
//!
//! ```bash
//! # Build sitemaps from a URL list, one path per line
//! sitemapgen generate urls.txt --base-url https://example.com -o public
//!
//! # Read JSON records from stdin, gzip chunks, patch robots.txt and ping engines
//! cat pages.jsonl | sitemapgen generate --compress --update-robots --submit
//!
//! # Configuration
//! sitemapgen config init --base-url https://example.com
//! sitemapgen config show
//!
//! # Validators
//! sitemapgen check priority 0.8
//! sitemapgen check changefreq weekly
//! ```
//!
//! Settings are resolved in order: configuration file (`--config`, then
//! `SITEMAPGEN_CONFIG`, then the platform default), environment overrides,
//! then command-line flags.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Main CLI structure for the `sitemapgen` command.
#[derive(Parser, Clone, Debug)]
#[command(name = "sitemapgen")]
#[command(version)]
#[command(about = "Build chunked sitemaps and a sitemap index from a URL list", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Configuration file
    #[arg(long, global = true, env = "SITEMAPGEN_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Output format for command results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// A single JSON document
    Json,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Generate sitemap chunks and the sitemap index
    Generate(GenerateArgs),

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Validate a single value
    Check {
        #[command(subcommand)]
        command: CheckCommand,
    },
}

/// Arguments for `sitemapgen generate`.
#[derive(Args, Clone, Debug, Default)]
pub struct GenerateArgs {
    /// URL list; reads stdin when omitted or `-`
    ///
    /// One record per line: either a bare path (`/about`) or a JSON object
    /// with `loc` and optional `lastmod`, `changefreq`, `priority`,
    /// `alternates`. Blank lines and lines starting with `#` are ignored.
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Public base URL of the site
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Directory to write files into
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum URLs per sitemap file (1-50000)
    #[arg(long, value_name = "N")]
    pub max_urls: Option<usize>,

    /// Maximum uncompressed bytes per sitemap file
    #[arg(long, value_name = "BYTES")]
    pub max_bytes: Option<usize>,

    /// Gzip sitemap chunks
    #[arg(long, conflicts_with = "no_compress")]
    pub compress: bool,

    /// Write plain sitemap chunks even if the configuration enables gzip
    #[arg(long)]
    pub no_compress: bool,

    /// Chunk filename (numbered chunks become NAME1.xml, NAME2.xml, ...)
    #[arg(long, value_name = "NAME")]
    pub sitemap_filename: Option<String>,

    /// Index filename
    #[arg(long, value_name = "NAME")]
    pub index_filename: Option<String>,

    /// Robots filename
    #[arg(long, value_name = "NAME")]
    pub robots_filename: Option<String>,

    /// XSL stylesheet referenced from every document
    #[arg(long, value_name = "HREF")]
    pub stylesheet: Option<String>,

    /// Add the index to the robots file after finalizing
    #[arg(long)]
    pub update_robots: bool,

    /// Notify search engines after finalizing
    #[arg(long)]
    pub submit: bool,

    /// Skip invalid records with a warning instead of failing
    #[arg(long)]
    pub skip_invalid: bool,

    /// Summary format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigCommand {
    /// Write a configuration file with default values
    Init {
        /// Base URL to store in the new file
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the configuration file location
    Path,
}

#[derive(Subcommand, Clone, Debug)]
pub enum CheckCommand {
    /// Check a priority value (0.0, 0.1, ..., 1.0)
    Priority {
        /// Value to check
        value: String,
    },

    /// Check a change frequency token
    Changefreq {
        /// Token to check
        value: String,
    },

    /// Resolve and check a location against a base URL
    Url {
        /// Base URL of the site
        base_url: String,
        /// Path or URL to check
        location: String,
    },
}
