//! `sitemapgen generate`: read a URL list and write sitemaps.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use sitemapgen_core::numeric::format_bytes;
use sitemapgen_core::{
    FileKind, GeneratedFile, LocalFileStore, PingOutcome, PriorityValue, SitemapSession, UrlInput,
    parse_timestamp, size_delta_percent,
};
use tracing::{debug, warn};

use super::load_config;
use crate::cli::{GenerateArgs, OutputFormat};
use crate::error::CliError;

/// One JSON input line.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InputRecord {
    loc: String,
    #[serde(default)]
    lastmod: Option<String>,
    #[serde(default)]
    changefreq: Option<String>,
    #[serde(default)]
    priority: Option<RawPriority>,
    #[serde(default)]
    alternates: Vec<InputAlternate>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPriority {
    Number(f64),
    Text(String),
}

impl From<RawPriority> for PriorityValue {
    fn from(raw: RawPriority) -> Self {
        match raw {
            RawPriority::Number(n) => Self::Number(n),
            RawPriority::Text(s) => Self::Text(s),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InputAlternate {
    hreflang: String,
    href: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    base_url: String,
    index_url: String,
    urls: usize,
    skipped: usize,
    generated_files: &'a [GeneratedFile],
    #[serde(skip_serializing_if = "Option::is_none")]
    robots_file: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pings: Vec<PingOutcome>,
}

pub async fn execute(args: &GenerateArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(base_url) = &args.base_url {
        config.site.base_url.clone_from(base_url);
    }
    if let Some(output_dir) = &args.output_dir {
        config.site.output_dir.clone_from(output_dir);
    }
    if args.stylesheet.is_some() {
        config.files.stylesheet.clone_from(&args.stylesheet);
    }

    let mut session = SitemapSession::new(&config)?;
    configure_session(&mut session, args)?;

    let input = read_input(args.input.as_deref())?;
    let (urls, skipped) = add_records(&mut session, &input, args.skip_invalid)?;

    session.finalize().map_err(|e| {
        if e.is_illegal_state() {
            anyhow::Error::new(e).context("no URLs were added; nothing to write")
        } else {
            e.into()
        }
    })?;

    let robots_file = if args.update_robots {
        session.update_robots()?;
        Some(session.robots_filename().to_string())
    } else {
        None
    };

    let pings = if args.submit {
        session.submit_sitemap().await?
    } else {
        Vec::new()
    };

    let summary = Summary {
        base_url: session.base_url().to_string(),
        index_url: session.index_url(),
        urls,
        skipped,
        generated_files: session.generated_files(),
        robots_file: robots_file.as_deref(),
        pings,
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_text(&summary, &config.site.output_dir),
    }
    Ok(())
}

fn configure_session(session: &mut SitemapSession<LocalFileStore>, args: &GenerateArgs) -> Result<()> {
    if let Some(max_urls) = args.max_urls {
        session.set_max_urls_per_sitemap(max_urls)?;
    }
    if let Some(max_bytes) = args.max_bytes {
        session.set_max_sitemap_bytes(max_bytes)?;
    }
    if args.compress {
        session.enable_compression()?;
    } else if args.no_compress {
        session.disable_compression()?;
    }
    if let Some(name) = &args.sitemap_filename {
        session.set_sitemap_filename(name)?;
    }
    if let Some(name) = &args.index_filename {
        session.set_sitemap_index_filename(name)?;
    }
    if let Some(name) = &args.robots_filename {
        session.set_robots_filename(name)?;
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        None => read_stdin(),
        Some(p) if p.as_os_str() == "-" => read_stdin(),
        Some(p) => {
            if !p.exists() {
                return Err(CliError::not_found(anyhow!("input file not found: {}", p.display())).into());
            }
            fs::read_to_string(p).with_context(|| format!("failed to read {}", p.display()))
        },
    }
}

fn read_stdin() -> Result<String> {
    io::read_to_string(io::stdin()).context("failed to read URL list from stdin")
}

/// Feed every record to the session, returning `(added, skipped)`.
fn add_records(
    session: &mut SitemapSession<LocalFileStore>,
    input: &str,
    skip_invalid: bool,
) -> Result<(usize, usize)> {
    let mut added = 0;
    let mut skipped = 0;

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let outcome = parse_record(line)
            .and_then(|record| session.add_entry(record).map_err(anyhow::Error::from));
        match outcome {
            Ok(()) => added += 1,
            Err(e) if skip_invalid && is_record_error(&e) => {
                warn!(line = line_no, error = %e, "Skipping invalid record");
                skipped += 1;
            },
            Err(e) => return Err(e.context(format!("line {line_no}"))),
        }
    }

    debug!(added, skipped, "Read URL list");
    Ok((added, skipped))
}

fn is_record_error(err: &anyhow::Error) -> bool {
    if err.downcast_ref::<CliError>().is_some() {
        return true;
    }
    err.downcast_ref::<sitemapgen_core::Error>()
        .is_some_and(sitemapgen_core::Error::is_invalid_argument)
}

fn parse_record(line: &str) -> Result<UrlInput> {
    if !line.starts_with('{') {
        return Ok(UrlInput::new(line));
    }

    let record: InputRecord = serde_json::from_str(line).map_err(CliError::usage)?;

    let mut input = UrlInput::new(record.loc);
    if let Some(raw) = record.lastmod {
        let at = parse_timestamp(&raw)
            .ok_or_else(|| CliError::usage(anyhow!("invalid lastmod '{raw}'")))?;
        input = input.last_modified(at);
    }
    if let Some(token) = record.changefreq {
        input = input.change_frequency(token);
    }
    if let Some(priority) = record.priority {
        input = input.priority(priority);
    }
    for alt in record.alternates {
        input = input.alternate(alt.hreflang, alt.href);
    }
    Ok(input)
}

fn print_text(summary: &Summary<'_>, output_dir: &Path) {
    println!(
        "{} {} URLs into {} files in {}",
        "Wrote".green().bold(),
        summary.urls,
        summary.generated_files.len(),
        output_dir.display()
    );

    for file in summary.generated_files {
        let kind = match file.kind {
            FileKind::Sitemap => "urls",
            FileKind::Index => "sitemaps",
        };
        let mut line = format!(
            "  {}  {} {kind}  {}",
            file.filename.bold(),
            file.records,
            format_bytes(file.written_bytes)
        );
        let delta = size_delta_percent(file.uncompressed_bytes, file.written_bytes)
            .filter(|_| file.compressed);
        if let Some(delta) = delta {
            let _ = write!(line, " ({delta:+.1}% of {})", format_bytes(file.uncompressed_bytes));
        }
        println!("{line}");
    }

    if summary.skipped > 0 {
        println!("{} {} invalid records", "Skipped".yellow(), summary.skipped);
    }
    println!("Index: {}", summary.index_url.cyan());
    if let Some(robots) = summary.robots_file {
        println!("Robots: {robots} updated");
    }
    for ping in &summary.pings {
        let status = if ping.success {
            ping.status.to_string().green()
        } else {
            ping.status.to_string().red()
        };
        println!("Ping {}: {status} ({}ms)", ping.engine, ping.elapsed_ms);
    }
}
