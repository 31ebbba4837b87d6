//! The generation session: one pass from URLs to published sitemap files.
//!
//! A session starts out **collecting**. Every added URL is validated and
//! buffered; whenever the open chunk reaches its entry or byte limit it is
//! rendered, written through the [`FileStore`], and recorded in the index.
//! [`finalize`](SitemapSession::finalize) writes the remaining chunk and the
//! index and moves the session to **finalized**. Only then can the robots file
//! be patched or search engines notified, each any number of times.
//!
//! ```rust
//! use sitemapgen_core::{GeneratorConfig, MemoryFileStore, SessionState, SitemapSession};
//!
//! let mut config = GeneratorConfig::default();
//! config.site.base_url = "http://example.com".into();
//!
//! let mut session = SitemapSession::with_store(&config, MemoryFileStore::new())?;
//! assert!(session.update_robots().unwrap_err().is_illegal_state());
//!
//! session.add_url("/product/", None, Some("always"), Some(0.8.into()))?;
//! session.finalize()?;
//! session.update_robots()?;
//!
//! let robots = session.store().get("robots.txt").unwrap();
//! assert!(String::from_utf8_lossy(robots)
//!     .contains("Sitemap: http://example.com/sitemap_index.xml"));
//! assert_eq!(
//!     session.state(),
//!     SessionState::Finalized { robots_updated: true, submitted: false }
//! );
//! # Ok::<(), sitemapgen_core::Error>(())
//! ```
//!
//! ## Failure handling
//!
//! Invalid arguments and out-of-sequence calls leave the session untouched.
//! Store, compression and network failures surface immediately and are not
//! rolled back: chunks already written stay written. A chunk whose write
//! failed goes back into the buffer and the triggering URL is not added, so
//! repeating the failed call resumes where it stopped.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};
use url::Url;

use crate::buffer::{Chunk, EntryBuffer};
use crate::compress::{Compressor, GzipCompressor};
use crate::config::GeneratorConfig;
use crate::index::IndexBuilder;
use crate::numeric::{format_bytes, size_delta_percent, usize_to_u64};
use crate::ping::{HttpPingClient, PingClient, PingOutcome, SearchEngine, ping_all};
use crate::render::ChunkRenderer;
use crate::robots::patch_robots;
use crate::storage::{FileStore, LocalFileStore};
use crate::types::{FileKind, GeneratedFile, PriorityValue, UrlEntry, UrlInput};
use crate::validate::{
    validate_alternate, validate_change_frequency, validate_distinct_filenames, validate_filename,
    validate_priority, validate_url,
};
use crate::{Error, Result};

/// Observable lifecycle state of a [`SitemapSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepting URLs.
    Collecting,
    /// Chunks and index are written.
    Finalized {
        /// The robots file references the index.
        robots_updated: bool,
        /// Search engines have been notified at least once.
        submitted: bool,
    },
}

impl SessionState {
    /// Short name for logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collecting => "collecting",
            Self::Finalized { .. } => "finalized",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum Lifecycle {
    Collecting(EntryBuffer),
    Finalized(Finalized),
}

#[derive(Debug, Clone, Copy, Default)]
struct Finalized {
    robots_updated: bool,
    submitted: bool,
}

/// Output filenames of a session.
#[derive(Debug, Clone)]
struct SessionFiles {
    sitemap: String,
    index: String,
    robots: String,
}

impl SessionFiles {
    /// `sitemap.xml` for a lone chunk, `sitemapN.xml` when numbered.
    fn chunk_filename(&self, sequence: usize, numbered: bool) -> String {
        if numbered {
            let stem = self.sitemap.strip_suffix(".xml").unwrap_or(&self.sitemap);
            format!("{stem}{sequence}.xml")
        } else {
            self.sitemap.clone()
        }
    }
}

/// Output side of a session: renders chunks, writes them, tracks the index.
struct ChunkWriter<S> {
    store: S,
    renderer: ChunkRenderer,
    compressor: Box<dyn Compressor>,
    stylesheet: Option<String>,
    index: IndexBuilder,
    generated: Vec<GeneratedFile>,
}

impl<S: FileStore> ChunkWriter<S> {
    fn emit(&mut self, chunk: &Chunk, filename: String, compress: bool) -> Result<()> {
        let document = self.renderer.render(chunk);
        let uncompressed_bytes = usize_to_u64(document.len());

        let (filename, payload) = if compress {
            let packed = self.compressor.compress(&document)?;
            (format!("{filename}{}", self.compressor.extension()), packed)
        } else {
            (filename, document)
        };

        self.store.write(&filename, &payload)?;
        let written_bytes = self.store.file_size(&filename)?;
        let written_at = Utc::now();

        if compress {
            if let Some(delta) = size_delta_percent(uncompressed_bytes, written_bytes) {
                debug!(
                    file = %filename,
                    before = uncompressed_bytes,
                    after = written_bytes,
                    delta = format!("{delta:.1}%"),
                    "Compressed sitemap chunk"
                );
            }
        }
        info!(
            file = %filename,
            urls = chunk.len(),
            size = %format_bytes(written_bytes),
            "Wrote sitemap chunk"
        );

        self.index.record_chunk(&filename, written_at);
        self.generated.push(GeneratedFile {
            filename,
            kind: FileKind::Sitemap,
            records: chunk.len(),
            uncompressed_bytes,
            written_bytes,
            compressed: compress,
            written_at,
        });
        Ok(())
    }

    fn write_index(&mut self, filename: &str) -> Result<()> {
        let document = self.index.render(self.stylesheet.as_deref())?;
        self.store.write(filename, &document)?;
        let written_bytes = self.store.file_size(filename)?;

        info!(
            file = %filename,
            sitemaps = self.index.entries().len(),
            size = %format_bytes(written_bytes),
            "Wrote sitemap index"
        );

        self.generated.push(GeneratedFile {
            filename: filename.to_string(),
            kind: FileKind::Index,
            records: self.index.entries().len(),
            uncompressed_bytes: usize_to_u64(document.len()),
            written_bytes,
            compressed: false,
            written_at: Utc::now(),
        });
        Ok(())
    }
}

/// A single sitemap generation pass.
///
/// Not meant for concurrent use; drive it from one task.
pub struct SitemapSession<S: FileStore = LocalFileStore> {
    base_url: Url,
    files: SessionFiles,
    compress: bool,
    writer: ChunkWriter<S>,
    ping_client: Option<Arc<dyn PingClient>>,
    engines: Vec<SearchEngine>,
    lifecycle: Lifecycle,
}

impl SitemapSession<LocalFileStore> {
    /// Start a session writing into `config.site.output_dir`.
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let store = LocalFileStore::new(&config.site.output_dir)?;
        Self::with_store(config, store)
    }
}

impl<S: FileStore> SitemapSession<S> {
    /// Start a session writing through `store`.
    ///
    /// The configuration is validated first; see [`GeneratorConfig::validate`].
    pub fn with_store(config: &GeneratorConfig, store: S) -> Result<Self> {
        let base_url = config.validate()?;
        let stylesheet = config.files.stylesheet.clone();
        let renderer = ChunkRenderer::new(stylesheet.as_deref())?;
        let buffer = EntryBuffer::new(
            config.limits.max_urls_per_sitemap,
            config.limits.max_sitemap_bytes,
            renderer.frame_len(),
        )?;

        Ok(Self {
            files: SessionFiles {
                sitemap: config.files.sitemap_filename.clone(),
                index: config.files.sitemap_index_filename.clone(),
                robots: config.files.robots_filename.clone(),
            },
            compress: config.output.compress,
            writer: ChunkWriter {
                store,
                renderer,
                compressor: Box::new(GzipCompressor::default()),
                stylesheet,
                index: IndexBuilder::new(base_url.clone()),
                generated: Vec::new(),
            },
            ping_client: None,
            engines: SearchEngine::defaults(),
            lifecycle: Lifecycle::Collecting(buffer),
            base_url,
        })
    }

    /// Use `client` for search-engine notification instead of HTTP.
    #[must_use]
    pub fn with_ping_client(mut self, client: Arc<dyn PingClient>) -> Self {
        self.ping_client = Some(client);
        self
    }

    /// Replace the engines notified by [`submit_sitemap`](Self::submit_sitemap).
    #[must_use]
    pub fn with_search_engines(mut self, engines: Vec<SearchEngine>) -> Self {
        self.engines = engines;
        self
    }

    /// Replace the compressor used when compression is enabled.
    #[must_use]
    pub fn with_compressor(mut self, compressor: Box<dyn Compressor>) -> Self {
        self.writer.compressor = compressor;
        self
    }

    /// Validate and add one URL.
    ///
    /// `location` is a path relative to the base URL or a full URL under it.
    pub fn add_url(
        &mut self,
        location: &str,
        last_modified: Option<DateTime<Utc>>,
        change_frequency: Option<&str>,
        priority: Option<PriorityValue>,
    ) -> Result<()> {
        self.add_entry(UrlInput {
            location: location.to_string(),
            last_modified,
            change_frequency: change_frequency.map(str::to_string),
            priority,
            alternates: Vec::new(),
        })
    }

    /// Validate and add one URL with all optional fields, including alternates.
    ///
    /// Rejected input leaves the session unchanged. When the entry closes the
    /// open chunk, that chunk is written before this call returns.
    #[instrument(level = "debug", skip_all, fields(location = %input.location))]
    pub fn add_entry(&mut self, input: UrlInput) -> Result<()> {
        let Lifecycle::Collecting(buffer) = &mut self.lifecycle else {
            return Err(Error::illegal_state("add_url", "session is already finalized"));
        };

        let entry = build_entry(&self.base_url, input)?;
        let (files, writer, compress) = (&self.files, &mut self.writer, self.compress);
        buffer.accept_with(entry, |chunk| {
            writer.emit(chunk, files.chunk_filename(chunk.sequence(), true), compress)
        })
    }

    /// Write the remaining chunk and the index, then stop accepting URLs.
    ///
    /// Fails with [`Error::IllegalState`] when already finalized or when no
    /// URL was ever accepted.
    #[instrument(skip(self))]
    pub fn finalize(&mut self) -> Result<()> {
        let Lifecycle::Collecting(buffer) = &mut self.lifecycle else {
            return Err(Error::illegal_state("finalize", "session is already finalized"));
        };
        if buffer.accepted_total() == 0 {
            return Err(Error::illegal_state("finalize", "no URLs have been added"));
        }

        let numbered = buffer.has_flushed();
        let (files, writer, compress) = (&self.files, &mut self.writer, self.compress);
        buffer.flush_remainder_with(|chunk| {
            writer.emit(chunk, files.chunk_filename(chunk.sequence(), numbered), compress)
        })?;
        let total = buffer.accepted_total();

        self.writer.write_index(&self.files.index)?;
        self.lifecycle = Lifecycle::Finalized(Finalized::default());

        info!(
            urls = total,
            sitemaps = self.writer.index.entries().len(),
            index = %self.index_url(),
            "Sitemap finalized"
        );
        Ok(())
    }

    /// Point the robots file at the index, creating it when missing.
    ///
    /// Allowed only after [`finalize`](Self::finalize); repeatable.
    #[instrument(skip(self))]
    pub fn update_robots(&mut self) -> Result<()> {
        let Lifecycle::Finalized(finalized) = &mut self.lifecycle else {
            return Err(Error::illegal_state(
                "update_robots",
                "session has not been finalized",
            ));
        };

        let index_url = self.writer.index.absolute_url(&self.files.index);
        let robots = &self.files.robots;
        let store = &mut self.writer.store;

        let existing = if store.exists(robots) {
            Some(store.read_to_string(robots)?)
        } else {
            None
        };
        let patched = patch_robots(existing.as_deref(), &index_url);
        store.write(robots, patched.as_bytes())?;

        finalized.robots_updated = true;
        info!(file = %robots, created = existing.is_none(), "Updated robots file");
        Ok(())
    }

    /// Notify every configured search engine of the index URL.
    ///
    /// Allowed only after [`finalize`](Self::finalize); repeatable. Engines
    /// answering with a non-success status are reported, not treated as errors.
    #[instrument(skip(self))]
    pub async fn submit_sitemap(&mut self) -> Result<Vec<PingOutcome>> {
        if !matches!(self.lifecycle, Lifecycle::Finalized(_)) {
            return Err(Error::illegal_state(
                "submit_sitemap",
                "session has not been finalized",
            ));
        }
        if self.writer.index.is_empty() {
            return Err(Error::NoChunks);
        }

        let client = match self.ping_client.clone() {
            Some(client) => client,
            None => {
                let client: Arc<dyn PingClient> = Arc::new(HttpPingClient::new()?);
                self.ping_client = Some(Arc::clone(&client));
                client
            },
        };

        let index_url = self.index_url();
        let outcomes = ping_all(client.as_ref(), &self.engines, &index_url).await?;

        if let Lifecycle::Finalized(finalized) = &mut self.lifecycle {
            finalized.submitted = true;
        }
        Ok(outcomes)
    }

    /// Compress chunks written from now on.
    pub fn enable_compression(&mut self) -> Result<()> {
        self.ensure_collecting("enable_compression")?;
        self.compress = true;
        Ok(())
    }

    /// Write chunks written from now on uncompressed.
    pub fn disable_compression(&mut self) -> Result<()> {
        self.ensure_collecting("disable_compression")?;
        self.compress = false;
        Ok(())
    }

    /// Whether new chunks are compressed.
    #[must_use]
    pub const fn is_compression_enabled(&self) -> bool {
        self.compress
    }

    /// Rename the chunk files. Must end in `.xml`.
    pub fn set_sitemap_filename(&mut self, name: &str) -> Result<()> {
        validate_filename(name, Some(".xml"))?;
        self.ensure_filenames_open("set_sitemap_filename")?;
        validate_distinct_filenames(name, &self.files.index)?;
        self.files.sitemap = name.to_string();
        Ok(())
    }

    /// Rename the index file. Must end in `.xml`.
    pub fn set_sitemap_index_filename(&mut self, name: &str) -> Result<()> {
        validate_filename(name, Some(".xml"))?;
        self.ensure_filenames_open("set_sitemap_index_filename")?;
        validate_distinct_filenames(&self.files.sitemap, name)?;
        self.files.index = name.to_string();
        Ok(())
    }

    /// Rename the robots file. Must end in `.txt`.
    pub fn set_robots_filename(&mut self, name: &str) -> Result<()> {
        validate_filename(name, Some(".txt"))?;
        self.ensure_filenames_open("set_robots_filename")?;
        self.files.robots = name.to_string();
        Ok(())
    }

    /// Change the per-chunk URL limit (`1..=50000`) before the first flush.
    pub fn set_max_urls_per_sitemap(&mut self, max_urls: usize) -> Result<()> {
        match &mut self.lifecycle {
            Lifecycle::Collecting(buffer) => buffer.set_max_urls(max_urls),
            Lifecycle::Finalized(_) => Err(Error::illegal_state(
                "set_max_urls_per_sitemap",
                "session is already finalized",
            )),
        }
    }

    /// Change the per-chunk byte limit before the first flush.
    pub fn set_max_sitemap_bytes(&mut self, max_bytes: usize) -> Result<()> {
        match &mut self.lifecycle {
            Lifecycle::Collecting(buffer) => buffer.set_max_bytes(max_bytes),
            Lifecycle::Finalized(_) => Err(Error::illegal_state(
                "set_max_sitemap_bytes",
                "session is already finalized",
            )),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        match &self.lifecycle {
            Lifecycle::Collecting(_) => SessionState::Collecting,
            Lifecycle::Finalized(f) => SessionState::Finalized {
                robots_updated: f.robots_updated,
                submitted: f.submitted,
            },
        }
    }

    /// Files written so far, chunks in flush order followed by the index.
    #[must_use]
    pub fn generated_files(&self) -> &[GeneratedFile] {
        &self.writer.generated
    }

    /// Absolute URL of the index file.
    #[must_use]
    pub fn index_url(&self) -> String {
        self.writer.index.absolute_url(&self.files.index)
    }

    /// Base URL locations are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Chunk filename as configured.
    #[must_use]
    pub fn sitemap_filename(&self) -> &str {
        &self.files.sitemap
    }

    /// Index filename as configured.
    #[must_use]
    pub fn sitemap_index_filename(&self) -> &str {
        &self.files.index
    }

    /// Robots filename as configured.
    #[must_use]
    pub fn robots_filename(&self) -> &str {
        &self.files.robots
    }

    /// The underlying file store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.writer.store
    }

    /// Consume the session and return its file store.
    pub fn into_store(self) -> S {
        self.writer.store
    }

    fn ensure_collecting(&self, operation: &'static str) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Collecting(_) => Ok(()),
            Lifecycle::Finalized(_) => Err(Error::illegal_state(
                operation,
                "session is already finalized",
            )),
        }
    }

    fn ensure_filenames_open(&self, operation: &'static str) -> Result<()> {
        match &self.lifecycle {
            Lifecycle::Collecting(buffer) if buffer.has_flushed() => Err(Error::illegal_state(
                operation,
                "a chunk has already been written",
            )),
            Lifecycle::Collecting(_) => Ok(()),
            Lifecycle::Finalized(_) => Err(Error::illegal_state(
                operation,
                "session is already finalized",
            )),
        }
    }
}

fn build_entry(base: &Url, input: UrlInput) -> Result<UrlEntry> {
    let location = validate_url(base, &input.location)?;
    let change_frequency = input
        .change_frequency
        .as_deref()
        .map(validate_change_frequency)
        .transpose()?;
    let priority = input.priority.map(validate_priority).transpose()?;
    let alternates = input
        .alternates
        .iter()
        .map(|(hreflang, href)| validate_alternate(base, hreflang, href))
        .collect::<Result<Vec<_>>>()?;

    Ok(UrlEntry {
        location,
        last_modified: input.last_modified,
        change_frequency,
        priority,
        alternates,
    })
}
