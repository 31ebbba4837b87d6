//! # sitemapgen-core
//!
//! Chunked sitemap generation: validate page URLs, split them into protocol
//! compliant sitemap files, write a sitemap index, patch `robots.txt`, and
//! notify search engines.
//!
//! ## Architecture
//!
//! - **Validation**: side-effect-free checks for locations, change
//!   frequencies, priorities and filenames
//! - **Buffering**: the open chunk and its exact serialized size; closes a
//!   chunk before it would exceed the URL count or byte limit
//! - **Rendering**: `<urlset>` chunks and the `<sitemapindex>` document
//! - **Session**: the collecting → finalized lifecycle that sequences writes,
//!   robots patching and search-engine pings
//! - **Collaborators**: [`FileStore`], [`Compressor`] and [`PingClient`]
//!   traits with local, in-memory, gzip and HTTP implementations
//!
//! ## Quick Start
//!
//! ```rust
//! use sitemapgen_core::{GeneratorConfig, MemoryFileStore, SitemapSession};
//!
//! let mut config = GeneratorConfig::default();
//! config.site.base_url = "https://example.com".into();
//! config.limits.max_urls_per_sitemap = 2;
//!
//! let mut session = SitemapSession::with_store(&config, MemoryFileStore::new())?;
//! for path in ["/", "/about", "/contact"] {
//!     session.add_url(path, None, Some("weekly"), Some("0.5".into()))?;
//! }
//! session.finalize()?;
//!
//! let names: Vec<_> = session.store().names().collect();
//! assert_eq!(names, ["sitemap1.xml", "sitemap2.xml", "sitemap_index.xml"]);
//! # Ok::<(), sitemapgen_core::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`]. Rejected input and
//! out-of-sequence calls never change session state:
//!
//! ```rust
//! use sitemapgen_core::{Error, GeneratorConfig, MemoryFileStore, SitemapSession};
//!
//! let mut config = GeneratorConfig::default();
//! config.site.base_url = "https://example.com".into();
//! let mut session = SitemapSession::with_store(&config, MemoryFileStore::new())?;
//!
//! match session.finalize() {
//!     Err(e) if e.is_illegal_state() => eprintln!("nothing to write yet: {e}"),
//!     Err(e) => eprintln!("failed: {e}"),
//!     Ok(()) => unreachable!(),
//! }
//! # Ok::<(), Error>(())
//! ```

/// Entry buffering and chunk boundaries
pub mod buffer;
/// Chunk compression
pub mod compress;
/// Generator configuration
pub mod config;
/// Error types and result aliases
pub mod error;
/// Sitemap index rendering
pub mod index;
/// Numeric conversion and size reporting helpers
pub mod numeric;
/// Search-engine notification
pub mod ping;
/// Sitemap markup rendering
pub mod render;
/// Robots file patching
pub mod robots;
/// The generation session state machine
pub mod session;
/// File persistence
pub mod storage;
/// Core data types
pub mod types;
/// Input validators
pub mod validate;

// Re-export commonly used types
pub use buffer::{Accepted, Chunk, EntryBuffer, MAX_SITEMAP_BYTES, MAX_URLS_PER_SITEMAP};
pub use compress::{Compressor, GzipCompressor};
pub use config::{FilesConfig, GeneratorConfig, LimitsConfig, OutputConfig, SiteConfig};
pub use error::{Error, Result};
pub use index::{IndexBuilder, SitemapIndexEntry};
pub use numeric::size_delta_percent;
pub use ping::{
    HttpPingClient, PingClient, PingOutcome, PingResponse, SEARCH_ENGINES, SearchEngine,
};
pub use render::{ChunkRenderer, SITEMAP_NAMESPACE, url_element};
pub use robots::{DEFAULT_ROBOTS, patch_robots};
pub use session::{SessionState, SitemapSession};
pub use storage::{FileStore, LocalFileStore, MemoryFileStore};
pub use types::*;
pub use validate::{
    MAX_URL_BYTES, is_valid_changefreq_value, is_valid_priority_value, parse_timestamp,
    validate_alternate, validate_base_url, validate_change_frequency, validate_distinct_filenames,
    validate_filename, validate_priority, validate_url,
};
