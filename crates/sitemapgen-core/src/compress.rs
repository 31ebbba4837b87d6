//! Chunk compression.
//!
//! ```
//! use sitemapgen_core::{Compressor, GzipCompressor};
//!
//! let gzip = GzipCompressor::default();
//! let packed = gzip.compress(b"<urlset></urlset>")?;
//! assert_eq!(&packed[..2], &[0x1f, 0x8b]);
//! assert_eq!(gzip.extension(), ".gz");
//! # Ok::<(), sitemapgen_core::Error>(())
//! ```

use std::io::Write;

use flate2::{Compression, write::GzEncoder};

use crate::{Error, Result};

/// Encodes a rendered chunk before it is written.
pub trait Compressor: Send + Sync {
    /// Compress a complete payload.
    fn compress(&self, payload: &[u8]) -> Result<Vec<u8>>;

    /// Suffix appended to the chunk filename, e.g. `.gz`.
    fn extension(&self) -> &'static str;
}

/// Gzip encoder backed by `flate2`.
#[derive(Debug, Clone, Copy)]
pub struct GzipCompressor {
    level: Compression,
}

impl GzipCompressor {
    /// Gzip with an explicit level in `0..=9`; larger values are clamped.
    #[must_use]
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Compressor for GzipCompressor {
    fn compress(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(payload.len() / 4), self.level);
        encoder
            .write_all(payload)
            .map_err(|e| Error::Compression(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| Error::Compression(e.to_string()))
    }

    fn extension(&self) -> &'static str {
        ".gz"
    }
}
