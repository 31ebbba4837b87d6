//! Entry buffering and chunk boundaries.
//!
//! [`EntryBuffer`] holds the open chunk and decides when it must be closed.
//! Before each insertion one ordered check runs: if the open chunk already
//! holds `max_urls` entries, or its serialized size plus the new element
//! would exceed `max_bytes`, the open chunk is flushed first and the entry
//! starts a fresh one. Sizes are exact, not estimated: each `<url>` element is
//! rendered once on accept and its bytes are kept for the final document.

use tracing::debug;

use crate::numeric::usize_to_u64;
use crate::render::url_element;
use crate::types::UrlEntry;
use crate::{Error, Result};

/// Protocol limit on `<url>` elements per sitemap file.
pub const MAX_URLS_PER_SITEMAP: usize = 50_000;

/// Protocol limit on the uncompressed size of a sitemap file (50 MiB).
pub const MAX_SITEMAP_BYTES: usize = 52_428_800;

/// A closed, immutable run of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    sequence: usize,
    entries: Vec<UrlEntry>,
    body: Vec<u8>,
    byte_size: usize,
}

impl Chunk {
    /// 1-based position of this chunk within the session.
    #[must_use]
    pub const fn sequence(&self) -> usize {
        self.sequence
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[UrlEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Closed chunks are never empty; provided for API completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Concatenated `<url>` elements.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Size of the complete uncompressed document, frame included.
    #[must_use]
    pub const fn byte_size(&self) -> usize {
        self.byte_size
    }
}

/// Outcome of [`EntryBuffer::accept`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accepted {
    /// The entry joined the open chunk.
    Appended,
    /// The open chunk was closed first; the entry starts the next one.
    Flushed(Chunk),
}

/// The open chunk plus its running size.
#[derive(Debug)]
pub struct EntryBuffer {
    max_urls: usize,
    max_bytes: usize,
    frame_bytes: usize,
    open: Vec<UrlEntry>,
    open_body: Vec<u8>,
    flushed: usize,
    accepted_total: usize,
}

impl EntryBuffer {
    /// Create a buffer for documents whose frame takes `frame_bytes`.
    ///
    /// Limits are validated as with [`set_max_urls`](Self::set_max_urls) and
    /// [`set_max_bytes`](Self::set_max_bytes).
    pub fn new(max_urls: usize, max_bytes: usize, frame_bytes: usize) -> Result<Self> {
        let mut buffer = Self {
            max_urls: MAX_URLS_PER_SITEMAP,
            max_bytes: MAX_SITEMAP_BYTES,
            frame_bytes,
            open: Vec::new(),
            open_body: Vec::new(),
            flushed: 0,
            accepted_total: 0,
        };
        buffer.set_max_urls(max_urls)?;
        buffer.set_max_bytes(max_bytes)?;
        Ok(buffer)
    }

    /// Accept a validated entry, flushing the open chunk first if needed.
    ///
    /// Fails with [`Error::OutOfRange`] when the entry alone cannot fit in a
    /// document under the byte limit; the buffer is unchanged in that case.
    pub fn accept(&mut self, entry: UrlEntry) -> Result<Accepted> {
        let element = self.render_checked(&entry)?;

        let outcome = if self.needs_flush(element.len()) {
            Accepted::Flushed(self.close_open())
        } else {
            Accepted::Appended
        };

        self.place(entry, element);
        Ok(outcome)
    }

    /// Accept a validated entry, handing a closed chunk to `write` first.
    ///
    /// The entry is placed only after `write` succeeds. When `write` fails
    /// the closed chunk becomes the open chunk again and the error is
    /// returned as is, so the same call can be retried.
    pub fn accept_with(
        &mut self,
        entry: UrlEntry,
        write: impl FnOnce(&Chunk) -> Result<()>,
    ) -> Result<()> {
        let element = self.render_checked(&entry)?;

        if self.needs_flush(element.len()) {
            let chunk = self.close_open();
            if let Err(e) = write(&chunk) {
                self.reopen(chunk);
                return Err(e);
            }
        }

        self.place(entry, element);
        Ok(())
    }

    /// Close whatever is open, used at finalize. `None` when empty.
    pub fn flush_remainder(&mut self) -> Option<Chunk> {
        if self.open.is_empty() {
            None
        } else {
            Some(self.close_open())
        }
    }

    /// Close whatever is open and hand it to `write`.
    ///
    /// Returns whether a chunk was written. On failure the chunk is reopened.
    pub fn flush_remainder_with(
        &mut self,
        write: impl FnOnce(&Chunk) -> Result<()>,
    ) -> Result<bool> {
        let Some(chunk) = self.flush_remainder() else {
            return Ok(false);
        };
        if let Err(e) = write(&chunk) {
            self.reopen(chunk);
            return Err(e);
        }
        Ok(true)
    }

    /// Change the per-chunk entry limit.
    ///
    /// Range is `1..=MAX_URLS_PER_SITEMAP`. Rejected once a chunk has been
    /// flushed, or when the open chunk already holds more than `max_urls`.
    pub fn set_max_urls(&mut self, max_urls: usize) -> Result<()> {
        if !(1..=MAX_URLS_PER_SITEMAP).contains(&max_urls) {
            return Err(Error::OutOfRange {
                name: "max_urls_per_sitemap",
                value: usize_to_u64(max_urls),
                min: 1,
                max: usize_to_u64(MAX_URLS_PER_SITEMAP),
            });
        }
        self.ensure_reconfigurable("set_max_urls_per_sitemap")?;
        if max_urls < self.open.len() {
            return Err(Error::illegal_state(
                "set_max_urls_per_sitemap",
                format!(
                    "open chunk already holds {} entries, more than {max_urls}",
                    self.open.len()
                ),
            ));
        }
        self.max_urls = max_urls;
        Ok(())
    }

    /// Change the per-chunk byte limit.
    ///
    /// Range is from one byte above the document frame up to
    /// [`MAX_SITEMAP_BYTES`]. Rejected once a chunk has been flushed, or when
    /// the open chunk is already larger.
    pub fn set_max_bytes(&mut self, max_bytes: usize) -> Result<()> {
        let min = self.frame_bytes + 1;
        if !(min..=MAX_SITEMAP_BYTES).contains(&max_bytes) {
            return Err(Error::OutOfRange {
                name: "max_sitemap_bytes",
                value: usize_to_u64(max_bytes),
                min: usize_to_u64(min),
                max: usize_to_u64(MAX_SITEMAP_BYTES),
            });
        }
        self.ensure_reconfigurable("set_max_sitemap_bytes")?;
        if max_bytes < self.open_bytes() {
            return Err(Error::illegal_state(
                "set_max_sitemap_bytes",
                format!("open chunk is already {} bytes", self.open_bytes()),
            ));
        }
        self.max_bytes = max_bytes;
        Ok(())
    }

    /// Whether any chunk has been closed.
    #[must_use]
    pub const fn has_flushed(&self) -> bool {
        self.flushed > 0
    }

    /// Number of chunks closed so far.
    #[must_use]
    pub const fn flushed_chunks(&self) -> usize {
        self.flushed
    }

    /// Entries accepted over the buffer's lifetime.
    #[must_use]
    pub const fn accepted_total(&self) -> usize {
        self.accepted_total
    }

    /// Entries in the open chunk.
    #[must_use]
    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    /// Size the open chunk would have if closed now.
    #[must_use]
    pub fn open_bytes(&self) -> usize {
        self.frame_bytes + self.open_body.len()
    }

    /// Current entry limit.
    #[must_use]
    pub const fn max_urls(&self) -> usize {
        self.max_urls
    }

    /// Current byte limit.
    #[must_use]
    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    fn needs_flush(&self, element_len: usize) -> bool {
        !self.open.is_empty()
            && (self.open.len() >= self.max_urls
                || self.open_bytes() + element_len > self.max_bytes)
    }

    fn ensure_reconfigurable(&self, operation: &'static str) -> Result<()> {
        if self.has_flushed() {
            return Err(Error::illegal_state(
                operation,
                "a chunk has already been flushed",
            ));
        }
        Ok(())
    }

    fn render_checked(&self, entry: &UrlEntry) -> Result<Vec<u8>> {
        let element = url_element(entry)?;

        let alone = self.frame_bytes + element.len();
        if alone > self.max_bytes {
            return Err(Error::OutOfRange {
                name: "url element bytes",
                value: usize_to_u64(alone),
                min: usize_to_u64(self.frame_bytes + 1),
                max: usize_to_u64(self.max_bytes),
            });
        }
        Ok(element)
    }

    fn place(&mut self, entry: UrlEntry, element: Vec<u8>) {
        self.open.push(entry);
        self.open_body.extend_from_slice(&element);
        self.accepted_total += 1;
    }

    /// Undo the most recent `close_open`.
    fn reopen(&mut self, chunk: Chunk) {
        debug!(sequence = chunk.sequence, "Reopened sitemap chunk after failed write");
        self.flushed -= 1;
        self.open = chunk.entries;
        self.open_body = chunk.body;
    }

    fn close_open(&mut self) -> Chunk {
        self.flushed += 1;
        let byte_size = self.open_bytes();
        let chunk = Chunk {
            sequence: self.flushed,
            entries: std::mem::take(&mut self.open),
            body: std::mem::take(&mut self.open_body),
            byte_size,
        };
        debug!(
            sequence = chunk.sequence,
            urls = chunk.len(),
            bytes = chunk.byte_size,
            "Closed sitemap chunk"
        );
        chunk
    }
}
