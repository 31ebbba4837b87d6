//! Sitemap index rendering.

use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use serde::Serialize;
use url::Url;

use crate::render::{
    SITEMAP_NAMESPACE, format_lastmod, write_prolog, write_text_element, xml_error,
};
use crate::validate::resolve_against_base;
use crate::{Error, Result};

/// One `<sitemap>` reference inside the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapIndexEntry {
    /// Chunk filename relative to the base URL.
    pub filename: String,
    /// Absolute URL of the chunk.
    pub location: String,
    /// When the chunk was written.
    pub last_modified: DateTime<Utc>,
}

/// Collects chunk references in flush order and renders the index document.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    base_url: Url,
    entries: Vec<SitemapIndexEntry>,
}

impl IndexBuilder {
    /// Start an empty index for files published under `base_url`.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            entries: Vec::new(),
        }
    }

    /// Record a written chunk.
    pub fn record_chunk(&mut self, filename: &str, last_modified: DateTime<Utc>) {
        self.entries.push(SitemapIndexEntry {
            filename: filename.to_string(),
            location: self.absolute_url(filename),
            last_modified,
        });
    }

    /// Recorded references in flush order.
    #[must_use]
    pub fn entries(&self) -> &[SitemapIndexEntry] {
        &self.entries
    }

    /// Whether no chunk has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Absolute URL of a file published next to the chunks.
    #[must_use]
    pub fn absolute_url(&self, filename: &str) -> String {
        resolve_against_base(&self.base_url, filename)
    }

    /// Render the `<sitemapindex>` document.
    ///
    /// Fails with [`Error::NoChunks`] when nothing was recorded.
    pub fn render(&self, stylesheet: Option<&str>) -> Result<Vec<u8>> {
        if self.entries.is_empty() {
            return Err(Error::NoChunks);
        }

        let mut writer = Writer::new(Vec::new());
        write_prolog(&mut writer, stylesheet)?;
        writer
            .write_event(Event::Start(
                BytesStart::new("sitemapindex").with_attributes([("xmlns", SITEMAP_NAMESPACE)]),
            ))
            .map_err(xml_error)?;
        writer.get_mut().push(b'\n');

        for entry in &self.entries {
            writer
                .write_event(Event::Start(BytesStart::new("sitemap")))
                .map_err(xml_error)?;
            write_text_element(&mut writer, "loc", &entry.location)?;
            write_text_element(&mut writer, "lastmod", &format_lastmod(entry.last_modified))?;
            writer
                .write_event(Event::End(BytesEnd::new("sitemap")))
                .map_err(xml_error)?;
            writer.get_mut().push(b'\n');
        }

        writer
            .write_event(Event::End(BytesEnd::new("sitemapindex")))
            .map_err(xml_error)?;
        writer.get_mut().push(b'\n');
        Ok(writer.into_inner())
    }
}
