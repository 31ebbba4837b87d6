//! Sitemap markup rendering.
//!
//! A chunk document is a fixed frame (XML declaration, optional stylesheet
//! instruction, `<urlset>` open and close tags) around one `<url>` element
//! per entry. Elements are rendered once, when an entry is accepted, so the
//! size of a chunk is always known exactly without re-serializing it.
//!
//! ```
//! use sitemapgen_core::render::{ChunkRenderer, SITEMAP_NAMESPACE};
//!
//! let renderer = ChunkRenderer::new(None)?;
//! let doc = String::from_utf8(renderer.document(b""))?;
//! assert!(doc.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
//! assert!(doc.contains(SITEMAP_NAMESPACE));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::buffer::Chunk;
use crate::types::UrlEntry;
use crate::{Error, Result};

/// Namespace of the sitemap protocol.
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Namespace used for `<xhtml:link>` alternates.
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

pub(crate) fn xml_error(e: impl std::fmt::Display) -> Error {
    Error::Serialization(e.to_string())
}

/// Renders the frame shared by every chunk of a session.
#[derive(Debug, Clone)]
pub struct ChunkRenderer {
    header: Vec<u8>,
    footer: Vec<u8>,
}

impl ChunkRenderer {
    /// Build a renderer, optionally referencing an XSL stylesheet.
    pub fn new(stylesheet: Option<&str>) -> Result<Self> {
        let mut writer = Writer::new(Vec::new());
        write_prolog(&mut writer, stylesheet)?;
        writer
            .write_event(Event::Start(BytesStart::new("urlset").with_attributes([
                ("xmlns", SITEMAP_NAMESPACE),
                ("xmlns:xhtml", XHTML_NAMESPACE),
            ])))
            .map_err(xml_error)?;
        writer.get_mut().push(b'\n');
        let header = writer.into_inner();

        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::End(BytesEnd::new("urlset")))
            .map_err(xml_error)?;
        writer.get_mut().push(b'\n');
        let footer = writer.into_inner();

        Ok(Self { header, footer })
    }

    /// Bytes contributed by the frame alone.
    #[must_use]
    pub fn frame_len(&self) -> usize {
        self.header.len() + self.footer.len()
    }

    /// Wrap already-rendered `<url>` elements in the chunk frame.
    #[must_use]
    pub fn document(&self, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.frame_len() + body.len());
        out.extend_from_slice(&self.header);
        out.extend_from_slice(body);
        out.extend_from_slice(&self.footer);
        out
    }

    /// Render a closed chunk into its complete document.
    #[must_use]
    pub fn render(&self, chunk: &Chunk) -> Vec<u8> {
        self.document(chunk.body())
    }
}

/// Render one `<url>` element, terminated by a newline.
pub fn url_element(entry: &UrlEntry) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());

    writer
        .write_event(Event::Start(BytesStart::new("url")))
        .map_err(xml_error)?;
    write_text_element(&mut writer, "loc", entry.location().as_str())?;
    if let Some(at) = entry.last_modified() {
        write_text_element(&mut writer, "lastmod", &format_lastmod(at))?;
    }
    if let Some(freq) = entry.change_frequency() {
        write_text_element(&mut writer, "changefreq", freq.as_str())?;
    }
    if let Some(priority) = entry.priority() {
        write_text_element(&mut writer, "priority", &priority.to_string())?;
    }
    for alternate in entry.alternates() {
        writer
            .write_event(Event::Empty(BytesStart::new("xhtml:link").with_attributes([
                ("rel", "alternate"),
                ("hreflang", alternate.hreflang()),
                ("href", alternate.href().as_str()),
            ])))
            .map_err(xml_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("url")))
        .map_err(xml_error)?;
    writer.get_mut().push(b'\n');

    Ok(writer.into_inner())
}

/// W3C datetime with second precision, e.g. `2024-01-15T10:30:00+00:00`.
pub(crate) fn format_lastmod(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}

pub(crate) fn write_prolog(writer: &mut Writer<Vec<u8>>, stylesheet: Option<&str>) -> Result<()> {
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    writer.get_mut().push(b'\n');

    if let Some(href) = stylesheet {
        let pi = format!(
            "<?xml-stylesheet type=\"text/xsl\" href=\"{}\"?>\n",
            quick_xml::escape::escape(href)
        );
        writer.get_mut().extend_from_slice(pi.as_bytes());
    }
    Ok(())
}

pub(crate) fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)?;
    Ok(())
}
