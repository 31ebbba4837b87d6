//! Sitemap entries, their validated field types, and reports of written files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::{Error, Result};

/// Change frequency hint for a sitemap entry.
///
/// These values indicate how frequently a page is likely to change,
/// though search engines may not follow these hints strictly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    /// The page changes every time it is accessed.
    Always,
    /// The page changes hourly.
    Hourly,
    /// The page changes daily.
    Daily,
    /// The page changes weekly.
    Weekly,
    /// The page changes monthly.
    Monthly,
    /// The page changes yearly.
    Yearly,
    /// The page is archived and will not change.
    Never,
}

impl ChangeFrequency {
    /// All seven protocol values, in protocol order.
    pub const ALL: [Self; 7] = [
        Self::Always,
        Self::Hourly,
        Self::Daily,
        Self::Weekly,
        Self::Monthly,
        Self::Yearly,
        Self::Never,
    ];

    /// The protocol token for this value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChangeFrequency {
    type Err = Error;

    /// Tokens are matched case-sensitively: `Daily` is rejected.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|freq| freq.as_str() == s)
            .ok_or_else(|| Error::InvalidChangeFrequency(s.to_string()))
    }
}

/// A validated priority, stored as a whole number of tenths (0..=10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
    /// Lowest priority, `0.0`.
    pub const MIN: Self = Self(0);
    /// Highest priority, `1.0`.
    pub const MAX: Self = Self(10);

    /// Build a priority from a count of tenths, `None` above 10.
    #[must_use]
    pub const fn from_tenths(tenths: u8) -> Option<Self> {
        if tenths <= 10 { Some(Self(tenths)) } else { None }
    }

    /// Number of tenths this priority represents.
    #[must_use]
    pub const fn tenths(self) -> u8 {
        self.0
    }

    /// The priority as a float.
    #[must_use]
    pub fn as_f32(self) -> f32 {
        f32::from(self.0) / 10.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

impl Serialize for Priority {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f32(self.as_f32())
    }
}

/// Raw priority input as supplied by a caller, before validation.
///
/// Both `0.8` and `"0.8"` are accepted by
/// [`validate_priority`](crate::validate_priority); strings must carry exactly
/// one fractional digit.
#[derive(Debug, Clone, PartialEq)]
pub enum PriorityValue {
    /// Numeric input.
    Number(f64),
    /// Textual input such as `"0.5"`.
    Text(String),
}

impl fmt::Display for PriorityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for PriorityValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for PriorityValue {
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for PriorityValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PriorityValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Priority> for PriorityValue {
    fn from(value: Priority) -> Self {
        Self::Text(value.to_string())
    }
}

/// A language alternate for a page (`<xhtml:link rel="alternate">`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternate {
    pub(crate) hreflang: String,
    pub(crate) href: Url,
}

impl Alternate {
    /// The `hreflang` code, e.g. `de` or `x-default`.
    #[must_use]
    pub fn hreflang(&self) -> &str {
        &self.hreflang
    }

    /// Absolute URL of the alternate page.
    #[must_use]
    pub const fn href(&self) -> &Url {
        &self.href
    }
}

/// One validated page record.
///
/// Entries are only produced by validation and cannot be modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlEntry {
    pub(crate) location: Url,
    pub(crate) last_modified: Option<DateTime<Utc>>,
    pub(crate) change_frequency: Option<ChangeFrequency>,
    pub(crate) priority: Option<Priority>,
    pub(crate) alternates: Vec<Alternate>,
}

impl UrlEntry {
    /// Absolute location of the page.
    #[must_use]
    pub const fn location(&self) -> &Url {
        &self.location
    }

    /// Last modification time, if known.
    #[must_use]
    pub const fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    /// Change frequency hint, if given.
    #[must_use]
    pub const fn change_frequency(&self) -> Option<ChangeFrequency> {
        self.change_frequency
    }

    /// Priority hint, if given.
    #[must_use]
    pub const fn priority(&self) -> Option<Priority> {
        self.priority
    }

    /// Language alternates of this page.
    #[must_use]
    pub fn alternates(&self) -> &[Alternate] {
        &self.alternates
    }
}

/// Unvalidated input for [`SitemapSession::add_entry`](crate::SitemapSession::add_entry).
///
/// ```rust
/// use sitemapgen_core::UrlInput;
///
/// let input = UrlInput::new("/product/")
///     .change_frequency("always")
///     .priority(0.8)
///     .alternate("de", "/de/product/");
/// assert_eq!(input.location, "/product/");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlInput {
    /// Path relative to the base URL, or a fully-qualified URL under it.
    pub location: String,
    /// Last modification time.
    pub last_modified: Option<DateTime<Utc>>,
    /// Change frequency token.
    pub change_frequency: Option<String>,
    /// Priority as a number or single-decimal string.
    pub priority: Option<PriorityValue>,
    /// `(hreflang, location)` pairs.
    pub alternates: Vec<(String, String)>,
}

impl UrlInput {
    /// Start an input for `location`.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Self::default()
        }
    }

    /// Set the last modification time.
    #[must_use]
    pub fn last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }

    /// Set the change frequency token.
    #[must_use]
    pub fn change_frequency(mut self, token: impl Into<String>) -> Self {
        self.change_frequency = Some(token.into());
        self
    }

    /// Set the priority.
    #[must_use]
    pub fn priority(mut self, value: impl Into<PriorityValue>) -> Self {
        self.priority = Some(value.into());
        self
    }

    /// Add a language alternate.
    #[must_use]
    pub fn alternate(mut self, hreflang: impl Into<String>, location: impl Into<String>) -> Self {
        self.alternates.push((hreflang.into(), location.into()));
        self
    }
}

/// Kind of file written by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// A sitemap chunk (`<urlset>`).
    Sitemap,
    /// The sitemap index (`<sitemapindex>`).
    Index,
}

/// A file written to the [`FileStore`](crate::FileStore) during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFile {
    /// Name relative to the store root.
    pub filename: String,
    /// Chunk or index.
    pub kind: FileKind,
    /// Number of `<url>` (or `<sitemap>`) records in the file.
    pub records: usize,
    /// Size of the rendered markup.
    pub uncompressed_bytes: u64,
    /// Size reported by the store after writing.
    pub written_bytes: u64,
    /// Whether the payload was compressed.
    pub compressed: bool,
    /// When the file was written.
    pub written_at: DateTime<Utc>,
}
