//! Side-effect-free validators for sitemap inputs.
//!
//! Each function can be called on its own, without a session, and either
//! returns the normalized value or an invalid-argument [`Error`].
//!
//! ```rust
//! use sitemapgen_core::{validate_base_url, validate_url, validate_priority};
//!
//! let base = validate_base_url("http://example.com")?;
//! let loc = validate_url(&base, "/product/")?;
//! assert_eq!(loc.as_str(), "http://example.com/product/");
//!
//! assert_eq!(validate_priority("0.8")?.to_string(), "0.8");
//! assert!(validate_priority(0.85).is_err());
//! # Ok::<(), sitemapgen_core::Error>(())
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use url::Url;

use crate::types::{Alternate, ChangeFrequency, Priority, PriorityValue};
use crate::{Error, Result};

/// Maximum length of a `<loc>` value in bytes.
pub const MAX_URL_BYTES: usize = 2048;

/// Tolerance when matching a float to a tenth; wide enough for `f32` inputs.
const TENTH_TOLERANCE: f64 = 1e-6;

/// Validate the site base URL every location is resolved against.
///
/// The base must be an absolute `http`/`https` URL with a host and without a
/// query or fragment.
pub fn validate_base_url(base: &str) -> Result<Url> {
    let url = Url::parse(base.trim())
        .map_err(|e| Error::InvalidUrl(format!("base URL '{base}' is not a valid address: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl(format!(
            "base URL '{base}' must use http or https"
        )));
    }
    if url.host_str().is_none() {
        return Err(Error::InvalidUrl(format!("base URL '{base}' has no host")));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::InvalidUrl(format!(
            "base URL '{base}' must not carry a query or fragment"
        )));
    }

    Ok(url)
}

/// Resolve `path` against `base` and validate the result as a sitemap location.
///
/// Relative paths are appended to the base (`/product/` under
/// `http://example.com/shop` becomes `http://example.com/shop/product/`).
/// Fully-qualified URLs are accepted as long as they live under the base.
/// The resolved location must not exceed [`MAX_URL_BYTES`].
pub fn validate_url(base: &Url, path: &str) -> Result<Url> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("location is empty".to_string()));
    }

    let candidate = match Url::parse(trimmed) {
        Ok(_) => trimmed.to_string(),
        Err(url::ParseError::RelativeUrlWithoutBase) => resolve_against_base(base, trimmed),
        Err(e) => return Err(Error::InvalidUrl(format!("'{trimmed}': {e}"))),
    };

    if candidate.len() > MAX_URL_BYTES {
        return Err(too_long(candidate.len()));
    }

    let url = Url::parse(&candidate)
        .map_err(|e| Error::InvalidUrl(format!("'{candidate}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl(format!(
            "'{candidate}' must use http or https"
        )));
    }
    // Normalization may percent-encode characters and grow the location.
    if url.as_str().len() > MAX_URL_BYTES {
        return Err(too_long(url.as_str().len()));
    }
    if !is_under_base(base, &url) {
        return Err(Error::InvalidUrl(format!(
            "'{url}' is outside the base URL '{base}'"
        )));
    }

    Ok(url)
}

/// Check a change-frequency token against the seven protocol values.
///
/// Matching is case-sensitive.
pub fn validate_change_frequency(token: &str) -> Result<ChangeFrequency> {
    token.parse()
}

/// Validate a priority given as a number or as a single-decimal string.
///
/// Only the eleven values `0.0, 0.1, ..., 1.0` are accepted. Strings must
/// spell the value with exactly one fractional digit (`"0.5"`, not `"0.50"`
/// or `".5"`).
pub fn validate_priority(value: impl Into<PriorityValue>) -> Result<Priority> {
    let value = value.into();
    let tenths = match &value {
        PriorityValue::Number(n) => tenths_from_float(*n),
        PriorityValue::Text(s) => tenths_from_text(s),
    };

    tenths
        .and_then(Priority::from_tenths)
        .ok_or_else(|| Error::InvalidPriority(value.to_string()))
}

/// Returns `true` if `token` is a valid change frequency.
pub fn is_valid_changefreq_value(token: &str) -> bool {
    validate_change_frequency(token).is_ok()
}

/// Returns `true` if `value` is one of the canonical priority tenths.
pub fn is_valid_priority_value(value: impl Into<PriorityValue>) -> bool {
    validate_priority(value).is_ok()
}

/// Validate an `hreflang` code and its location.
pub fn validate_alternate(base: &Url, hreflang: &str, location: &str) -> Result<Alternate> {
    let valid_lang = !hreflang.is_empty()
        && hreflang
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !valid_lang {
        return Err(Error::InvalidUrl(format!(
            "alternate for '{location}' has an invalid hreflang '{hreflang}'"
        )));
    }

    Ok(Alternate {
        hreflang: hreflang.to_string(),
        href: validate_url(base, location)?,
    })
}

/// Validate a bare filename, optionally requiring an extension.
///
/// Filenames must be non-empty, must not contain path separators, and may
/// only use characters that need no percent-encoding in a URL path (ASCII
/// letters, digits, `-`, `_`, `.`, `~`). When `extension` is given the name
/// must end with it after a non-empty stem.
pub fn validate_filename(name: &str, extension: Option<&str>) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidFilename("filename is empty".to_string()));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::InvalidFilename(format!(
            "'{name}' must be a bare filename, not a path"
        )));
    }
    if let Some(bad) = name.chars().find(|c| !is_url_safe_filename_char(*c)) {
        return Err(Error::InvalidFilename(format!(
            "'{name}' contains '{bad}', which is not allowed in a published filename"
        )));
    }
    if let Some(ext) = extension {
        let has_stem = name.len() > ext.len();
        if !has_stem || !name.ends_with(ext) {
            return Err(Error::InvalidFilename(format!(
                "'{name}' must end with '{ext}'"
            )));
        }
    }
    Ok(())
}

/// Check that the index file cannot collide with any chunk file.
///
/// Chunks are written as `<sitemap>` or, when numbered, `<stem>N.xml`, so
/// the index may be neither.
pub fn validate_distinct_filenames(sitemap: &str, index: &str) -> Result<()> {
    let stem = sitemap.strip_suffix(".xml").unwrap_or(sitemap);
    let numbered_chunk = index
        .strip_suffix(".xml")
        .and_then(|rest| rest.strip_prefix(stem))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()));

    if index == sitemap || numbered_chunk {
        return Err(Error::InvalidFilename(format!(
            "index filename '{index}' collides with the chunk files of '{sitemap}'"
        )));
    }
    Ok(())
}

const fn is_url_safe_filename_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')
}

/// Parse a timestamp in any of the formats commonly found in `lastmod`.
///
/// Supports:
/// - `2024-01-15` (date only)
/// - `2024-01-15T10:30:00Z` / `2024-01-15T10:30:00+02:00` (RFC 3339)
/// - `2024-01-15T10:30:00` and `2024-01-15T10:30:00.123` (assumed UTC)
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }

    tracing::debug!(date_str = %s, "Could not parse timestamp");
    None
}

/// Append `path` to `base` as a plain string join.
pub(crate) fn resolve_against_base(base: &Url, path: &str) -> String {
    let root = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{root}/{path}")
}

fn is_under_base(base: &Url, url: &Url) -> bool {
    if url.scheme() != base.scheme()
        || url.host_str() != base.host_str()
        || url.port_or_known_default() != base.port_or_known_default()
    {
        return false;
    }

    let prefix = base.path().trim_end_matches('/');
    prefix.is_empty() || url.path() == prefix || url.path().starts_with(&format!("{prefix}/"))
}

fn too_long(len: usize) -> Error {
    Error::InvalidUrl(format!(
        "location is {len} bytes, the protocol limit is {MAX_URL_BYTES}"
    ))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range-checked before the cast
fn tenths_from_float(value: f64) -> Option<u8> {
    let scaled = value * 10.0;
    let rounded = scaled.round();
    if (scaled - rounded).abs() < TENTH_TOLERANCE && (0.0..=10.0).contains(&rounded) {
        Some(rounded as u8)
    } else {
        None
    }
}

fn tenths_from_text(text: &str) -> Option<u8> {
    match text.as_bytes() {
        [b'0', b'.', digit @ b'0'..=b'9'] => Some(digit - b'0'),
        [b'1', b'.', b'0'] => Some(10),
        _ => None,
    }
}
