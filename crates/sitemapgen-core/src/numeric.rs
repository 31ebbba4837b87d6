//! Numeric helpers for size reporting.
//!
//! Conversions that clippy would otherwise flag are collected here, each with
//! its precision trade-off documented.

use std::time::Duration;

/// Percentage change from `before` to `after` bytes.
///
/// Computed as `(after - before) / before * 100`, so shrinking is negative and
/// growth is positive. Returns `None` when `before` is zero.
///
/// # Examples
///
/// ```
/// use sitemapgen_core::numeric::size_delta_percent;
///
/// assert_eq!(size_delta_percent(100, 90), Some(-10.0));
/// assert_eq!(size_delta_percent(100, 110), Some(10.0));
/// assert_eq!(size_delta_percent(0, 10), None);
/// ```
#[must_use]
pub fn size_delta_percent(before: u64, after: u64) -> Option<f64> {
    if before == 0 {
        return None;
    }
    let before = u64_to_f64_lossy(before);
    let after = u64_to_f64_lossy(after);
    Some((after - before) / before * 100.0)
}

/// Convert a [`Duration`] to whole milliseconds, saturating at `u64::MAX`.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)] // saturates via min()
pub fn duration_to_millis_saturating(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

/// Convert a `usize` to `u64`. Lossless on every supported platform.
#[inline]
#[must_use]
pub const fn usize_to_u64(n: usize) -> u64 {
    n as u64
}

/// Convert a `u64` to `f64`; values above 2^53 lose precision.
#[inline]
#[must_use]
#[allow(clippy::cast_precision_loss)] // acceptable for display
pub const fn u64_to_f64_lossy(n: u64) -> f64 {
    n as f64
}

/// Convert bytes to a human-readable size string with appropriate units.
///
/// # Examples
///
/// ```
/// use sitemapgen_core::numeric::format_bytes;
///
/// assert_eq!(format_bytes(0), "0 B");
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// assert_eq!(format_bytes(52_428_800), "50.0 MB");
/// ```
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let bytes_f = u64_to_f64_lossy(bytes);

    if bytes_f >= GB {
        format!("{:.1} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.1} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}
