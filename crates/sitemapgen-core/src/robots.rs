//! Patch a robots.txt body so it references the sitemap index.

use tracing::warn;

/// Body used when the site has no robots file yet.
pub const DEFAULT_ROBOTS: &str = "User-agent: *\nAllow: /\n";

/// Return `existing` with exactly one `Sitemap:` directive pointing at
/// `index_url`.
///
/// Every other `Sitemap:` line is dropped (the directive name is matched
/// case-insensitively), all remaining lines are kept in order, and the new
/// directive is appended at the end. A missing file starts from
/// [`DEFAULT_ROBOTS`]. Patching the output again yields the same text.
///
/// ```
/// use sitemapgen_core::patch_robots;
///
/// let body = patch_robots(
///     Some("User-agent: *\nDisallow: /admin\nsitemap: http://old.example.com/map.xml\n"),
///     "http://example.com/sitemap_index.xml",
/// );
/// assert_eq!(
///     body,
///     "User-agent: *\nDisallow: /admin\nSitemap: http://example.com/sitemap_index.xml\n"
/// );
/// ```
pub fn patch_robots(existing: Option<&str>, index_url: &str) -> String {
    let source = existing.unwrap_or(DEFAULT_ROBOTS);
    let mut out = String::with_capacity(source.len() + index_url.len() + 10);

    for line in source.lines() {
        if is_sitemap_directive(line) {
            if line.split_once(':').is_some_and(|(_, v)| v.trim() != index_url) {
                warn!(line = line.trim(), "Replacing sitemap directive in robots file");
            }
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }

    while out.ends_with("\n\n") {
        out.pop();
    }
    if out.trim().is_empty() {
        out.clear();
    }

    out.push_str("Sitemap: ");
    out.push_str(index_url);
    out.push('\n');
    out
}

fn is_sitemap_directive(line: &str) -> bool {
    line.split_once(':')
        .is_some_and(|(key, _)| key.trim().eq_ignore_ascii_case("sitemap"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = "http://example.com/sitemap_index.xml";

    #[test]
    fn test_missing_file_starts_from_default() {
        let body = patch_robots(None, INDEX);
        assert_eq!(body, format!("User-agent: *\nAllow: /\nSitemap: {INDEX}\n"));
    }

    #[test]
    fn test_existing_rules_are_preserved() {
        let existing = "# crawl rules\nUser-agent: *\nDisallow: /private\n\nUser-agent: bot\nDisallow: /\n";

        let body = patch_robots(Some(existing), INDEX);

        assert!(body.starts_with(existing));
        assert!(body.ends_with(&format!("Sitemap: {INDEX}\n")));
    }

    #[test]
    fn test_all_sitemap_lines_are_replaced() {
        let existing = "User-agent: *\nSITEMAP: http://a/1.xml\nDisallow: /x\n  Sitemap : http://a/2.xml\n";

        let body = patch_robots(Some(existing), INDEX);

        assert_eq!(body, format!("User-agent: *\nDisallow: /x\nSitemap: {INDEX}\n"));
        assert_eq!(body.to_lowercase().matches("sitemap").count(), 2); // directive + filename
    }

    #[test]
    fn test_patch_is_idempotent() {
        let once = patch_robots(Some("User-agent: *\nDisallow:"), INDEX);
        let twice = patch_robots(Some(&once), INDEX);
        assert_eq!(once, twice);
        assert_eq!(once, format!("User-agent: *\nDisallow:\nSitemap: {INDEX}\n"));
    }

    #[test]
    fn test_trailing_blank_lines_collapse() {
        let body = patch_robots(Some("User-agent: *\n\n\n"), INDEX);
        assert_eq!(body, format!("User-agent: *\nSitemap: {INDEX}\n"));
    }

    #[test]
    fn test_empty_file_gets_only_directive() {
        assert_eq!(patch_robots(Some(""), INDEX), format!("Sitemap: {INDEX}\n"));
    }
}
