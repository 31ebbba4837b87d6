#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

fn home_dir() -> &'static Path {
    static HOME_DIR: OnceLock<TempDir> = OnceLock::new();
    HOME_DIR
        .get_or_init(|| tempfile::tempdir().expect("failed to create home dir for tests"))
        .path()
}

/// Create a configured `sitemapgen` command suitable for integration tests.
///
/// The platform config location points into an empty temp dir and every
/// `SITEMAPGEN_*` override is cleared, so tests only see the flags they pass.
#[allow(dead_code)]
pub fn sitemapgen_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sitemapgen"));
    cmd.timeout(CMD_TIMEOUT);
    let home = home_dir();
    cmd.env("HOME", home);
    cmd.env("XDG_CONFIG_HOME", home.join(".config"));
    cmd.env("APPDATA", home);
    cmd.env_remove("SITEMAPGEN_CONFIG");
    cmd.env_remove("SITEMAPGEN_BASE_URL");
    cmd.env_remove("SITEMAPGEN_OUTPUT_DIR");
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Write a URL list into `dir` and return its path.
#[allow(dead_code)]
pub fn write_url_list(dir: &Path, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.join("urls.txt");
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

/// `generate` for `https://example.com` writing into `out`.
#[allow(dead_code)]
pub fn generate_cmd(input: &Path, out: &Path) -> Command {
    let mut cmd = sitemapgen_cmd();
    cmd.arg("generate")
        .arg(input)
        .args(["--base-url", "https://example.com"])
        .arg("--output-dir")
        .arg(out);
    cmd
}
