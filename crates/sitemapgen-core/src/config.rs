//! Generator configuration.
//!
//! Settings are stored as TOML and can be overridden from the environment.
//! Every field has a default, so a file only needs the values it changes:
//!
//! ```rust
//! use sitemapgen_core::GeneratorConfig;
//!
//! let config: GeneratorConfig = toml::from_str(r#"
//!     [site]
//!     base_url = "https://example.com"
//!
//!     [output]
//!     compress = true
//! "#)?;
//!
//! assert_eq!(config.files.sitemap_filename, "sitemap.xml");
//! assert_eq!(config.limits.max_urls_per_sitemap, 50_000);
//! assert!(config.output.compress);
//! # Ok::<(), toml::de::Error>(())
//! ```
//!
//! ## Environment variables
//!
//! - `SITEMAPGEN_CONFIG`: path of the configuration file (read by the CLI)
//! - `SITEMAPGEN_BASE_URL`: overrides `site.base_url`
//! - `SITEMAPGEN_OUTPUT_DIR`: overrides `site.output_dir`

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::buffer::{MAX_SITEMAP_BYTES, MAX_URLS_PER_SITEMAP};
use crate::numeric::usize_to_u64;
use crate::validate::{validate_base_url, validate_distinct_filenames, validate_filename};
use crate::{Error, Result};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "SITEMAPGEN_CONFIG";
/// Environment variable overriding `site.base_url`.
pub const BASE_URL_ENV: &str = "SITEMAPGEN_BASE_URL";
/// Environment variable overriding `site.output_dir`.
pub const OUTPUT_DIR_ENV: &str = "SITEMAPGEN_OUTPUT_DIR";

/// Complete generator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Where the site lives and where files are written.
    pub site: SiteConfig,
    /// Output filenames.
    pub files: FilesConfig,
    /// Per-chunk limits.
    pub limits: LimitsConfig,
    /// Output encoding.
    pub output: OutputConfig,
}

/// `[site]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Public base URL every location is resolved against.
    pub base_url: String,
    /// Directory the sitemap files are written to.
    pub output_dir: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            output_dir: PathBuf::from("."),
        }
    }
}

/// `[files]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Chunk filename; numbered chunks insert the sequence before `.xml`.
    pub sitemap_filename: String,
    /// Index filename.
    pub sitemap_index_filename: String,
    /// Robots filename.
    pub robots_filename: String,
    /// Optional XSL stylesheet referenced from every document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stylesheet: Option<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            sitemap_filename: "sitemap.xml".to_string(),
            sitemap_index_filename: "sitemap_index.xml".to_string(),
            robots_filename: "robots.txt".to_string(),
            stylesheet: None,
        }
    }
}

/// `[limits]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum `<url>` elements per chunk, `1..=50000`.
    pub max_urls_per_sitemap: usize,
    /// Maximum uncompressed chunk size in bytes.
    pub max_sitemap_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_urls_per_sitemap: MAX_URLS_PER_SITEMAP,
            max_sitemap_bytes: MAX_SITEMAP_BYTES,
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Gzip chunk files.
    pub compress: bool,
}

impl GeneratorConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config {}: {e}", path.display())))
    }

    /// Load `path` if it exists, otherwise return defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;
        Ok(())
    }

    /// Platform config location of the default file.
    ///
    /// - Linux: `~/.config/sitemapgen/config.toml`
    /// - macOS: `~/Library/Application Support/dev.outfitter.sitemapgen/config.toml`
    /// - Windows: `%APPDATA%\outfitter\sitemapgen\config\config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let project_dirs = directories::ProjectDirs::from("dev", "outfitter", "sitemapgen")
            .ok_or_else(|| Error::Config("Failed to determine project directories".into()))?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty or whitespace-only values are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base_url) = get(BASE_URL_ENV) {
            self.site.base_url = base_url.trim().to_string();
        }
        if let Some(output_dir) = get(OUTPUT_DIR_ENV) {
            self.site.output_dir = PathBuf::from(output_dir.trim());
        }
    }

    /// Check every setting and return the parsed base URL.
    pub fn validate(&self) -> Result<Url> {
        if self.site.base_url.trim().is_empty() {
            return Err(Error::Config(format!(
                "site.base_url is not set (use the config file or {BASE_URL_ENV})"
            )));
        }
        let base = validate_base_url(&self.site.base_url)?;

        validate_filename(&self.files.sitemap_filename, Some(".xml"))?;
        validate_filename(&self.files.sitemap_index_filename, Some(".xml"))?;
        validate_filename(&self.files.robots_filename, Some(".txt"))?;
        validate_distinct_filenames(
            &self.files.sitemap_filename,
            &self.files.sitemap_index_filename,
        )?;

        let urls = self.limits.max_urls_per_sitemap;
        if !(1..=MAX_URLS_PER_SITEMAP).contains(&urls) {
            return Err(Error::OutOfRange {
                name: "max_urls_per_sitemap",
                value: usize_to_u64(urls),
                min: 1,
                max: usize_to_u64(MAX_URLS_PER_SITEMAP),
            });
        }
        let bytes = self.limits.max_sitemap_bytes;
        if !(1..=MAX_SITEMAP_BYTES).contains(&bytes) {
            return Err(Error::OutOfRange {
                name: "max_sitemap_bytes",
                value: usize_to_u64(bytes),
                min: 1,
                max: usize_to_u64(MAX_SITEMAP_BYTES),
            });
        }

        Ok(base)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn site_config() -> GeneratorConfig {
        let mut config = GeneratorConfig::default();
        config.site.base_url = "https://example.com".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.files.sitemap_index_filename, "sitemap_index.xml");
        assert_eq!(config.files.robots_filename, "robots.txt");
        assert_eq!(config.limits.max_sitemap_bytes, 52_428_800);
        assert!(!config.output.compress);
        assert!(config.files.stylesheet.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() -> Result<()> {
        // Given a customized configuration
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("config.toml");
        let mut original = site_config();
        original.limits.max_urls_per_sitemap = 1000;
        original.files.stylesheet = Some("/sitemap.xsl".to_string());
        original.output.compress = true;

        // When saving and loading it back
        original.save(&path)?;
        let loaded = GeneratorConfig::load(&path)?;

        // Then nothing is lost
        assert_eq!(loaded, original);
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let err = GeneratorConfig::load(Path::new("/definitely/does/not/exist/config.toml"))
            .unwrap_err();
        match err {
            Error::Config(msg) => assert!(msg.contains("Failed to read config")),
            other => panic!("expected Config error, got {other:?}"),
        }

        let config =
            GeneratorConfig::load_or_default(Path::new("/definitely/does/not/exist/config.toml"))
                .unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("invalid.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();

        let err = GeneratorConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("Failed to parse config")));
    }

    #[test]
    fn test_env_overrides() {
        let vars = HashMap::from([
            (BASE_URL_ENV, "https://override.example.com "),
            (OUTPUT_DIR_ENV, "/srv/www"),
        ]);
        let mut config = site_config();

        config.apply_overrides_from(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(config.site.base_url, "https://override.example.com");
        assert_eq!(config.site.output_dir, PathBuf::from("/srv/www"));
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = site_config();
        config.apply_overrides_from(|_| Some("   ".to_string()));
        assert_eq!(config.site.base_url, "https://example.com");
        assert_eq!(config.site.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_validate() {
        assert_eq!(site_config().validate().unwrap().as_str(), "https://example.com/");

        assert!(matches!(GeneratorConfig::default().validate(), Err(Error::Config(_))));

        let mut config = site_config();
        config.limits.max_urls_per_sitemap = 0;
        assert!(matches!(config.validate(), Err(Error::OutOfRange { .. })));

        let mut config = site_config();
        config.limits.max_sitemap_bytes = MAX_SITEMAP_BYTES + 1;
        assert!(matches!(config.validate(), Err(Error::OutOfRange { .. })));

        let mut config = site_config();
        config.files.sitemap_index_filename = "sitemap.xml".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidFilename(_))));

        let mut config = site_config();
        config.files.sitemap_filename = "sitemap.txt".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidFilename(_))));

        let mut config = site_config();
        config.files.sitemap_index_filename = "sitemap1.xml".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidFilename(_))));

        let mut config = site_config();
        config.files.robots_filename = "robots file.txt".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidFilename(_))));
    }
}
