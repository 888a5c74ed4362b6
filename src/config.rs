//! Site configuration module.
//!
//! Handles loading, validating, and layering `site.toml`. Stock defaults are
//! the base layer; the user's file (if any) is merged on top key by key, so a
//! site only has to spell out the values it wants to change.
//!
//! ## Config File Location
//!
//! `site.toml` lives in the site root, next to the content directories:
//!
//! ```text
//! site/
//! ├── site.toml            # Optional; every key has a default
//! ├── index.html           # Homepage (regenerated in place)
//! ├── sitemap.xml          # Regenerated
//! ├── posts/               # Notes
//! ├── library/             # Book entries
//! └── images/books/        # Cover images
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! site_url = "https://example.com"
//! author_name = "Site Author"
//! default_section = "Uncategorized"
//! library_section = "Library"
//! sections = ["Technology", "Notes", "Musings", "Work", "Library"]
//!
//! [paths]
//! posts = "posts"
//! library = "library"
//! covers = "images/books"
//! homepage = "index.html"
//! sitemap = "sitemap.xml"
//!
//! [covers]
//! width = 400
//! height = 600
//! quality = 85
//!
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//! max_upload_bytes = 10485760
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file inside the site root.
pub const CONFIG_FILENAME: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Public base URL, used for sitemap locations. No trailing slash.
    pub site_url: String,
    /// Author shown in page footers and suffixed to `<title>`.
    pub author_name: String,
    /// Section given to items that don't declare one.
    pub default_section: String,
    /// The section label that selects the book template and `library/`.
    pub library_section: String,
    /// Section labels offered by the editor. Sections stay free text.
    pub sections: Vec<String>,
    pub paths: PathsConfig,
    pub covers: CoversConfig,
    pub server: ServerConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_url: "https://example.com".to_string(),
            author_name: "Site Author".to_string(),
            default_section: "Uncategorized".to_string(),
            library_section: "Library".to_string(),
            sections: ["Technology", "Notes", "Musings", "Work", "Library"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            paths: PathsConfig::default(),
            covers: CoversConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site_url.trim().is_empty() {
            return Err(ConfigError::Validation("site_url must not be empty".into()));
        }
        if self.library_section.trim().is_empty() {
            return Err(ConfigError::Validation(
                "library_section must not be empty".into(),
            ));
        }
        if self.covers.quality == 0 || self.covers.quality > 100 {
            return Err(ConfigError::Validation(
                "covers.quality must be 1-100".into(),
            ));
        }
        if self.covers.width == 0 || self.covers.height == 0 {
            return Err(ConfigError::Validation(
                "covers.width and covers.height must be non-zero".into(),
            ));
        }
        if self.paths.posts == self.paths.library {
            return Err(ConfigError::Validation(
                "paths.posts and paths.library must differ".into(),
            ));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }

    /// Whether a section label selects the library (book) category.
    pub fn is_library_section(&self, section: &str) -> bool {
        section.trim().eq_ignore_ascii_case(self.library_section.trim())
    }
}

/// Locations of the content directories and derived artifacts, relative to the site root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub posts: String,
    pub library: String,
    pub covers: String,
    pub homepage: String,
    pub sitemap: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            posts: "posts".to_string(),
            library: "library".to_string(),
            covers: "images/books".to_string(),
            homepage: "index.html".to_string(),
            sitemap: "sitemap.xml".to_string(),
        }
    }
}

/// Fixed target size and encoding quality for uploaded book covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoversConfig {
    pub width: u32,
    pub height: u32,
    /// JPEG quality (1-100).
    pub quality: u8,
}

impl Default for CoversConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 600,
            quality: 85,
        }
    }
}

/// Editor server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on request bodies, cover uploads included.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Absolute locations for one site, resolved once from the explicit root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub root: PathBuf,
    pub posts: PathBuf,
    pub library: PathBuf,
    pub covers: PathBuf,
    pub homepage: PathBuf,
    pub sitemap: PathBuf,
}

impl SitePaths {
    pub fn resolve(root: &Path, paths: &PathsConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            posts: root.join(&paths.posts),
            library: root.join(&paths.library),
            covers: root.join(&paths.covers),
            homepage: root.join(&paths.homepage),
            sitemap: root.join(&paths.sitemap),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `site.toml` from the site root as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `site.toml` in the site root, falling back to stock defaults.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `site.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Folio Site Configuration
# ========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys cause an error.

# Public base URL used for sitemap locations.
site_url = "https://example.com"

# Shown in page footers and appended to every <title>.
author_name = "Site Author"

# Section given to items that don't declare one.
default_section = "Uncategorized"

# Items in this section use the book template and live under paths.library.
library_section = "Library"

# Section labels suggested by the editor. Any other label is accepted too.
sections = ["Technology", "Notes", "Musings", "Work", "Library"]

# ---------------------------------------------------------------------------
# Paths (relative to the site root)
# ---------------------------------------------------------------------------
[paths]
posts = "posts"
library = "library"
covers = "images/books"
homepage = "index.html"
sitemap = "sitemap.xml"

# ---------------------------------------------------------------------------
# Book covers: uploads are cropped to exactly width x height and saved as JPEG
# ---------------------------------------------------------------------------
[covers]
width = 400
height = 600
quality = 85

# ---------------------------------------------------------------------------
# Editor server
# ---------------------------------------------------------------------------
[server]
host = "127.0.0.1"
port = 3000
max_upload_bytes = 10485760
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_sections() {
        let config = SiteConfig::default();
        assert_eq!(config.library_section, "Library");
        assert_eq!(config.default_section, "Uncategorized");
        assert!(config.sections.iter().any(|s| s == "Library"));
    }

    #[test]
    fn default_config_has_cover_settings() {
        let config = SiteConfig::default();
        assert_eq!(config.covers.width, 400);
        assert_eq!(config.covers.height, 600);
        assert_eq!(config.covers.quality, 85);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
site_url = "https://notes.example.org"

[server]
port = 4000
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.site_url, "https://notes.example.org");
        assert_eq!(config.server.port, 4000);
        // Defaults preserved
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.paths.posts, "posts");
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        let config = SiteConfig {
            site_url: "https://example.com/".to_string(),
            ..SiteConfig::default()
        };
        assert_eq!(config.base_url(), "https://example.com");
    }

    #[test]
    fn library_section_match_ignores_case_and_whitespace() {
        let config = SiteConfig::default();
        assert!(config.is_library_section("Library"));
        assert!(config.is_library_section(" library "));
        assert!(!config.is_library_section("Technology"));
    }

    #[test]
    fn site_paths_resolve_from_root() {
        let paths = SitePaths::resolve(Path::new("/srv/site"), &PathsConfig::default());
        assert_eq!(paths.posts, Path::new("/srv/site/posts"));
        assert_eq!(paths.library, Path::new("/srv/site/library"));
        assert_eq!(paths.covers, Path::new("/srv/site/images/books"));
        assert_eq!(paths.homepage, Path::new("/srv/site/index.html"));
        assert_eq!(paths.sitemap, Path::new("/srv/site/sitemap.xml"));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.site_url, "https://example.com");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
author_name = "Jo Writer"

[covers]
quality = 70
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.author_name, "Jo Writer");
        assert_eq!(config.covers.quality, 70);
        assert_eq!(config.covers.width, 400);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "this is not valid toml [[[").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
[covers]
quality = 0
"#,
        )
        .unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[covers]
qualty = 90
"#;
        let result: Result<SiteConfig, _> = toml::from_str(toml_str);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[pathz]\nposts = \"x\"\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_cover_dimensions() {
        let mut config = SiteConfig::default();
        config.covers.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_shared_content_dirs() {
        let mut config = SiteConfig::default();
        config.paths.library = "posts".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("paths.posts"));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[server]\nport = 3000\nhost = \"a\"\n").unwrap();
        let overlay: toml::Value = toml::from_str("[server]\nport = 8080\n").unwrap();
        let merged = merge_toml(base, overlay);
        let server = merged.get("server").unwrap();
        assert_eq!(server.get("port").unwrap().as_integer(), Some(8080));
        assert_eq!(server.get("host").unwrap().as_str(), Some("a"));
    }

    #[test]
    fn merge_toml_replaces_arrays_whole() {
        let base: toml::Value = toml::from_str(r#"sections = ["a", "b", "c"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"sections = ["z"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("sections").unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn resolve_config_with_no_overlay() {
        let base = stock_defaults_value().unwrap();
        let config = resolve_config(base, None).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(config.site_url, defaults.site_url);
        assert_eq!(config.sections, defaults.sections);
        assert_eq!(config.paths.covers, defaults.paths.covers);
        assert_eq!(config.covers.quality, defaults.covers.quality);
        assert_eq!(config.server.max_upload_bytes, defaults.server.max_upload_bytes);
    }
}
