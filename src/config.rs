//! # Application Configuration
//!
//! Configuration is read from environment variables or a TOML file. Every
//! key is optional.
//!
//! ## Environment Variables
//!
//! | Variable                | Default     | Meaning                                   |
//! |-------------------------|-------------|-------------------------------------------|
//! | `SENGOKU_STATIC_DIR`    | *(unset)*   | Directory served under the static prefix  |
//! | `SENGOKU_STATIC_PREFIX` | `/static`   | URL prefix that bypasses the router       |
//! | `SENGOKU_TEMPLATES_DIR` | `templates` | Directory templates are loaded from       |
//!
//! ## TOML
//!
//! ```toml
//! static_dir = "public"
//! static_prefix = "/assets"
//! templates_dir = "views"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_STATIC_PREFIX: &str = "/static";
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Static asset directory; static serving is off when `None`
    pub static_dir: Option<PathBuf>,
    /// Normalized prefix: leading `/`, no trailing `/`
    pub static_prefix: String,
    /// Template directory
    pub templates_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            static_dir: None,
            static_prefix: DEFAULT_STATIC_PREFIX.to_string(),
            templates_dir: PathBuf::from(DEFAULT_TEMPLATES_DIR),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    static_dir: Option<PathBuf>,
    static_prefix: Option<String>,
    templates_dir: Option<PathBuf>,
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(raw: RawConfig) -> Result<Self> {
        let defaults = AppConfig::default();
        Ok(Self {
            static_dir: raw.static_dir,
            static_prefix: match raw.static_prefix {
                Some(p) => normalize_prefix(&p)?,
                None => defaults.static_prefix,
            },
            templates_dir: raw.templates_dir.unwrap_or(defaults.templates_dir),
        })
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        RawConfig {
            static_dir: env::var_os("SENGOKU_STATIC_DIR").map(PathBuf::from),
            static_prefix: env::var("SENGOKU_STATIC_PREFIX").ok(),
            templates_dir: env::var_os("SENGOKU_TEMPLATES_DIR").map(PathBuf::from),
        }
        .try_into()
        .context("invalid SENGOKU_* environment")
    }

    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(s).context("invalid configuration")?;
        raw.try_into()
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in config file {}", path.display()))
    }
}

/// `static/` -> `/static`. A prefix with no segment left (`/`, ``) would
/// shadow every route and is refused.
pub(crate) fn normalize_prefix(prefix: &str) -> Result<String> {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        anyhow::bail!("static prefix '{prefix}' names no path segment");
    }
    Ok(format!("/{trimmed}"))
}
