//! Configuration management

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::catalog::StorageItem;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Pass SHOW_HIDDEN_FILES to user-facing browses
    #[serde(default)]
    pub show_hidden_files: bool,

    /// Keep entries that are neither playable nor browsable
    #[serde(default = "default_show_all_files")]
    pub show_all_files: bool,

    /// Storage roots listed before network shares on a root browse
    #[serde(default)]
    pub roots: Vec<RootConfig>,
}

fn default_show_all_files() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            show_hidden_files: false,
            show_all_files: default_show_all_files(),
            roots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RootConfig {
    /// Filesystem path or URI
    pub path: String,
    pub title: Option<String>,
}

impl RootConfig {
    pub fn to_storage_item(&self) -> Option<StorageItem> {
        let Some(uri) = resolve_location(&self.path) else {
            tracing::warn!("Ignoring storage root {:?}: not a path or URI", self.path);
            return None;
        };
        let item = StorageItem::new(uri);
        Some(match &self.title {
            Some(title) if !title.is_empty() => item.with_title(title.clone()),
            _ => item,
        })
    }
}

impl Config {
    pub fn storage_roots(&self) -> Vec<StorageItem> {
        self.roots
            .iter()
            .filter_map(RootConfig::to_storage_item)
            .collect()
    }
}

/// Turn user input (URI or filesystem path) into a browsable location.
///
/// Anything with a multi-letter scheme is taken as a URI; everything else is
/// a path, made absolute against the working directory.
pub fn resolve_location(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(input) {
        // Single letters are Windows drive prefixes, not schemes
        if url.scheme().len() > 1 {
            return Some(url.to_string());
        }
    }

    let path = Path::new(input);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    Url::from_file_path(&path).ok().map(|url| url.to_string())
}

/// Get config directory (MEDIA_BROWSER_CONFIG_DIR or platform default)
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MEDIA_BROWSER_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library/Application Support/media-browser");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("media-browser");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".config/media-browser");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("media-browser");
        }
    }

    PathBuf::from(".")
}

pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir();

    let config = ::config::Config::builder()
        .set_default("show_hidden_files", false)?
        .set_default("show_all_files", true)?
        // Load from config file if it exists
        .add_source(
            ::config::File::with_name(&config_dir.join("config").to_string_lossy()).required(false),
        )
        // Override with environment variables (MEDIA_BROWSER_SHOW_HIDDEN_FILES, ...)
        .add_source(
            ::config::Environment::with_prefix("MEDIA_BROWSER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}
