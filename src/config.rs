use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cleanup::CleanupMode;
use crate::enumerate::UNKNOWN_FOLDER;
use crate::store::StoreKind;

/// Tool configuration, read from `config.toml`. Every field has a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub cleanup: CleanupConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: Option<StoreKind>,

    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    #[serde(default)]
    pub default_mode: CleanupMode,

    /// Copy the bookmarks file before the first delete.
    #[serde(default = "default_true")]
    pub backup: bool,

    /// Ask before deleting anything.
    #[serde(default = "default_true")]
    pub confirm: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_unknown_folder")]
    pub unknown_folder: String,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            default_mode: CleanupMode::default(),
            backup: default_true(),
            confirm: default_true(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            unknown_folder: default_unknown_folder(),
        }
    }
}

fn default_true() -> bool { true }
fn default_unknown_folder() -> String { UNKNOWN_FOLDER.to_string() }

impl Config {
    /// `$XDG_CONFIG_HOME/bookmark-dedupe/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bookmark-dedupe").join("config.toml"))
    }

    /// Load `path`, or the default location when `path` is `None`.
    ///
    /// A missing default file yields the default config; an explicitly given
    /// file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply command-line store selection on top of the file settings.
    pub fn override_store(&mut self, kind: StoreKind, path: PathBuf) {
        self.store.kind = Some(kind);
        self.store.path = Some(path);
    }

    /// The store to open, rejecting configs that do not name one.
    pub fn validate(&self) -> Result<(StoreKind, PathBuf)> {
        let path = self.store.path.clone().ok_or_else(|| {
            anyhow!("❌ Error: No bookmark store given. Use --chromium <Bookmarks> or --firefox <places.sqlite>, or set store.path in the config file.")
        })?;
        let kind = match self.store.kind {
            Some(kind) => kind,
            None if path.extension().is_some_and(|ext| ext == "sqlite") => StoreKind::Firefox,
            None => StoreKind::Chromium,
        };
        Ok((kind, path))
    }
}
