// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Map configuration on disk.
//!
//! [`MapConfig`] describes how a fresh [`Map`](crate::Map) is prepared. It is
//! stored as `map.json` inside a [`ConfigDir`], by default the per-user
//! config directory.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use mapnik_port::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::RenderOpts;

/// Settings applied by [`Map::with_config`](crate::Map::with_config).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Map width in pixels.
    pub width: u32,
    /// Map height in pixels.
    pub height: u32,
    /// Projection override; the engine default when absent.
    pub srs: Option<String>,
    /// Background override as straight RGBA.
    pub background: Option<[u8; 4]>,
    /// Default render options for callers to reuse.
    pub render: RenderOpts,
    /// Directories of font files to register.
    pub font_dirs: Vec<PathBuf>,
    /// Directories of datasource plugins to register.
    pub plugin_dirs: Vec<PathBuf>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            srs: None,
            background: None,
            render: RenderOpts::default(),
            font_dirs: Vec::new(),
            plugin_dirs: Vec::new(),
        }
    }
}

impl MapConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Read and parse the JSON file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let bytes = fs::read(path)?;
        Self::from_json(&bytes)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, ConfigError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

/// Failure to read or write a [`MapConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not a valid map config.
    #[error("invalid map config: {0}")]
    Serde(#[from] serde_json::Error),
    /// The platform has no per-user config directory (no home directory).
    #[error("no user config directory for mapnik-rs")]
    NoConfigDir,
}

/// Directory holding `map.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDir {
    base: PathBuf,
}

impl ConfigDir {
    /// File name of the map config inside the directory.
    pub const MAP_FILE: &'static str = "map.json";

    /// Use `base`; it is created on first save.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// The per-user config directory (e.g. `~/.config/mapnik-rs` on Linux).
    pub fn user() -> Result<Self, ConfigError> {
        ProjectDirs::from("org", "mapnik", "mapnik-rs")
            .map(|dirs| Self::new(dirs.config_dir()))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// The directory itself.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Full path of the map config file.
    pub fn map_config_path(&self) -> PathBuf {
        self.base.join(Self::MAP_FILE)
    }

    /// Read the map config. A missing file yields [`MapConfig::default`].
    pub fn load_map_config(&self) -> Result<MapConfig, ConfigError> {
        let path = self.map_config_path();
        match fs::read(&path) {
            Ok(bytes) => MapConfig::from_json(&bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no map config, using defaults");
                Ok(MapConfig::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Write the map config, creating the directory if needed.
    pub fn save_map_config(&self, config: &MapConfig) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.base)?;
        let path = self.map_config_path();
        fs::write(&path, config.to_json()?)?;
        debug!(path = %path.display(), "map config saved");
        Ok(())
    }
}
