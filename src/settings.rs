//! Persisted packer settings
//!
//! The settings store is a TOML file shared with other tools; this crate owns
//! only the `[zstdwcx]` table and leaves every other table untouched on save.
//!
//! ```toml
//! [zstdwcx]
//! compression_level = 3
//! ```

use crate::error::{ArchiveError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Table holding this plug-in's keys
pub const SETTINGS_SECTION: &str = "zstdwcx";

/// File name used next to the host's default settings file
pub const SETTINGS_FILE_NAME: &str = "zstdwcx.toml";

/// Zstandard level accepted by the packer, always within 1..=19
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CompressionLevel(i32);

impl CompressionLevel {
    pub const MIN: CompressionLevel = CompressionLevel(1);
    pub const MAX: CompressionLevel = CompressionLevel(19);
    pub const DEFAULT: CompressionLevel = CompressionLevel(3);

    /// Clamp any stored value onto the supported range
    pub fn clamped(level: i64) -> Self {
        Self(level.clamp(Self::MIN.0 as i64, Self::MAX.0 as i64) as i32)
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Contents of the `[zstdwcx]` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Raw stored level; read through [`Settings::level`]
    pub compression_level: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            compression_level: CompressionLevel::DEFAULT.get() as i64,
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file, table or key is
    /// missing or unreadable.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "using default settings");
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let table: toml::Table = toml::from_str(&text)
            .map_err(|e| ArchiveError::ReadError(format!("invalid settings file: {}", e)))?;

        match table.get(SETTINGS_SECTION) {
            Some(section) => section
                .clone()
                .try_into()
                .map_err(|e| ArchiveError::ReadError(format!("invalid [{}] table: {}", SETTINGS_SECTION, e))),
            None => Ok(Self::default()),
        }
    }

    /// Write the `[zstdwcx]` table, keeping any other tables already in the file
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut table = fs::read_to_string(path)
            .ok()
            .and_then(|text| toml::from_str::<toml::Table>(&text).ok())
            .unwrap_or_default();

        let section = toml::Value::try_from(self)
            .map_err(|e| ArchiveError::WriteError(format!("cannot encode settings: {}", e)))?;
        table.insert(SETTINGS_SECTION.to_string(), section);

        let text = toml::to_string(&table)
            .map_err(|e| ArchiveError::WriteError(format!("cannot encode settings: {}", e)))?;
        fs::write(path, text).map_err(|e| ArchiveError::WriteError(format!("{}: {}", path.display(), e)))
    }

    pub fn level(&self) -> CompressionLevel {
        CompressionLevel::clamped(self.compression_level)
    }
}

/// Settings file that lives next to the host's default settings file
pub fn settings_path_for(host_default: &Path) -> PathBuf {
    match host_default.parent() {
        Some(dir) => dir.join(SETTINGS_FILE_NAME),
        None => PathBuf::from(SETTINGS_FILE_NAME),
    }
}
