//! Configuration and settings management for TileKit5
//!
//! Provides configuration file handling, settings management, and validation.
//! Supports JSON and TOML file formats stored in platform-specific directories.
//!
//! Configuration is organized into logical sections:
//! - Snapping settings (tolerances, toggles, quantization resolution)
//! - View preferences (zoom limits and step)

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Magnetic snapping settings.
///
/// Every tunable of the snap search and the drag gesture lives here so the
/// behavior can be adjusted without code changes. Distances are in scene
/// units (tile edges are unit length by convention).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    /// Snap dragged selections to nearby tile snap points.
    pub snap_to_tiles: bool,
    /// Quantize rotation drags to the angular resolution.
    pub snap_to_angles: bool,
    /// Maximum distance between two snap points for a snap to engage.
    pub snap_dist: f64,
    /// Number of steps in a full turn for angle quantization (120 gives 3°).
    pub angular_resolution: u32,
    /// Wall-clock budget for one snap search, in milliseconds.
    pub search_budget_ms: u64,
    /// Pairs closer than `snap_dist / exclude_divisor` to the excluded
    /// point are skipped during the search.
    pub exclude_divisor: f64,
    /// Query rectangles are expanded by `snap_dist * margin_factor` so
    /// borderline candidates are not lost to floating-point rounding.
    pub margin_factor: f64,
    /// A release this soon after a press keeps the drag alive (the tile
    /// is "picked up" and dropped with a second click).
    pub sticky_grab_ms: u64,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            snap_to_tiles: true,
            snap_to_angles: true,
            snap_dist: 0.25,
            angular_resolution: 120,
            search_budget_ms: 250,
            exclude_divisor: 100.0,
            margin_factor: 1.001,
            sticky_grab_ms: 200,
        }
    }
}

impl SnapSettings {
    /// The angle quantization step in degrees.
    pub fn angle_step_degrees(&self) -> f64 {
        360.0 / self.angular_resolution as f64
    }
}

/// View preference settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Zoom multiplier per wheel step.
    pub zoom_step: f64,
    /// Minimum zoom level.
    pub zoom_min: f64,
    /// Maximum zoom level.
    pub zoom_max: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            zoom_step: 1.5,
            zoom_min: 0.001,
            zoom_max: 1000.0,
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Snapping settings
    pub snap: SnapSettings,
    /// View preferences
    pub view: ViewSettings,
    /// Recent files list
    pub recent_files: Vec<PathBuf>,
}

const RECENT_FILES_MAX: usize = 10;

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform default location for the config file.
    pub fn default_path() -> SettingsResult<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| SettingsError::ConfigDirectory("no platform config dir".to_string()))?;
        Ok(base.join("tilekit5").join("config.json"))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(SettingsError::UnsupportedFormat(
                path.extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "none".to_string()),
            ));
        };

        config.validate()?;
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)?
        } else {
            return Err(SettingsError::UnsupportedFormat(
                path.extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "none".to_string()),
            ));
        };

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.snap.snap_dist <= 0.0 {
            return Err(SettingsError::InvalidSetting {
                key: "snap.snap_dist".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        if self.snap.angular_resolution == 0 {
            return Err(SettingsError::InvalidSetting {
                key: "snap.angular_resolution".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        if self.snap.exclude_divisor <= 0.0 {
            return Err(SettingsError::InvalidSetting {
                key: "snap.exclude_divisor".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        if self.snap.margin_factor < 1.0 {
            return Err(SettingsError::InvalidSetting {
                key: "snap.margin_factor".to_string(),
                reason: "must be >= 1".to_string(),
            });
        }
        if self.view.zoom_step <= 1.0 {
            return Err(SettingsError::InvalidSetting {
                key: "view.zoom_step".to_string(),
                reason: "must be > 1".to_string(),
            });
        }
        if self.view.zoom_min <= 0.0 || self.view.zoom_min >= self.view.zoom_max {
            return Err(SettingsError::InvalidSetting {
                key: "view.zoom_min".to_string(),
                reason: "must be > 0 and < zoom_max".to_string(),
            });
        }
        Ok(())
    }

    /// Add file to recent files list
    pub fn add_recent_file(&mut self, path: PathBuf) {
        self.recent_files.retain(|f| f != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(RECENT_FILES_MAX);
    }
}
