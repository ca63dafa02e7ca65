//! Application Configuration
//!
//! User settings stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Provider call settings
    pub vision: VisionSettings,
    /// Face detector options
    pub face_detection: FaceDetectionSettings,
    /// Image labeler options
    pub labeling: LabelingSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Settings for calls into the vision providers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    /// Milliseconds to wait for a provider before giving up (0 = wait forever)
    pub timeout_ms: u64,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

impl VisionSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

/// Face detector options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceDetectionSettings {
    /// Report facial contours
    pub contours: bool,
    /// Report smiling probability
    pub classification: bool,
}

impl Default for FaceDetectionSettings {
    fn default() -> Self {
        Self {
            contours: true,
            classification: true,
        }
    }
}

/// Image labeler options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelingSettings {
    /// Labels below this confidence (0.0 - 1.0) are not reported
    pub confidence_threshold: f32,
}

impl Default for LabelingSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Default location of the configuration file
pub fn config_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "visionlab", "VisionLab")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Invalid config: {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
