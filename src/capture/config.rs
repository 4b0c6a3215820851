//! Capture session configuration.
//!
//! The requested resolution is a preference, not a requirement: devices
//! that cannot deliver 1280x720 still satisfy the request with their
//! closest mode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::device::StreamConstraints;

/// Which physical camera a capture session targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// User-facing camera.
    #[default]
    Front,
    /// Environment-facing camera.
    Back,
}

impl FacingMode {
    /// Returns the opposite camera.
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::Front => FacingMode::Back,
            FacingMode::Back => FacingMode::Front,
        }
    }

    /// Constraint value understood by media device backends.
    pub fn as_constraint(self) -> &'static str {
        match self {
            FacingMode::Front => "user",
            FacingMode::Back => "environment",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacingMode::Front => f.write_str("front"),
            FacingMode::Back => f.write_str("back"),
        }
    }
}

impl FromStr for FacingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" | "user" => Ok(FacingMode::Front),
            "back" | "environment" => Ok(FacingMode::Back),
            other => Err(ConfigError::InvalidFacingMode(other.to_string())),
        }
    }
}

/// Configuration for a capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera used by the first open request.
    pub facing_mode: FacingMode,
    /// Preferred frame width in pixels.
    pub ideal_width: u32,
    /// Preferred frame height in pixels.
    pub ideal_height: u32,
    /// JPEG quality for still images (1-100).
    pub jpeg_quality: u8,
    /// Largest raster surface the session will allocate, in pixels.
    pub max_pixels: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Front,
            ideal_width: 1280,
            ideal_height: 720,
            jpeg_quality: 80,
            max_pixels: 7680 * 4320,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified preferred dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            ideal_width: width,
            ideal_height: height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ideal_width == 0 || self.ideal_height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ConfigError::InvalidQuality(self.jpeg_quality));
        }
        if self.max_pixels == 0 {
            return Err(ConfigError::InvalidSurfaceLimit);
        }
        Ok(())
    }

    /// Builds the device request for the given camera. Audio is never requested.
    pub fn constraints(&self, facing_mode: FacingMode) -> StreamConstraints {
        StreamConstraints {
            facing_mode,
            ideal_width: self.ideal_width,
            ideal_height: self.ideal_height,
            audio: false,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Width or height is zero.
    #[error("invalid preferred frame dimensions")]
    InvalidDimensions,
    /// JPEG quality outside 1..=100.
    #[error("invalid jpeg quality {0} (must be 1-100)")]
    InvalidQuality(u8),
    /// Surface pixel limit is zero.
    #[error("raster surface limit must be non-zero")]
    InvalidSurfaceLimit,
    /// Unrecognized facing mode name.
    #[error("unknown facing mode: {0}")]
    InvalidFacingMode(String),
    /// Upload base URL is not http(s).
    #[error("invalid upload base url: {0}")]
    InvalidBaseUrl(String),
    /// Refresh interval is zero.
    #[error("refresh interval must be at least one second")]
    InvalidRefreshInterval,
    /// Config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// Config file is not valid TOML.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Camera and encoder settings.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Detection server settings.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Handoff storage settings.
    #[serde(default)]
    pub handoff: HandoffConfig,
    /// Reports refresh settings.
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Detection endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Server root; `/upload/`, `/police/` and `/report/{id}/` hang off it.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Session handoff configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffConfig {
    /// Directory holding the handoff file.
    pub dir: PathBuf,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir().join("photo-capture"),
        }
    }
}

/// Reports auto-refresh configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between automatic report refreshes.
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        let base = self.upload.base_url.as_str();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base.to_string()));
        }
        if self.refresh.interval_secs == 0 {
            return Err(ConfigError::InvalidRefreshInterval);
        }
        Ok(())
    }
}
