// SPDX-License-Identifier: GPL-3.0-only

//! Persistent viewer settings
//!
//! Settings are stored as JSON at `<config_dir>/camview/config.json`.
//! Command-line flags are layered on top through [`ConfigOverrides`].

use crate::backends::camera::IoMethod;
use crate::constants::{
    APP_NAME, CONFIG_FILE_NAME, DEFAULT_DEVICE, DEFAULT_FOURCC, DEFAULT_HEIGHT,
    DEFAULT_REFRESH_HZ, DEFAULT_WIDTH, MAX_REFRESH_HZ,
};
use crate::errors::{AppError, AppResult};
use crate::media::formats::{FrameGeometry, LumaRange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Capture format to force on the device instead of keeping its current one
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FormatSettings {
    /// Resolution width (the driver may adjust it)
    pub width: u32,
    /// Resolution height (the driver may adjust it)
    pub height: u32,
    /// Pixel format FourCC (e.g., "YUYV", "NV12")
    pub pixel_format: String,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            pixel_format: DEFAULT_FOURCC.to_string(),
        }
    }
}

/// Width and height written as `WIDTHxHEIGHT`
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl OutputSize {
    pub fn geometry(&self) -> Result<FrameGeometry, crate::errors::ConvertError> {
        FrameGeometry::new(self.width, self.height)
    }
}

impl FromStr for OutputSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
        let width = w
            .trim()
            .parse()
            .map_err(|_| format!("invalid width '{}'", w))?;
        let height = h
            .trim()
            .parse()
            .map_err(|_| format!("invalid height '{}'", h))?;
        Ok(Self { width, height })
    }
}

impl fmt::Display for OutputSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Where converted frames are shown
#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Half-block rendering in the terminal
    #[default]
    Terminal,
    /// No display, only frame statistics in the log
    Headless,
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RendererKind::Terminal => write!(f, "terminal"),
            RendererKind::Headless => write!(f, "headless"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture device node
    pub device: String,
    /// Buffer exchange method with the driver
    pub io_method: IoMethod,
    /// Force this format instead of the device's current one
    pub force_format: Option<FormatSettings>,
    /// Size of the displayed frame (center crop of the capture); capture size when unset
    pub output_size: Option<OutputSize>,
    /// Luma range override; derived from the negotiated format when unset
    pub luma_range: Option<LumaRange>,
    /// Stop after this many frames; run until quit when unset
    pub frame_count: Option<u64>,
    /// Display refresh rate in Hz
    pub refresh_hz: u32,
    /// Display backend
    pub renderer: RendererKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            io_method: IoMethod::default(),
            force_format: None,
            output_size: None,
            luma_range: None,
            frame_count: None,
            refresh_hz: DEFAULT_REFRESH_HZ,
            renderer: RendererKind::default(),
        }
    }
}

/// Command-line values that replace the stored ones when present
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub device: Option<String>,
    pub io_method: Option<IoMethod>,
    /// Force a format; missing size or FourCC fall back to the stored or default values
    pub force_format: bool,
    pub format_size: Option<OutputSize>,
    pub pixel_format: Option<String>,
    pub output_size: Option<OutputSize>,
    pub luma_range: Option<LumaRange>,
    pub frame_count: Option<u64>,
    pub refresh_hz: Option<u32>,
    pub renderer: Option<RendererKind>,
}

impl Config {
    /// Load from the default config path
    ///
    /// Returns defaults if the file doesn't exist or is corrupted.
    pub fn load() -> Self {
        match Self::config_dir() {
            Some(dir) => Self::load_from_dir(&dir),
            None => {
                tracing::warn!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Save to the default config path
    pub fn save(&self) -> AppResult<()> {
        let dir = Self::config_dir()
            .ok_or_else(|| AppError::Config("no config directory available".into()))?;
        self.save_to_dir(&dir)
    }

    pub fn load_from_dir(config_dir: &Path) -> Self {
        let path = config_dir.join(CONFIG_FILE_NAME);
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Config>(&contents) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "Config loaded");
                    config.sanitized()
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Corrupted config file, using defaults"
                    );
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read config file, using defaults"
                );
                Self::default()
            }
        }
    }

    pub fn save_to_dir(&self, config_dir: &Path) -> AppResult<()> {
        std::fs::create_dir_all(config_dir).map_err(|e| {
            AppError::Config(format!(
                "failed to create config directory {}: {}",
                config_dir.display(),
                e
            ))
        })?;

        let path = config_dir.join(CONFIG_FILE_NAME);
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(&path, contents).map_err(|e| {
            AppError::Config(format!("failed to write {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// `<config_dir>/camview`, if the platform has a config directory
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_NAME))
    }

    /// Apply command-line values field by field
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(device) = &overrides.device {
            self.device = device.clone();
        }
        if let Some(io_method) = overrides.io_method {
            self.io_method = io_method;
        }

        let wants_format = overrides.force_format
            || overrides.format_size.is_some()
            || overrides.pixel_format.is_some();
        if wants_format {
            let mut format = self.force_format.clone().unwrap_or_default();
            if let Some(size) = overrides.format_size {
                format.width = size.width;
                format.height = size.height;
            }
            if let Some(fourcc) = &overrides.pixel_format {
                format.pixel_format = fourcc.to_ascii_uppercase();
            }
            self.force_format = Some(format);
        }

        if overrides.output_size.is_some() {
            self.output_size = overrides.output_size;
        }
        if overrides.luma_range.is_some() {
            self.luma_range = overrides.luma_range;
        }
        if overrides.frame_count.is_some() {
            self.frame_count = overrides.frame_count;
        }
        if let Some(hz) = overrides.refresh_hz {
            self.refresh_hz = hz;
        }
        if let Some(renderer) = overrides.renderer {
            self.renderer = renderer;
        }

        *self = std::mem::take(self).sanitized();
    }

    fn sanitized(mut self) -> Self {
        if self.refresh_hz == 0 || self.refresh_hz > MAX_REFRESH_HZ {
            let clamped = self.refresh_hz.clamp(1, MAX_REFRESH_HZ);
            tracing::warn!(
                requested = self.refresh_hz,
                clamped,
                "Refresh rate out of range"
            );
            self.refresh_hz = clamped;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_size_parsing() {
        assert_eq!(
            "320x240".parse::<OutputSize>(),
            Ok(OutputSize {
                width: 320,
                height: 240
            })
        );
        assert_eq!(
            "64X48".parse::<OutputSize>().map(|s| s.to_string()),
            Ok("64x48".to_string())
        );
        assert!("320".parse::<OutputSize>().is_err());
        assert!("ax240".parse::<OutputSize>().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            device: "/dev/video2".into(),
            io_method: IoMethod::UserPtr,
            force_format: Some(FormatSettings {
                width: 320,
                height: 240,
                pixel_format: "NV12".into(),
            }),
            output_size: Some(OutputSize {
                width: 160,
                height: 120,
            }),
            luma_range: Some(LumaRange::Studio),
            frame_count: Some(100),
            refresh_hz: 30,
            renderer: RendererKind::Headless,
        };

        config.save_to_dir(tmp.path()).unwrap();
        assert_eq!(Config::load_from_dir(tmp.path()), config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let loaded = Config::load_from_dir(&tmp.path().join("nonexistent"));
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_corrupted_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "{ not json").unwrap();
        assert_eq!(Config::load_from_dir(tmp.path()), Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r#"{ "device": "/dev/video4", "refresh_hz": 1000 }"#,
        )
        .unwrap();

        let loaded = Config::load_from_dir(tmp.path());
        assert_eq!(loaded.device, "/dev/video4");
        assert_eq!(loaded.refresh_hz, MAX_REFRESH_HZ);
        assert_eq!(loaded.renderer, RendererKind::Terminal);
    }

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let mut config = Config {
            frame_count: Some(10),
            ..Config::default()
        };
        config.apply(&ConfigOverrides {
            device: Some("/dev/video1".into()),
            pixel_format: Some("nv12".into()),
            ..ConfigOverrides::default()
        });

        assert_eq!(config.device, "/dev/video1");
        assert_eq!(config.frame_count, Some(10));
        assert_eq!(
            config.force_format,
            Some(FormatSettings {
                width: DEFAULT_WIDTH,
                height: DEFAULT_HEIGHT,
                pixel_format: "NV12".into(),
            })
        );
    }

    #[test]
    fn test_force_flag_uses_default_format() {
        let mut config = Config::default();
        config.apply(&ConfigOverrides {
            force_format: true,
            ..ConfigOverrides::default()
        });
        assert_eq!(config.force_format, Some(FormatSettings::default()));
    }
}
