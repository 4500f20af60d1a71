// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application settings.
//!
//! Settings are read from the YAML file named by `OPENSTUDIO_CONFIG`, or
//! from `openstudio.yaml` in the working directory. Every field has a
//! default, so a partial file (or no file at all) is fine.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "OPENSTUDIO_CONFIG";
const CONFIG_FILE: &str = "openstudio.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Frame rate used to turn playback time into annotation frame numbers.
    pub assumed_fps: f64,
    /// Number of thumbnails in the timeline frame strip.
    pub strip_length: usize,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    /// JPEG quality (1-100) for strip thumbnails.
    pub thumbnail_quality: u8,
    /// Box drags must exceed this many pixels in both dimensions.
    pub min_box_size: f32,
    /// Preview frames wider than this are scaled down before display.
    pub preview_max_width: u32,
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            assumed_fps: 30.0,
            strip_length: 15,
            thumbnail_width: 160,
            thumbnail_height: 90,
            thumbnail_quality: 80,
            min_box_size: 10.0,
            preview_max_width: 1280,
            ffmpeg_path: None,
            ffprobe_path: None,
        }
    }
}

impl Settings {
    /// Load settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let settings: Settings = serde_yaml::from_str(&yaml)
            .with_context(|| format!("parsing settings in {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from the configured location, falling back to defaults when no file exists.
    pub fn discover() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        let local = Path::new(CONFIG_FILE);
        if local.exists() {
            return Self::load(local);
        }
        Ok(Self::default())
    }

    fn validate(&self) -> Result<()> {
        if !(self.assumed_fps.is_finite() && self.assumed_fps > 0.0) {
            bail!("assumed_fps must be positive, got {}", self.assumed_fps);
        }
        if self.strip_length == 0 {
            bail!("strip_length must be at least 1");
        }
        if self.thumbnail_width == 0 || self.thumbnail_height == 0 {
            bail!("thumbnail size must be non-zero");
        }
        if !(1..=100).contains(&self.thumbnail_quality) {
            bail!("thumbnail_quality must be within 1..=100");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.assumed_fps, 30.0);
        assert_eq!(settings.strip_length, 15);
        assert_eq!((settings.thumbnail_width, settings.thumbnail_height), (160, 90));
        assert_eq!(settings.min_box_size, 10.0);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "strip_length: 8\nassumed_fps: 24").unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.strip_length, 8);
        assert_eq!(settings.assumed_fps, 24.0);
        assert_eq!(settings.thumbnail_width, 160);
    }

    #[test]
    fn test_rejects_zero_strip_length() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "strip_length: 0").unwrap();

        assert!(Settings::load(file.path()).is_err());
    }
}
