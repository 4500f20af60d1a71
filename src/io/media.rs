// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media sources, decoders and thumbnail encoding.
//!
//! A `MediaBackend` probes a source for its metadata and opens frame
//! decoders on it. Every consumer (the preview feed, the frame strip)
//! opens its own decoder, so seeks on one never disturb another.

use crate::error::MediaError;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};

const VIDEO_EXTENSIONS: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/x-m4v"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
    ("avi", "video/x-msvideo"),
    ("ogv", "video/ogg"),
    ("mpeg", "video/mpeg"),
    ("mpg", "video/mpeg"),
    ("wmv", "video/x-ms-wmv"),
    ("3gp", "video/3gpp"),
];

/// A user-supplied media file and its declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSource {
    pub path: PathBuf,
    pub name: String,
    pub mime: String,
}

impl MediaSource {
    /// Describe a file picked from disk, deriving the type from its extension.
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = mime_from_extension(&path).unwrap_or_default().to_string();
        Self { path, name, mime }
    }

    /// Describe a dropped file. A declared type wins over the extension.
    pub fn from_dropped(path: PathBuf, declared_mime: &str) -> Self {
        let mut source = Self::from_path(path);
        if !declared_mime.is_empty() {
            source.mime = declared_mime.to_string();
        }
        source
    }

    pub fn is_video(&self) -> bool {
        self.mime.starts_with("video/")
    }

    pub fn ensure_video(&self) -> Result<(), MediaError> {
        if self.is_video() {
            Ok(())
        } else {
            Err(MediaError::InvalidMediaType(self.mime.clone()))
        }
    }
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    VIDEO_EXTENSIONS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

/// File dialog filter extensions for video files.
pub fn video_extensions() -> Vec<&'static str> {
    VIDEO_EXTENSIONS.iter().map(|(ext, _)| *ext).collect()
}

/// Metadata known once a source has been probed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaInfo {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

impl MediaInfo {
    /// Display size for preview frames, scaled down to at most `max_width`.
    pub fn preview_size(&self, max_width: u32) -> FrameSize {
        if self.width <= max_width || self.width == 0 {
            return FrameSize::new(self.width.max(1), self.height.max(1));
        }
        let scale = max_width as f64 / self.width as f64;
        let height = ((self.height as f64 * scale).round() as u32).max(1);
        // Even dimensions keep scalers happy with subsampled formats.
        FrameSize::new(max_width & !1, (height & !1).max(2))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A decoded frame as tightly packed RGBA8 pixels.
#[derive(Clone, PartialEq)]
pub struct RgbaFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl std::fmt::Debug for RgbaFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgbaFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl RgbaFrame {
    /// Scale to exactly `size`, ignoring aspect ratio.
    pub fn resized(&self, size: FrameSize) -> Result<RgbaFrame, MediaError> {
        if self.width == size.width && self.height == size.height {
            return Ok(self.clone());
        }
        let image = self.to_image()?;
        let scaled = image::imageops::resize(&image, size.width, size.height, FilterType::Triangle);
        Ok(RgbaFrame {
            width: size.width,
            height: size.height,
            pixels: scaled.into_raw(),
        })
    }

    fn to_image(&self) -> Result<RgbaImage, MediaError> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone()).ok_or_else(|| {
            MediaError::Decode {
                time: 0.0,
                reason: format!(
                    "pixel buffer of {} bytes does not match {}x{}",
                    self.pixels.len(),
                    self.width,
                    self.height
                ),
            }
        })
    }
}

/// Opens sources and reports their metadata.
pub trait MediaBackend: Send + Sync {
    fn probe(&self, source: &MediaSource) -> Result<MediaInfo, MediaError>;

    fn open_decoder(&self, source: &MediaSource) -> Result<Box<dyn FrameDecoder>, MediaError>;
}

/// A seekable decoder for a single source.
pub trait FrameDecoder: Send {
    /// Seek to `seconds` and rasterize that frame at `size`.
    fn decode_at(&mut self, seconds: f64, size: FrameSize) -> Result<RgbaFrame, MediaError>;
}

/// Encode a frame as a lossy JPEG thumbnail.
pub fn encode_thumbnail(frame: &RgbaFrame, quality: u8) -> Result<Vec<u8>, MediaError> {
    let rgb = DynamicImage::ImageRgba8(frame.to_image()?).to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(&rgb)?;
    Ok(bytes)
}

/// Decode an encoded thumbnail back into displayable pixels.
pub fn decode_thumbnail(bytes: &[u8]) -> Result<RgbaFrame, MediaError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    Ok(RgbaFrame {
        width: image.width(),
        height: image.height(),
        pixels: image.into_raw(),
    })
}
