// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media backend driving the `ffprobe` and `ffmpeg` command line tools.
//!
//! Probing reads the container and first video stream as JSON. Frames are
//! produced by asking ffmpeg for a single raw RGBA frame at the requested
//! timestamp and size, which keeps the build free of native video libraries.

use super::media::{FrameDecoder, FrameSize, MediaBackend, MediaInfo, MediaSource, RgbaFrame};
use crate::error::MediaError;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Command;

/// Stay this far before the end so the last seek still lands on a frame.
const END_MARGIN_SECONDS: f64 = 0.05;

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    streams: Option<Vec<ProbeStream>>,
    format: Option<ProbeFormat>,
}

pub struct FfmpegBackend {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegBackend {
    /// Use explicit tool paths, or look both tools up on PATH.
    pub fn new(
        ffmpeg: Option<PathBuf>,
        ffprobe: Option<PathBuf>,
    ) -> Result<Self, MediaError> {
        let ffmpeg = match ffmpeg {
            Some(path) => path,
            None => which::which("ffmpeg").map_err(|_| MediaError::ToolMissing("ffmpeg"))?,
        };
        let ffprobe = match ffprobe {
            Some(path) => path,
            None => which::which("ffprobe").map_err(|_| MediaError::ToolMissing("ffprobe"))?,
        };
        log::info!("Using {} and {}", ffmpeg.display(), ffprobe.display());
        Ok(Self { ffmpeg, ffprobe })
    }
}

impl MediaBackend for FfmpegBackend {
    fn probe(&self, source: &MediaSource) -> Result<MediaInfo, MediaError> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-show_format", "-show_streams", "-print_format", "json"])
            .arg(&source.path)
            .output()?;
        if !output.status.success() {
            return Err(MediaError::Probe(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        parse_probe(&output.stdout)
    }

    fn open_decoder(&self, source: &MediaSource) -> Result<Box<dyn FrameDecoder>, MediaError> {
        let info = self.probe(source)?;
        Ok(Box::new(FfmpegDecoder {
            ffmpeg: self.ffmpeg.clone(),
            path: source.path.clone(),
            duration: info.duration,
        }))
    }
}

fn parse_probe(json: &[u8]) -> Result<MediaInfo, MediaError> {
    let parsed: ProbeOutput =
        serde_json::from_slice(json).map_err(|e| MediaError::Probe(e.to_string()))?;

    let video = parsed
        .streams
        .unwrap_or_default()
        .into_iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| MediaError::Probe("no video stream".to_string()))?;

    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| MediaError::Probe("unknown duration".to_string()))?;

    Ok(MediaInfo {
        duration,
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
    })
}

struct FfmpegDecoder {
    ffmpeg: PathBuf,
    path: PathBuf,
    duration: f64,
}

impl FrameDecoder for FfmpegDecoder {
    fn decode_at(&mut self, seconds: f64, size: FrameSize) -> Result<RgbaFrame, MediaError> {
        let time = seconds.clamp(0.0, (self.duration - END_MARGIN_SECONDS).max(0.0));
        let output = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-ss"])
            .arg(format!("{:.3}", time))
            .arg("-i")
            .arg(&self.path)
            .args(["-frames:v", "1", "-vf"])
            .arg(format!("scale={}:{}", size.width, size.height))
            .args(["-f", "rawvideo", "-pix_fmt", "rgba", "-"])
            .output()?;

        let expected = (size.width * size.height * 4) as usize;
        if !output.status.success() || output.stdout.len() < expected {
            return Err(MediaError::Decode {
                time,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut pixels = output.stdout;
        pixels.truncate(expected);
        Ok(RgbaFrame {
            width: size.width,
            height: size.height,
            pixels,
        })
    }
}
