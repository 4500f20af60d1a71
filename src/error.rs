// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Errors raised by the media layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("not a video file (declared type {0:?})")]
    InvalidMediaType(String),
    #[error("{0} not found on PATH; please install FFmpeg")]
    ToolMissing(&'static str),
    #[error("probe failed: {0}")]
    Probe(String),
    #[error("decode failed at {time:.3}s: {reason}")]
    Decode { time: f64, reason: String },
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
