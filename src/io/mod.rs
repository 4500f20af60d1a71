// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for media and track request files.

pub mod ffmpeg;
pub mod media;
#[cfg(feature = "video-opencv")]
pub mod opencv_backend;
pub mod preview;
pub mod serialization;
