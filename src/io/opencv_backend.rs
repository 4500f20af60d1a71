// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media backend built on OpenCV's `VideoCapture`.
//!
//! Enabled with the `video-opencv` feature. Each decoder holds its own
//! capture handle, released when the decoder is dropped.

use super::media::{FrameDecoder, FrameSize, MediaBackend, MediaInfo, MediaSource, RgbaFrame};
use crate::error::MediaError;
use opencv::{
    core::{Mat, Size},
    imgproc,
    prelude::*,
    videoio,
};

pub struct OpenCvBackend;

fn open_capture(source: &MediaSource) -> Result<videoio::VideoCapture, MediaError> {
    let path = source.path.to_string_lossy();
    let capture = videoio::VideoCapture::from_file(&path, videoio::CAP_ANY)
        .map_err(|e| MediaError::Probe(e.to_string()))?;
    if !capture.is_opened().unwrap_or(false) {
        return Err(MediaError::Probe(format!("cannot open {}", source.path.display())));
    }
    Ok(capture)
}

impl MediaBackend for OpenCvBackend {
    fn probe(&self, source: &MediaSource) -> Result<MediaInfo, MediaError> {
        let capture = open_capture(source)?;
        let get = |prop| capture.get(prop).map_err(|e| MediaError::Probe(e.to_string()));

        let frames = get(videoio::CAP_PROP_FRAME_COUNT)?;
        let fps = get(videoio::CAP_PROP_FPS)?;
        if fps <= 0.0 {
            return Err(MediaError::Probe("unknown frame rate".to_string()));
        }

        Ok(MediaInfo {
            duration: frames / fps,
            width: get(videoio::CAP_PROP_FRAME_WIDTH)? as u32,
            height: get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32,
        })
    }

    fn open_decoder(&self, source: &MediaSource) -> Result<Box<dyn FrameDecoder>, MediaError> {
        Ok(Box::new(OpenCvDecoder {
            capture: open_capture(source)?,
        }))
    }
}

struct OpenCvDecoder {
    capture: videoio::VideoCapture,
}

impl FrameDecoder for OpenCvDecoder {
    fn decode_at(&mut self, seconds: f64, size: FrameSize) -> Result<RgbaFrame, MediaError> {
        let fail = |e: opencv::Error| MediaError::Decode {
            time: seconds,
            reason: e.to_string(),
        };

        self.capture
            .set(videoio::CAP_PROP_POS_MSEC, seconds * 1000.0)
            .map_err(fail)?;

        let mut frame = Mat::default();
        if !self.capture.read(&mut frame).map_err(fail)? || frame.empty() {
            return Err(MediaError::Decode {
                time: seconds,
                reason: "no frame at this position".to_string(),
            });
        }

        let mut resized = Mat::default();
        imgproc::resize(
            &frame,
            &mut resized,
            Size::new(size.width as i32, size.height as i32),
            0.0,
            0.0,
            imgproc::INTER_AREA,
        )
        .map_err(fail)?;

        let mut rgba = Mat::default();
        imgproc::cvt_color(&resized, &mut rgba, imgproc::COLOR_BGR2RGBA, 0).map_err(fail)?;

        Ok(RgbaFrame {
            width: size.width,
            height: size.height,
            pixels: rgba.data_bytes().map_err(fail)?.to_vec(),
        })
    }
}
