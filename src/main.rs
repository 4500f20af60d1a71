// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! OpenStudio - Segment Anything 2 Demo
//!
//! A desktop front end for prompting video object segmentation: load a
//! clip, scrub to a frame, and mark objects with points and boxes.

mod app;
mod config;
mod error;
mod io;
mod models;
mod ui;
mod util;

use anyhow::{Context, Result};
use app::StudioApp;
use config::Settings;
use io::media::MediaBackend;
use std::sync::Arc;

#[cfg(feature = "video-opencv")]
fn create_backend(_settings: &Settings) -> Result<Arc<dyn MediaBackend>> {
    log::info!("Using OpenCV video backend");
    Ok(Arc::new(io::opencv_backend::OpenCvBackend))
}

#[cfg(not(feature = "video-opencv"))]
fn create_backend(settings: &Settings) -> Result<Arc<dyn MediaBackend>> {
    let backend = io::ffmpeg::FfmpegBackend::new(
        settings.ffmpeg_path.clone(),
        settings.ffprobe_path.clone(),
    )
    .context("no video backend available, install ffmpeg or set ffmpeg_path")?;
    Ok(Arc::new(backend))
}

fn main() -> Result<()> {
    env_logger::init();

    let settings = Settings::discover()?;
    let backend = create_backend(&settings)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([900.0, 600.0])
            .with_drag_and_drop(true)
            .with_title("OpenStudio - Segment Anything 2 Demo"),
        ..Default::default()
    };

    eframe::run_native(
        "OpenStudio",
        options,
        Box::new(move |_cc| Ok(Box::new(StudioApp::new(settings, backend)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
