// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playback time formatting and frame indexing.

/// Format seconds as `minutes:seconds`, e.g. `2:05`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let minutes = (seconds / 60.0).floor() as u64;
    let remaining = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, remaining)
}

/// Discrete frame index for a playback time at an assumed frame rate.
pub fn frame_number(seconds: f64, fps: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 || fps <= 0.0 {
        return 0;
    }
    (seconds * fps).floor() as u64
}
