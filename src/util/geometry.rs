// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the viewport math shared by the canvas and the
//! drawing surface: fitting the video frame into the available space and
//! converting pointer positions to viewport-relative pixels.

use serde::{Deserialize, Serialize};

/// A position in pixels relative to the video viewport's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewportPos {
    pub x: f32,
    pub y: f32,
}

impl ViewportPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &ViewportPos) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned rectangle in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// The rectangle spanned by two drag corners, in any order.
pub fn rect_from_corners(a: ViewportPos, b: ViewportPos) -> ViewportRect {
    ViewportRect {
        x: a.x.min(b.x),
        y: a.y.min(b.y),
        width: (b.x - a.x).abs(),
        height: (b.y - a.y).abs(),
    }
}

/// Convert an absolute pointer position to viewport-relative pixels.
pub fn to_viewport(pointer: egui::Pos2, viewport_min: egui::Pos2) -> ViewportPos {
    ViewportPos::new(pointer.x - viewport_min.x, pointer.y - viewport_min.y)
}

/// Place content of the given size inside `available`, centered and letterboxed.
pub fn fit_rect(content_size: (u32, u32), available: egui::Rect) -> egui::Rect {
    let (width, height) = content_size;
    if width == 0 || height == 0 || available.width() <= 0.0 || available.height() <= 0.0 {
        return available;
    }

    let content_aspect = width as f32 / height as f32;
    let available_aspect = available.width() / available.height();

    let (display_width, display_height) = if content_aspect > available_aspect {
        // Wider than the viewport - fit to width
        (available.width(), available.width() / content_aspect)
    } else {
        (available.height() * content_aspect, available.height())
    };

    egui::Rect::from_center_size(
        available.center(),
        egui::vec2(display_width, display_height),
    )
}
