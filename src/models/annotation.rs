// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the logical objects being segmented and the point
//! and box prompts recorded against them.

use crate::util::geometry::{ViewportPos, ViewportRect};
use serde::{Deserialize, Serialize};

/// Whether a prompt adds a region to its object or carves one out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Add,
    Remove,
}

/// A point prompt in viewport pixels, anchored to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPoint {
    pub x: f32,
    pub y: f32,
    pub frame_number: u64,
    pub mode: Mode,
}

impl AnnotationPoint {
    pub fn position(&self) -> ViewportPos {
        ViewportPos::new(self.x, self.y)
    }
}

/// A box prompt in viewport pixels, anchored to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub frame_number: u64,
    pub mode: Mode,
}

impl BoundingBox {
    pub fn from_rect(rect: ViewportRect, frame_number: u64, mode: Mode) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            frame_number,
            mode,
        }
    }
}

/// An sRGB display colour, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ObjectColor(pub [u8; 3]);

impl From<ObjectColor> for String {
    fn from(color: ObjectColor) -> Self {
        let [r, g, b] = color.0;
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl TryFrom<String> for ObjectColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.is_ascii())
            .ok_or_else(|| format!("expected #rrggbb, got {:?}", value))?;
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("{}: {}", value, e))
        };
        Ok(ObjectColor([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl ObjectColor {
    pub fn to_egui(self) -> egui::Color32 {
        let [r, g, b] = self.0;
        egui::Color32::from_rgb(r, g, b)
    }
}

/// Object colours, handed out round-robin by creation order.
pub const PALETTE: [ObjectColor; 8] = [
    ObjectColor([0x3b, 0x82, 0xf6]), // blue
    ObjectColor([0xef, 0x44, 0x44]), // red
    ObjectColor([0x22, 0xc5, 0x5e]), // green
    ObjectColor([0xea, 0xb3, 0x08]), // yellow
    ObjectColor([0xa8, 0x55, 0xf7]), // purple
    ObjectColor([0xf9, 0x73, 0x16]), // orange
    ObjectColor([0x14, 0xb8, 0xa6]), // teal
    ObjectColor([0xec, 0x48, 0x99]), // pink
];

pub fn palette_color(creation_index: usize) -> ObjectColor {
    PALETTE[creation_index % PALETTE.len()]
}

/// Image shown next to an object in the object list.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ObjectThumbnail {
    #[default]
    Placeholder,
    /// JPEG-encoded image.
    Jpeg(Vec<u8>),
}

/// A logical object being segmented, with its prompt history.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationObject {
    pub id: u32,
    pub name: String,
    pub color: ObjectColor,
    pub thumbnail: ObjectThumbnail,
    pub mode: Mode,
    pub points: Vec<AnnotationPoint>,
    pub boxes: Vec<BoundingBox>,
}

impl AnnotationObject {
    /// Create an empty object in Add mode.
    pub fn new(id: u32, color: ObjectColor) -> Self {
        Self {
            id,
            name: object_name(id),
            color,
            thumbnail: ObjectThumbnail::Placeholder,
            mode: Mode::Add,
            points: Vec::new(),
            boxes: Vec::new(),
        }
    }

    /// Give the object a new id and the matching derived name.
    pub fn renumber(&mut self, id: u32) {
        self.id = id;
        self.name = object_name(id);
    }

    /// Index of the point on `frame_number` within `radius` pixels of `pos`.
    pub fn point_near(&self, pos: ViewportPos, frame_number: u64, radius: f32) -> Option<usize> {
        self.points
            .iter()
            .position(|p| p.frame_number == frame_number && p.position().distance(&pos) <= radius)
    }

    pub fn annotation_count(&self) -> usize {
        self.points.len() + self.boxes.len()
    }
}

fn object_name(id: u32) -> String {
    format!("Object {}", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_object_defaults() {
        let object = AnnotationObject::new(3, palette_color(2));
        assert_eq!(object.name, "Object 3");
        assert_eq!(object.mode, Mode::Add);
        assert_eq!(object.thumbnail, ObjectThumbnail::Placeholder);
        assert_eq!(object.annotation_count(), 0);
    }

    #[test]
    fn test_palette_wraps() {
        assert_eq!(palette_color(0), palette_color(PALETTE.len()));
        assert_ne!(palette_color(0), palette_color(1));
    }

    #[test]
    fn test_color_hex_serialization() {
        let json = serde_json::to_string(&ObjectColor([0x3b, 0x82, 0xf6])).unwrap();
        assert_eq!(json, "\"#3b82f6\"");

        let color: ObjectColor = serde_json::from_str("\"#ef4444\"").unwrap();
        assert_eq!(color, ObjectColor([0xef, 0x44, 0x44]));
        assert!(serde_json::from_str::<ObjectColor>("\"red\"").is_err());
    }

    #[test]
    fn test_point_near_only_matches_same_frame() {
        let mut object = AnnotationObject::new(1, palette_color(0));
        object.points.push(AnnotationPoint {
            x: 100.0,
            y: 100.0,
            frame_number: 12,
            mode: Mode::Add,
        });

        assert_eq!(object.point_near(ViewportPos::new(103.0, 102.0), 12, 6.0), Some(0));
        assert_eq!(object.point_near(ViewportPos::new(103.0, 102.0), 13, 6.0), None);
        assert_eq!(object.point_near(ViewportPos::new(120.0, 100.0), 12, 6.0), None);
    }
}
