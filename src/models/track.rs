// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The annotation set handed to the object tracking step.

use super::annotation::{AnnotationPoint, BoundingBox, ObjectColor};
use super::store::AnnotationStore;
use serde::{Deserialize, Serialize};

/// One object's prompts, as consumed by the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedObject {
    pub id: u32,
    pub name: String,
    pub color: ObjectColor,
    pub points: Vec<AnnotationPoint>,
    pub boxes: Vec<BoundingBox>,
}

/// Complete request for the "Track objects" action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRequest {
    pub video: String,
    pub duration: f64,
    pub assumed_fps: f64,
    pub objects: Vec<TrackedObject>,
}

impl TrackRequest {
    /// Snapshot the store as it is right now.
    pub fn new(video: &str, duration: f64, assumed_fps: f64, store: &AnnotationStore) -> Self {
        let objects = store
            .objects()
            .iter()
            .map(|o| TrackedObject {
                id: o.id,
                name: o.name.clone(),
                color: o.color,
                points: o.points.clone(),
                boxes: o.boxes.clone(),
            })
            .collect();

        Self {
            video: video.to_string(),
            duration,
            assumed_fps,
            objects,
        }
    }

    pub fn annotation_count(&self) -> usize {
        self.objects
            .iter()
            .map(|o| o.points.len() + o.boxes.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::geometry::{ViewportPos, ViewportRect};

    #[test]
    fn test_request_reflects_store() {
        let mut store = AnnotationStore::new();
        store.add_object();
        store.add_object();
        store.add_point(0, ViewportPos::new(1.0, 2.0), 3);
        store.add_box(
            1,
            ViewportRect {
                x: 0.0,
                y: 0.0,
                width: 20.0,
                height: 30.0,
            },
            4,
        );
        store.remove_object(1);

        let request = TrackRequest::new("clip.mp4", 10.0, 30.0, &store);
        assert_eq!(request.objects.len(), 1);
        assert_eq!(request.objects[0].id, 1);
        assert_eq!(request.objects[0].name, "Object 1");
        assert_eq!(request.objects[0].boxes[0].height, 30.0);
        assert_eq!(request.annotation_count(), 1);
    }
}
