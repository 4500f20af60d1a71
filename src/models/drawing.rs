// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pointer gestures over the video viewport.
//!
//! A press starts a drag; releasing it commits a bounding box when the
//! drag is large enough. A plain click adds a point, or deletes an
//! existing point of the active object under the cursor. The click that
//! the platform reports right after a committed box is swallowed.

use super::annotation::{AnnotationPoint, BoundingBox};
use super::store::AnnotationStore;
use crate::util::geometry::{rect_from_corners, ViewportPos, ViewportRect};

/// Clicks within this many pixels of a point on the current frame delete it.
pub const POINT_HIT_RADIUS: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawState {
    Idle,
    Drawing { start: ViewportPos, end: ViewportPos },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The drag did not exceed the minimum box size in both dimensions.
    TooSmall,
    /// There is no object to attach the annotation to.
    NoActiveObject,
    /// Click generated by the release of a committed box drag.
    SuppressedClick,
    NotDrawing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    BoxAdded {
        object: usize,
        bounding_box: BoundingBox,
    },
    PointAdded {
        object: usize,
        point: AnnotationPoint,
    },
    PointRemoved {
        object: usize,
        point: AnnotationPoint,
    },
    Discarded(DiscardReason),
}

#[derive(Debug)]
pub struct DrawingSurface {
    state: DrawState,
    just_finished: bool,
    min_box_size: f32,
}

impl DrawingSurface {
    pub fn new(min_box_size: f32) -> Self {
        Self {
            state: DrawState::Idle,
            just_finished: false,
            min_box_size,
        }
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::Drawing { .. })
    }

    /// The rectangle being dragged out, for rubber-band rendering.
    pub fn in_progress_rect(&self) -> Option<ViewportRect> {
        match self.state {
            DrawState::Drawing { start, end } => Some(rect_from_corners(start, end)),
            DrawState::Idle => None,
        }
    }

    pub fn pointer_down(&mut self, pos: ViewportPos, video_loaded: bool) {
        if !video_loaded {
            return;
        }
        self.just_finished = false;
        self.state = DrawState::Drawing { start: pos, end: pos };
    }

    pub fn pointer_move(&mut self, pos: ViewportPos) {
        if let DrawState::Drawing { end, .. } = &mut self.state {
            *end = pos;
        }
    }

    /// Finish the drag, committing a box to the active object if it is big enough.
    pub fn pointer_up(&mut self, store: &mut AnnotationStore, frame_number: u64) -> DrawOutcome {
        let DrawState::Drawing { start, end } = std::mem::replace(&mut self.state, DrawState::Idle)
        else {
            return DrawOutcome::Discarded(DiscardReason::NotDrawing);
        };

        let Some(object) = store.active_index() else {
            return DrawOutcome::Discarded(DiscardReason::NoActiveObject);
        };

        let rect = rect_from_corners(start, end);
        if rect.width <= self.min_box_size || rect.height <= self.min_box_size {
            return DrawOutcome::Discarded(DiscardReason::TooSmall);
        }

        match store.add_box(object, rect, frame_number) {
            Some(bounding_box) => {
                self.just_finished = true;
                log::info!(
                    "Box {:.0}x{:.0} at ({:.0}, {:.0}) added to object {} on frame {}",
                    rect.width,
                    rect.height,
                    rect.x,
                    rect.y,
                    object + 1,
                    frame_number
                );
                DrawOutcome::BoxAdded {
                    object,
                    bounding_box,
                }
            }
            None => DrawOutcome::Discarded(DiscardReason::NoActiveObject),
        }
    }

    /// A click that was not part of a box drag.
    pub fn click(
        &mut self,
        pos: ViewportPos,
        store: &mut AnnotationStore,
        frame_number: u64,
    ) -> DrawOutcome {
        if std::mem::take(&mut self.just_finished) {
            return DrawOutcome::Discarded(DiscardReason::SuppressedClick);
        }

        let Some(object) = store.active_index() else {
            return DrawOutcome::Discarded(DiscardReason::NoActiveObject);
        };

        let hit = store
            .get(object)
            .and_then(|o| o.point_near(pos, frame_number, POINT_HIT_RADIUS));
        if let Some(point_index) = hit {
            if let Some(point) = store.remove_point(object, point_index) {
                log::info!("Point removed from object {}", object + 1);
                return DrawOutcome::PointRemoved { object, point };
            }
        }

        match store.add_point(object, pos, frame_number) {
            Some(point) => {
                log::info!(
                    "Point at ({:.0}, {:.0}) added to object {} on frame {}",
                    pos.x,
                    pos.y,
                    object + 1,
                    frame_number
                );
                DrawOutcome::PointAdded { object, point }
            }
            None => DrawOutcome::Discarded(DiscardReason::NoActiveObject),
        }
    }

    /// Abandon any gesture in progress.
    pub fn reset(&mut self) {
        self.state = DrawState::Idle;
        self.just_finished = false;
    }
}
