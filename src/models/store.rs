// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The list of annotation objects and the active selection.
//!
//! Object ids always form the contiguous range `1..=N` matching list
//! position; removing an object renumbers everything after it.

use super::annotation::{
    palette_color, AnnotationObject, AnnotationPoint, BoundingBox, Mode, ObjectThumbnail,
};
use crate::util::geometry::{ViewportPos, ViewportRect};

#[derive(Debug, Default)]
pub struct AnnotationStore {
    objects: Vec<AnnotationObject>,
    selected: Option<usize>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objects(&self) -> &[AnnotationObject] {
        &self.objects
    }

    pub fn get(&self, index: usize) -> Option<&AnnotationObject> {
        self.objects.get(index)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// The object that receives new prompts: the selection, or the newest object.
    pub fn active_index(&self) -> Option<usize> {
        self.selected
            .filter(|&i| i < self.objects.len())
            .or_else(|| self.objects.len().checked_sub(1))
    }

    /// Append a new object and select it. Returns its id.
    pub fn add_object(&mut self) -> u32 {
        let count = self.objects.len();
        let id = count as u32 + 1;
        self.objects.push(AnnotationObject::new(id, palette_color(count)));
        self.selected = Some(count);
        log::info!("Added object {}, total: {}", id, self.objects.len());
        self.debug_check();
        id
    }

    /// Remove an object by id and renumber the rest.
    pub fn remove_object(&mut self, id: u32) -> bool {
        let Some(removed) = self.objects.iter().position(|o| o.id == id) else {
            return false;
        };

        self.objects.remove(removed);
        for (index, object) in self.objects.iter_mut().enumerate().skip(removed) {
            object.renumber(index as u32 + 1);
        }

        self.selected = match self.selected {
            Some(s) if s == removed => None,
            Some(s) if s > removed => Some(s - 1),
            other => other,
        };

        log::info!("Removed object {}, total: {}", id, self.objects.len());
        self.debug_check();
        true
    }

    /// Change the mode used for future prompts on one object.
    pub fn set_mode(&mut self, id: u32, mode: Mode) -> bool {
        match self.objects.iter_mut().find(|o| o.id == id) {
            Some(object) => {
                object.mode = mode;
                true
            }
            None => false,
        }
    }

    pub fn select_object(&mut self, index: usize) {
        if index < self.objects.len() {
            self.selected = Some(index);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn set_thumbnail(&mut self, id: u32, thumbnail: ObjectThumbnail) -> bool {
        match self.objects.iter_mut().find(|o| o.id == id) {
            Some(object) => {
                object.thumbnail = thumbnail;
                true
            }
            None => false,
        }
    }

    /// Record a point on the object at `index`.
    ///
    /// The mode is read from the stored object at commit time, so a mode
    /// change made earlier in the same frame always applies (last write wins).
    pub fn add_point(
        &mut self,
        index: usize,
        pos: ViewportPos,
        frame_number: u64,
    ) -> Option<AnnotationPoint> {
        let object = self.objects.get_mut(index)?;
        let point = AnnotationPoint {
            x: pos.x,
            y: pos.y,
            frame_number,
            mode: object.mode,
        };
        object.points.push(point);
        Some(point)
    }

    /// Record a box on the object at `index`, tagged like `add_point`.
    pub fn add_box(
        &mut self,
        index: usize,
        rect: ViewportRect,
        frame_number: u64,
    ) -> Option<BoundingBox> {
        let object = self.objects.get_mut(index)?;
        let bounding_box = BoundingBox::from_rect(rect, frame_number, object.mode);
        object.boxes.push(bounding_box);
        Some(bounding_box)
    }

    pub fn remove_point(&mut self, index: usize, point_index: usize) -> Option<AnnotationPoint> {
        let object = self.objects.get_mut(index)?;
        (point_index < object.points.len()).then(|| object.points.remove(point_index))
    }

    /// Drop every object and the selection.
    pub fn reset(&mut self) {
        self.objects.clear();
        self.selected = None;
    }

    fn debug_check(&self) {
        debug_assert!(self
            .objects
            .iter()
            .enumerate()
            .all(|(i, o)| o.id as usize == i + 1));
    }
}
