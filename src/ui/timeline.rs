// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scrub timeline: the frame strip with a draggable playhead on top.

use crate::models::playhead::{PositionSource, TrackSpan};
use crate::models::studio::Studio;

const TRACK_HEIGHT: f32 = 64.0;
const HANDLE_RADIUS: f32 = 7.0;

/// Display the strip and handle scrubbing.
///
/// `thumbnails` holds one texture per extracted slot, in strip order.
pub fn show(ui: &mut egui::Ui, studio: &mut Studio, thumbnails: &[Option<egui::TextureHandle>]) {
    let width = ui.available_width();
    let (track_rect, _) = ui.allocate_exact_size(egui::vec2(width, TRACK_HEIGHT), egui::Sense::hover());
    let response = ui.interact(
        scrub_area(track_rect),
        ui.id().with("scrub_area"),
        egui::Sense::click_and_drag(),
    );
    let track = TrackSpan::new(track_rect.left(), track_rect.width());

    if studio.has_video() {
        let (pressed, released, latest) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.any_released(),
                i.pointer.latest_pos(),
            )
        });
        if pressed && response.hovered() {
            if let Some(pos) = latest {
                studio.begin_scrub(pos.x, track);
            }
        } else if studio.is_scrubbing() {
            if let Some(pos) = latest {
                studio.scrub_to(pos.x, track);
            }
        }
        if released && studio.is_scrubbing() {
            studio.end_scrub();
        }
    }

    let painter = ui.painter_at(track_rect.expand(HANDLE_RADIUS * 3.0));
    painter.rect_filled(track_rect, 4.0, egui::Color32::from_gray(30));
    draw_strip(&painter, studio, thumbnails, track_rect);

    if !studio.has_video() {
        return;
    }

    let x = track.x_at(studio.playhead_position());
    let color = match studio.playhead_source() {
        PositionSource::Drag => egui::Color32::from_rgb(0x3b, 0x82, 0xf6),
        PositionSource::Playback | PositionSource::External => egui::Color32::WHITE,
    };
    painter.line_segment(
        [egui::pos2(x, track_rect.top()), egui::pos2(x, track_rect.bottom())],
        egui::Stroke::new(2.0, color),
    );
    let handle = egui::pos2(x, track_rect.top());
    painter.circle_filled(handle, HANDLE_RADIUS, color);

    if let Some(label) = studio.playhead_tooltip() {
        painter.text(
            handle - egui::vec2(0.0, HANDLE_RADIUS + 2.0),
            egui::Align2::CENTER_BOTTOM,
            label,
            egui::FontId::monospace(12.0),
            egui::Color32::WHITE,
        );
    }
}

/// Pointer-sensitive area: the track plus the handle sitting on its top edge.
fn scrub_area(track_rect: egui::Rect) -> egui::Rect {
    track_rect.expand2(egui::vec2(0.0, HANDLE_RADIUS))
}

fn draw_strip(
    painter: &egui::Painter,
    studio: &Studio,
    thumbnails: &[Option<egui::TextureHandle>],
    track_rect: egui::Rect,
) {
    let slots = studio.strip().length().max(1);
    let slot_width = track_rect.width() / slots as f32;
    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

    for slot in 0..slots {
        let rect = egui::Rect::from_min_size(
            egui::pos2(track_rect.left() + slot as f32 * slot_width, track_rect.top()),
            egui::vec2(slot_width, track_rect.height()),
        )
        .shrink(1.0);

        match thumbnails.get(slot) {
            Some(Some(texture)) => {
                painter.image(texture.id(), rect, uv, egui::Color32::WHITE);
            }
            // Extracted but undecodable.
            Some(None) => {
                painter.rect_filled(rect, 2.0, egui::Color32::from_rgb(60, 40, 40));
            }
            None => {
                painter.rect_filled(rect, 2.0, egui::Color32::from_gray(50));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrub_area_covers_handle() {
        let track = egui::Rect::from_min_size(egui::pos2(10.0, 100.0), egui::vec2(300.0, TRACK_HEIGHT));
        let area = scrub_area(track);

        let handle = egui::pos2(160.0, track.top());
        assert!(area.contains(handle - egui::vec2(0.0, HANDLE_RADIUS - 0.5)));
        assert!(area.contains(handle + egui::vec2(0.0, HANDLE_RADIUS - 0.5)));
        assert!(area.contains(egui::pos2(160.0, track.bottom())));
        // Horizontal extent stays the track's so percentages map one to one.
        assert_eq!((area.left(), area.right()), (track.left(), track.right()));
    }
}
