// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video viewport with the annotation overlay.
//!
//! Pointer positions are handed to the studio in pixels relative to the
//! displayed video's top-left corner. A release that ends a press begun on
//! the video is reported as a click as well, so the drawing surface sees
//! the same press/release/click sequence a browser would deliver.

use crate::models::annotation::{AnnotationObject, Mode};
use crate::models::studio::Studio;
use crate::util::geometry::{fit_rect, to_viewport};

const POINT_RADIUS: f32 = 5.0;

pub enum CanvasAction {
    None,
    OpenVideo,
}

/// Display the viewport and route pointer input to the studio.
pub fn show(
    ui: &mut egui::Ui,
    studio: &mut Studio,
    preview: Option<&egui::TextureHandle>,
) -> CanvasAction {
    let mut action = CanvasAction::None;
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(24);

    let available_size = ui.available_size();

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        if !studio.has_video() {
            action = drop_zone(ui);
            return;
        }

        let (Some(texture), Some(info)) = (preview, studio.session().info()) else {
            ui.centered_and_justified(|ui| {
                ui.vertical_centered(|ui| {
                    ui.spinner();
                    ui.label(
                        egui::RichText::new("Loading video...")
                            .color(egui::Color32::from_gray(200)),
                    );
                });
            });
            return;
        };

        let video_rect = fit_rect((info.width, info.height), ui.max_rect());
        ui.painter().image(
            texture.id(),
            video_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        handle_pointer(ui, studio, video_rect);

        let painter = ui.painter_at(video_rect);
        let frame = studio.current_frame();
        let active = studio.store().active_index();
        for (index, object) in studio.store().objects().iter().enumerate() {
            draw_object(&painter, object, video_rect.min, frame, Some(index) == active);
        }

        if let Some(rect) = studio.drawing().in_progress_rect() {
            let color = active
                .and_then(|i| studio.store().get(i))
                .map(|o| o.color.to_egui())
                .unwrap_or(egui::Color32::WHITE);
            let screen = egui::Rect::from_min_size(
                video_rect.min + egui::vec2(rect.x, rect.y),
                egui::vec2(rect.width, rect.height),
            );
            painter.rect(
                screen,
                0.0,
                color.gamma_multiply(0.15),
                egui::Stroke::new(1.5, color),
            );
        }
    });

    action
}

fn handle_pointer(ui: &mut egui::Ui, studio: &mut Studio, video_rect: egui::Rect) {
    let response = ui.allocate_rect(video_rect, egui::Sense::click_and_drag());
    let (pressed, released, latest) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.any_released(),
            i.pointer.latest_pos(),
        )
    });

    if pressed && response.hovered() {
        if let Some(pos) = latest {
            studio.pointer_down(to_viewport(pos, video_rect.min));
        }
    }

    if !studio.drawing().is_drawing() {
        return;
    }

    if let Some(pos) = latest {
        studio.pointer_move(to_viewport(pos, video_rect.min));
    }

    if released {
        studio.pointer_up();
        if let Some(pos) = latest.filter(|p| video_rect.contains(*p)) {
            studio.click(to_viewport(pos, video_rect.min));
        }
    }
}

fn draw_object(
    painter: &egui::Painter,
    object: &AnnotationObject,
    origin: egui::Pos2,
    frame: u64,
    is_active: bool,
) {
    let color = object.color.to_egui();
    let width = if is_active { 2.5 } else { 1.5 };

    for b in object.boxes.iter().filter(|b| b.frame_number == frame) {
        let rect = egui::Rect::from_min_size(
            origin + egui::vec2(b.x, b.y),
            egui::vec2(b.width, b.height),
        );
        let fill = match b.mode {
            Mode::Add => color.gamma_multiply(0.2),
            Mode::Remove => egui::Color32::TRANSPARENT,
        };
        painter.rect(rect, 0.0, fill, egui::Stroke::new(width, color));
        if b.mode == Mode::Remove {
            painter.line_segment([rect.left_top(), rect.right_bottom()], egui::Stroke::new(1.0, color));
            painter.line_segment([rect.right_top(), rect.left_bottom()], egui::Stroke::new(1.0, color));
        }
    }

    for p in object.points.iter().filter(|p| p.frame_number == frame) {
        let center = origin + egui::vec2(p.x, p.y);
        match p.mode {
            Mode::Add => {
                painter.circle_filled(center, POINT_RADIUS, color);
                painter.circle_stroke(center, POINT_RADIUS, egui::Stroke::new(1.0, egui::Color32::WHITE));
            }
            Mode::Remove => {
                painter.circle_stroke(center, POINT_RADIUS, egui::Stroke::new(width, color));
                let d = POINT_RADIUS * 0.6;
                let stroke = egui::Stroke::new(1.5, color);
                painter.line_segment([center + egui::vec2(-d, -d), center + egui::vec2(d, d)], stroke);
                painter.line_segment([center + egui::vec2(d, -d), center + egui::vec2(-d, d)], stroke);
            }
        }
    }
}

/// Welcome text and drop target shown until a video is loaded.
fn drop_zone(ui: &mut egui::Ui) -> CanvasAction {
    let mut action = CanvasAction::None;
    let hovering = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());

    let rect = ui.max_rect().shrink(24.0);
    let stroke_color = if hovering {
        egui::Color32::from_rgb(0x3b, 0x82, 0xf6)
    } else {
        egui::Color32::from_gray(90)
    };
    ui.painter()
        .rect_stroke(rect, 12.0, egui::Stroke::new(2.0, stroke_color));

    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.heading(
                egui::RichText::new("OpenStudio")
                    .size(32.0)
                    .color(egui::Color32::from_gray(200)),
            );
            ui.label(
                egui::RichText::new("Segment Anything 2 Demo")
                    .size(14.0)
                    .color(egui::Color32::from_gray(150)),
            );
            ui.add_space(20.0);
            ui.label(
                egui::RichText::new("Drag and drop a video file here")
                    .color(egui::Color32::from_gray(180)),
            );
            ui.add_space(10.0);
            if ui.button("Select a video file").clicked() {
                action = CanvasAction::OpenVideo;
            }
        });
    });

    action
}
