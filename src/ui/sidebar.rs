// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Object list and the actions that apply to the whole annotation set.

use crate::models::annotation::{AnnotationObject, Mode};
use crate::models::studio::Studio;

const THUMBNAIL_SIZE: egui::Vec2 = egui::vec2(64.0, 36.0);

/// Result of sidebar interaction.
pub enum SidebarAction {
    None,
    SelectObject(usize),
    SetMode(u32, Mode),
    RemoveObject(u32),
    CaptureThumbnail(u32),
    AddObject,
    StartOver,
    TrackObjects,
}

/// Display the object list.
///
/// `thumbnails` is parallel to the store's objects. `can_capture` is true
/// when a decoded frame is available to use as an object thumbnail.
pub fn show(
    ui: &mut egui::Ui,
    studio: &Studio,
    thumbnails: &[Option<egui::TextureHandle>],
    can_capture: bool,
) -> SidebarAction {
    let mut action = SidebarAction::None;
    let store = studio.store();

    ui.heading("Objects");
    ui.separator();

    if store.is_empty() {
        ui.label(
            egui::RichText::new(
                "No objects selected. Click the \"Add another object\" button below to get started.",
            )
            .italics()
            .weak(),
        );
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, true])
        .max_height(ui.available_height() - 110.0)
        .show(ui, |ui| {
            let active = store.active_index();
            for (index, object) in store.objects().iter().enumerate() {
                let thumbnail = thumbnails.get(index).and_then(|t| t.as_ref());
                let card = object_card(ui, object, thumbnail, Some(index) == active, can_capture);
                if let Some(card_action) = card {
                    action = match card_action {
                        CardAction::Select => SidebarAction::SelectObject(index),
                        CardAction::SetMode(mode) => SidebarAction::SetMode(object.id, mode),
                        CardAction::Remove => SidebarAction::RemoveObject(object.id),
                        CardAction::Capture => SidebarAction::CaptureThumbnail(object.id),
                    };
                }
                ui.add_space(4.0);
            }
        });

    ui.separator();

    ui.vertical_centered_justified(|ui| {
        if ui
            .add_enabled(studio.has_video(), egui::Button::new("➕ Add another object"))
            .clicked()
        {
            action = SidebarAction::AddObject;
        }
        if ui
            .add_enabled(!store.is_empty(), egui::Button::new("Start over"))
            .clicked()
        {
            action = SidebarAction::StartOver;
        }
        let can_track = studio.has_video() && !store.is_empty();
        if ui
            .add_enabled(can_track, egui::Button::new("Track objects"))
            .clicked()
        {
            action = SidebarAction::TrackObjects;
        }
    });

    action
}

enum CardAction {
    Select,
    SetMode(Mode),
    Remove,
    Capture,
}

fn object_card(
    ui: &mut egui::Ui,
    object: &AnnotationObject,
    thumbnail: Option<&egui::TextureHandle>,
    is_active: bool,
    can_capture: bool,
) -> Option<CardAction> {
    let mut action = None;
    let color = object.color.to_egui();

    let stroke = if is_active {
        egui::Stroke::new(2.0, color)
    } else {
        egui::Stroke::new(1.0, egui::Color32::from_gray(70))
    };

    egui::Frame::group(ui.style()).stroke(stroke).show(ui, |ui| {
        ui.horizontal(|ui| {
            match thumbnail {
                Some(texture) => {
                    ui.image((texture.id(), THUMBNAIL_SIZE));
                }
                None => {
                    let (rect, _) = ui.allocate_exact_size(THUMBNAIL_SIZE, egui::Sense::hover());
                    ui.painter().rect_filled(rect, 4.0, color.gamma_multiply(0.35));
                }
            }

            ui.vertical(|ui| {
                if ui.selectable_label(is_active, &object.name).clicked() {
                    action = Some(CardAction::Select);
                }
                ui.label(
                    egui::RichText::new(format!(
                        "{} points, {} boxes",
                        object.points.len(),
                        object.boxes.len()
                    ))
                    .small()
                    .weak(),
                );
            });
        });

        ui.horizontal(|ui| {
            if ui
                .selectable_label(object.mode == Mode::Add, "＋ Add")
                .on_hover_text("New points and boxes include this area")
                .clicked()
            {
                action = Some(CardAction::SetMode(Mode::Add));
            }
            if ui
                .selectable_label(object.mode == Mode::Remove, "－ Remove")
                .on_hover_text("New points and boxes exclude this area")
                .clicked()
            {
                action = Some(CardAction::SetMode(Mode::Remove));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("🗑").on_hover_text("Delete object").clicked() {
                    action = Some(CardAction::Remove);
                }
                if ui
                    .add_enabled(can_capture, egui::Button::new("📷").small())
                    .on_hover_text("Use the current frame as thumbnail")
                    .clicked()
                {
                    action = Some(CardAction::Capture);
                }
            });
        });
    });

    action
}
