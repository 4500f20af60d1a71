// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playback controls shown above the timeline.

use crate::models::studio::Studio;
use crate::util::time::format_time;

pub enum ToolbarAction {
    None,
    TogglePlayback,
}

/// Display the play/pause button and the time readout.
pub fn show(ui: &mut egui::Ui, studio: &Studio) -> ToolbarAction {
    let mut action = ToolbarAction::None;
    let session = studio.session();

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        let label = if session.is_playing() {
            "⏸ Pause"
        } else if session.has_ended() {
            "↺ Replay"
        } else {
            "▶ Play"
        };
        if ui
            .add_enabled(session.has_video(), egui::Button::new(label))
            .on_hover_text("Space")
            .clicked()
        {
            action = ToolbarAction::TogglePlayback;
        }

        ui.separator();

        let duration = session.duration().unwrap_or(0.0);
        ui.label(
            egui::RichText::new(format!(
                "{} / {}",
                format_time(session.current_time()),
                format_time(duration)
            ))
            .monospace(),
        );

        if session.has_video() {
            ui.separator();
            ui.label(
                egui::RichText::new(format!("Frame {}", studio.current_frame()))
                    .weak()
                    .monospace(),
            );
        }

        if studio.is_loading() {
            ui.separator();
            ui.spinner();
            ui.label(egui::RichText::new("Reading video...").italics().weak());
        }
    });

    action
}
