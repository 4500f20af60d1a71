// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns the `Studio` and the GPU textures derived from it. Each
//! frame it collects background results, uploads new frames, and lays out
//! the panels; all state changes go through the studio.

use crate::config::Settings;
use crate::error::MediaError;
use crate::io::media::{decode_thumbnail, video_extensions, MediaBackend, MediaSource, RgbaFrame};
use crate::io::serialization;
use crate::models::annotation::ObjectThumbnail;
use crate::models::studio::{PollEvents, Studio};
use crate::ui::{canvas, sidebar, timeline, toolbar};
use std::path::PathBuf;
use std::sync::Arc;

/// Largest frame step fed to playback, so a stalled frame does not jump ahead.
const MAX_TICK_SECONDS: f64 = 0.1;

pub struct StudioApp {
    studio: Studio,

    /// Latest decoded preview frame and its texture.
    preview_frame: Option<RgbaFrame>,
    preview_texture: Option<egui::TextureHandle>,

    /// One texture per frame strip slot; `None` for slots that failed to decode.
    strip_textures: Vec<Option<egui::TextureHandle>>,

    /// Object list thumbnails, parallel to the store.
    object_textures: Vec<Option<egui::TextureHandle>>,
    objects_dirty: bool,
}

impl StudioApp {
    pub fn new(settings: Settings, backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            studio: Studio::new(settings, backend),
            preview_frame: None,
            preview_texture: None,
            strip_textures: Vec::new(),
            object_textures: Vec::new(),
            objects_dirty: false,
        }
    }

    fn load_video(&mut self, source: MediaSource) {
        let name = source.name.clone();
        match self.studio.load_video(source) {
            Ok(id) => {
                log::info!("Loading video {} as resource {}", name, id.0);
                self.clear_textures();
            }
            Err(MediaError::InvalidMediaType(mime)) => {
                log::warn!("Ignoring {}: not a video ({})", name, mime);
            }
            Err(e) => log::error!("Failed to load {}: {}", name, e),
        }
    }

    fn open_video_dialog(&mut self) {
        let extensions = video_extensions();
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Videos", extensions.as_slice())
            .pick_file()
        {
            self.load_video(MediaSource::from_path(path));
        }
    }

    fn remove_video(&mut self) {
        self.studio.remove_video();
        self.clear_textures();
        log::info!("Video removed");
    }

    fn clear_textures(&mut self) {
        self.preview_frame = None;
        self.preview_texture = None;
        self.strip_textures.clear();
        self.object_textures.clear();
        self.objects_dirty = true;
    }

    /// Load the first dropped file; only videos are accepted.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().find(|f| f.path.is_some()) else {
            return;
        };
        if let Some(path) = file.path {
            self.load_video(MediaSource::from_dropped(path, &file.mime));
        }
    }

    /// Write the current annotation set to a JSON or YAML file.
    fn export_annotations(&self, path: PathBuf) {
        let Some(request) = self.studio.track_request() else {
            return;
        };
        match serialization::export(&request, &path) {
            Ok(()) => log::info!(
                "Exported {} objects ({} prompts) to {}",
                request.objects.len(),
                request.annotation_count(),
                path.display()
            ),
            Err(e) => log::error!("Failed to export annotations: {:#}", e),
        }
    }

    /// Hand the annotation set to the tracking step.
    fn track_objects(&self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name("track_request.json")
            .save_file()
        {
            self.export_annotations(path);
        }
    }

    fn upload_textures(&mut self, ctx: &egui::Context, events: PollEvents) {
        if events.metadata_loaded {
            self.strip_textures.clear();
        }

        if let Some(frame) = events.preview {
            let image = color_image(&frame);
            if let Some(texture) = &mut self.preview_texture {
                texture.set(image, egui::TextureOptions::LINEAR);
            } else {
                self.preview_texture =
                    Some(ctx.load_texture("preview", image, egui::TextureOptions::LINEAR));
            }
            self.preview_frame = Some(frame);
        }

        if events.thumbnails_added > 0 {
            self.upload_strip(ctx);
        }

        if self.objects_dirty {
            self.object_textures = self
                .studio
                .store()
                .objects()
                .iter()
                .map(|object| match &object.thumbnail {
                    ObjectThumbnail::Jpeg(bytes) => decode_thumbnail(bytes).ok().map(|frame| {
                        ctx.load_texture(
                            format!("object_{}", object.id),
                            color_image(&frame),
                            egui::TextureOptions::LINEAR,
                        )
                    }),
                    ObjectThumbnail::Placeholder => None,
                })
                .collect();
            self.objects_dirty = false;
        }
    }

    fn upload_strip(&mut self, ctx: &egui::Context) {
        let thumbnails = self.studio.strip().thumbnails();
        for thumb in thumbnails.iter().skip(self.strip_textures.len()) {
            let texture = thumb.jpeg.as_deref().and_then(|bytes| match decode_thumbnail(bytes) {
                Ok(frame) => Some(ctx.load_texture(
                    format!("strip_{}", thumb.index),
                    color_image(&frame),
                    egui::TextureOptions::LINEAR,
                )),
                Err(e) => {
                    log::warn!("Unreadable thumbnail {}: {}", thumb.index, e);
                    None
                }
            });
            self.strip_textures.push(texture);
        }
    }

    fn handle_sidebar(&mut self, action: sidebar::SidebarAction) {
        use sidebar::SidebarAction;

        match action {
            SidebarAction::SelectObject(index) => self.studio.select_object(index),
            SidebarAction::SetMode(id, mode) => {
                self.studio.set_mode(id, mode);
            }
            SidebarAction::RemoveObject(id) => {
                if self.studio.remove_object(id) {
                    log::info!("Removed object {}", id);
                    self.objects_dirty = true;
                }
            }
            SidebarAction::CaptureThumbnail(id) => {
                if let Some(frame) = &self.preview_frame {
                    match self.studio.set_object_thumbnail(id, frame) {
                        Ok(()) => self.objects_dirty = true,
                        Err(e) => log::error!("Failed to set thumbnail: {}", e),
                    }
                }
            }
            SidebarAction::AddObject => {
                if let Some(id) = self.studio.add_object() {
                    log::info!("Added object {}", id);
                    self.objects_dirty = true;
                }
            }
            SidebarAction::StartOver => {
                self.studio.start_over();
                self.objects_dirty = true;
            }
            SidebarAction::TrackObjects => self.track_objects(),
            SidebarAction::None => {}
        }
    }
}

fn color_image(frame: &RgbaFrame) -> egui::ColorImage {
    egui::ColorImage::from_rgba_unmultiplied(
        [frame.width as usize, frame.height as usize],
        &frame.pixels,
    )
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let events = self.studio.poll();
        self.upload_textures(ctx, events);

        self.handle_dropped_files(ctx);

        // Space toggles playback unless a text field has focus
        if self.studio.has_video()
            && !ctx.wants_keyboard_input()
            && ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Space))
        {
            self.studio.toggle_playback();
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.studio.clear_selection();
        }

        let dt = ctx.input(|i| i.stable_dt as f64).min(MAX_TICK_SECONDS);
        self.studio.tick(dt);

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Video...").clicked() {
                        self.open_video_dialog();
                        ui.close_menu();
                    }
                    ui.separator();
                    let has_video = self.studio.has_video();
                    ui.add_enabled_ui(has_video, |ui| {
                        ui.menu_button("Export Annotations", |ui| {
                            if ui.button("Export as YAML...").clicked() {
                                if let Some(path) = rfd::FileDialog::new()
                                    .add_filter("YAML", &["yaml", "yml"])
                                    .set_file_name("annotations.yaml")
                                    .save_file()
                                {
                                    self.export_annotations(path);
                                }
                                ui.close_menu();
                            }
                            if ui.button("Export as JSON...").clicked() {
                                if let Some(path) = rfd::FileDialog::new()
                                    .add_filter("JSON", &["json"])
                                    .set_file_name("annotations.json")
                                    .save_file()
                                {
                                    self.export_annotations(path);
                                }
                                ui.close_menu();
                            }
                        });
                        if ui.button("Remove Video").clicked() {
                            self.remove_video();
                            ui.close_menu();
                        }
                    });
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        // Playback bar and scrub timeline
        egui::TopBottomPanel::bottom("timeline")
            .resizable(false)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                if let toolbar::ToolbarAction::TogglePlayback = toolbar::show(ui, &self.studio) {
                    self.studio.toggle_playback();
                }
                ui.add_space(12.0);
                timeline::show(ui, &mut self.studio, &self.strip_textures);
                ui.add_space(8.0);
            });

        // Object list (right side)
        let sidebar_action = egui::SidePanel::right("objects")
            .default_width(280.0)
            .show(ctx, |ui| {
                sidebar::show(
                    ui,
                    &self.studio,
                    &self.object_textures,
                    self.preview_frame.is_some(),
                )
            })
            .inner;
        self.handle_sidebar(sidebar_action);

        // Video viewport (center)
        let canvas_action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                canvas::show(ui, &mut self.studio, self.preview_texture.as_ref())
            })
            .inner;
        if let canvas::CanvasAction::OpenVideo = canvas_action {
            self.open_video_dialog();
        }

        if self.studio.needs_repaint() {
            ctx.request_repaint();
        }
    }
}
