// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation studio state.
//!
//! `Studio` owns the media session, the annotation store and the
//! interactive controllers, and passes them to each other explicitly.
//! It has no UI dependency: the egui app feeds it pointer and keyboard
//! input and renders whatever it exposes.

use super::drawing::{DrawOutcome, DrawingSurface};
use super::frame_strip::{FrameStrip, StripFormat};
use super::playhead::{PlayheadController, PositionSource, TrackSpan};
use super::session::{MediaSession, ResourceId};
use super::store::AnnotationStore;
use super::track::TrackRequest;
use super::annotation::{Mode, ObjectThumbnail};
use crate::config::Settings;
use crate::error::MediaError;
use crate::io::media::{
    encode_thumbnail, FrameSize, MediaBackend, MediaInfo, MediaSource, RgbaFrame,
};
use crate::io::preview::PreviewFeed;
use crate::util::geometry::ViewportPos;
use crate::util::time::frame_number;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;

type ProbeResult = (ResourceId, Result<MediaInfo, MediaError>);

/// Object list thumbnails are cut to this size.
const OBJECT_THUMBNAIL_SIZE: FrameSize = FrameSize {
    width: 96,
    height: 54,
};

/// What changed during a `poll`.
#[derive(Debug, Default)]
pub struct PollEvents {
    pub metadata_loaded: bool,
    pub thumbnails_added: usize,
    pub preview: Option<RgbaFrame>,
}

pub struct Studio {
    settings: Settings,
    backend: Arc<dyn MediaBackend>,
    session: MediaSession,
    store: AnnotationStore,
    drawing: DrawingSurface,
    playhead: PlayheadController,
    strip: FrameStrip,
    preview: Option<PreviewFeed>,
    probe: Option<Receiver<ProbeResult>>,
    last_preview_request: Option<u64>,
    /// Time of the newest preview request not yet answered.
    pending_preview: Option<f64>,
}

impl Studio {
    pub fn new(settings: Settings, backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            drawing: DrawingSurface::new(settings.min_box_size),
            strip: FrameStrip::new(settings.strip_length),
            settings,
            backend,
            session: MediaSession::new(),
            store: AnnotationStore::new(),
            playhead: PlayheadController::new(),
            preview: None,
            probe: None,
            last_preview_request: None,
            pending_preview: None,
        }
    }

    pub fn session(&self) -> &MediaSession {
        &self.session
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn drawing(&self) -> &DrawingSurface {
        &self.drawing
    }

    pub fn strip(&self) -> &FrameStrip {
        &self.strip
    }

    pub fn has_video(&self) -> bool {
        self.session.has_video()
    }

    pub fn is_loading(&self) -> bool {
        self.probe.is_some()
    }

    // ---- media session ----

    /// Load a new video, discarding everything tied to the previous one.
    ///
    /// A non-video source fails with `InvalidMediaType` and changes nothing.
    pub fn load_video(&mut self, source: MediaSource) -> Result<ResourceId, MediaError> {
        let id = self.session.load_video(source.clone())?;
        self.release_dependents();

        let (sender, receiver) = channel();
        let backend = Arc::clone(&self.backend);
        std::thread::spawn(move || {
            let result = backend.probe(&source);
            let _ = sender.send((id, result));
        });
        self.probe = Some(receiver);
        Ok(id)
    }

    /// Remove the video and everything derived from it.
    pub fn remove_video(&mut self) {
        if self.session.remove_video().is_some() {
            self.release_dependents();
        }
    }

    fn release_dependents(&mut self) {
        self.probe = None;
        self.preview = None;
        self.strip.reset();
        self.store.reset();
        self.drawing.reset();
        self.playhead.end_drag();
        self.last_preview_request = None;
        self.pending_preview = None;
    }

    /// Collect results from background work.
    pub fn poll(&mut self) -> PollEvents {
        let mut events = PollEvents::default();

        if let Some(receiver) = &self.probe {
            match receiver.try_recv() {
                Ok((id, Ok(info))) => {
                    self.probe = None;
                    if self.session.metadata_loaded(id, info) {
                        log::info!(
                            "Metadata: {:.2}s, {}x{}",
                            info.duration,
                            info.width,
                            info.height
                        );
                        self.start_workers(id, info);
                        events.metadata_loaded = true;
                    }
                }
                Ok((_, Err(e))) => {
                    self.probe = None;
                    log::error!("Failed to read video metadata: {}", e);
                }
                Err(TryRecvError::Disconnected) => self.probe = None,
                Err(TryRecvError::Empty) => {}
            }
        }

        events.thumbnails_added = self.strip.poll();

        if let Some(preview) = &self.preview {
            let current = self.session.resource_id();
            if let Some(answer) = preview.poll().filter(|f| Some(f.resource) == current) {
                if self.pending_preview == Some(answer.time) {
                    self.pending_preview = None;
                }
                events.preview = answer.frame;
            }
        }
        self.request_preview();

        events
    }

    fn start_workers(&mut self, id: ResourceId, info: MediaInfo) {
        let Some(resource) = self.session.resource() else {
            return;
        };
        let source = resource.source.clone();

        self.preview = Some(PreviewFeed::spawn(
            id,
            Arc::clone(&self.backend),
            source.clone(),
            info.preview_size(self.settings.preview_max_width),
        ));
        self.last_preview_request = None;
        self.pending_preview = None;

        self.strip.start(
            id,
            Arc::clone(&self.backend),
            source,
            info.duration,
            StripFormat {
                length: self.settings.strip_length,
                size: FrameSize::new(self.settings.thumbnail_width, self.settings.thumbnail_height),
                quality: self.settings.thumbnail_quality,
            },
        );
    }

    /// Ask for a new preview frame whenever the frame under the playhead changes.
    fn request_preview(&mut self) {
        let Some(preview) = &self.preview else {
            return;
        };
        let frame = self.current_frame();
        if self.last_preview_request != Some(frame) {
            let time = self.session.current_time();
            preview.request(time);
            self.last_preview_request = Some(frame);
            self.pending_preview = Some(time);
        }
    }

    /// Advance playback by one display frame.
    pub fn tick(&mut self, dt: f64) {
        self.session.advance(dt);
    }

    /// Whether another display frame is needed to keep things moving.
    pub fn needs_repaint(&self) -> bool {
        self.session.is_playing()
            || self.strip.is_running()
            || self.probe.is_some()
            || self.pending_preview.is_some()
    }

    /// Toggle playback. `None` when no video is loaded.
    pub fn toggle_playback(&mut self) -> Option<bool> {
        if !self.session.has_video() {
            return None;
        }
        let playing = self.session.toggle();
        log::debug!("Playback {}", if playing { "started" } else { "paused" });
        Some(playing)
    }

    pub fn seek(&mut self, time: f64) {
        self.session.seek(time);
    }

    /// Frame index under the playhead at the assumed frame rate.
    pub fn current_frame(&self) -> u64 {
        frame_number(self.session.current_time(), self.settings.assumed_fps)
    }

    // ---- annotation store ----

    /// Add an object; disabled until a video is loaded.
    pub fn add_object(&mut self) -> Option<u32> {
        self.session.has_video().then(|| self.store.add_object())
    }

    pub fn remove_object(&mut self, id: u32) -> bool {
        self.store.remove_object(id)
    }

    pub fn set_mode(&mut self, id: u32, mode: Mode) -> bool {
        self.store.set_mode(id, mode)
    }

    pub fn select_object(&mut self, index: usize) {
        self.store.select_object(index);
    }

    /// Fall back to annotating the newest object.
    pub fn clear_selection(&mut self) {
        self.store.clear_selection();
    }

    /// Use a frame as an object's list thumbnail.
    pub fn set_object_thumbnail(&mut self, id: u32, frame: &RgbaFrame) -> Result<(), MediaError> {
        let small = frame.resized(OBJECT_THUMBNAIL_SIZE)?;
        let jpeg = encode_thumbnail(&small, self.settings.thumbnail_quality)?;
        self.store.set_thumbnail(id, ObjectThumbnail::Jpeg(jpeg));
        Ok(())
    }

    /// Clear all objects but keep the video.
    pub fn start_over(&mut self) {
        self.store.reset();
        self.drawing.reset();
        log::info!("Started over");
    }

    // ---- drawing surface ----

    pub fn pointer_down(&mut self, pos: ViewportPos) {
        self.drawing.pointer_down(pos, self.session.has_video());
    }

    pub fn pointer_move(&mut self, pos: ViewportPos) {
        self.drawing.pointer_move(pos);
    }

    pub fn pointer_up(&mut self) -> DrawOutcome {
        let frame = self.current_frame();
        self.drawing.pointer_up(&mut self.store, frame)
    }

    pub fn click(&mut self, pos: ViewportPos) -> DrawOutcome {
        let frame = self.current_frame();
        self.drawing.click(pos, &mut self.store, frame)
    }

    // ---- playhead ----

    pub fn is_scrubbing(&self) -> bool {
        self.playhead.is_dragging()
    }

    pub fn playhead_source(&self) -> PositionSource {
        self.playhead.source(self.session.is_playing())
    }

    pub fn begin_scrub(&mut self, pointer_x: f32, track: TrackSpan) {
        let duration = self.session.duration().unwrap_or(0.0);
        if let Some(time) = self.playhead.begin_drag(pointer_x, track, duration) {
            self.session.seek(time);
        }
    }

    pub fn scrub_to(&mut self, pointer_x: f32, track: TrackSpan) {
        let duration = self.session.duration().unwrap_or(0.0);
        if let Some(time) = self.playhead.drag_to(pointer_x, track, duration) {
            self.session.seek(time);
        }
    }

    pub fn end_scrub(&mut self) {
        self.playhead.end_drag();
    }

    /// Playhead position in percent.
    pub fn playhead_position(&self) -> f64 {
        self.playhead.position(
            self.session.current_time(),
            self.session.duration().unwrap_or(0.0),
        )
    }

    pub fn playhead_tooltip(&self) -> Option<String> {
        self.playhead
            .tooltip(self.session.duration().unwrap_or(0.0))
    }

    // ---- tracking ----

    /// Snapshot of the current annotations for the tracking step.
    pub fn track_request(&self) -> Option<TrackRequest> {
        let resource = self.session.resource()?;
        Some(TrackRequest::new(
            &resource.source.path.to_string_lossy(),
            self.session.duration().unwrap_or(0.0),
            self.settings.assumed_fps,
            &self.store,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::FrameDecoder;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    /// Counts live decoders so tests can check they get released.
    struct FakeBackend {
        duration: f64,
        live_decoders: Arc<AtomicUsize>,
        fail_decode: bool,
    }

    struct FakeDecoder {
        live: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Drop for FakeDecoder {
        fn drop(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl MediaBackend for FakeBackend {
        fn probe(&self, _source: &MediaSource) -> Result<MediaInfo, MediaError> {
            Ok(MediaInfo {
                duration: self.duration,
                width: 64,
                height: 36,
            })
        }

        fn open_decoder(&self, _source: &MediaSource) -> Result<Box<dyn FrameDecoder>, MediaError> {
            self.live_decoders.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeDecoder {
                live: Arc::clone(&self.live_decoders),
                fail: self.fail_decode,
            }))
        }
    }

    impl FrameDecoder for FakeDecoder {
        fn decode_at(&mut self, seconds: f64, size: FrameSize) -> Result<RgbaFrame, MediaError> {
            std::thread::sleep(Duration::from_millis(5));
            if self.fail {
                return Err(MediaError::Decode {
                    time: seconds,
                    reason: "corrupt stream".to_string(),
                });
            }
            Ok(RgbaFrame {
                width: size.width,
                height: size.height,
                pixels: vec![128; (size.width * size.height * 4) as usize],
            })
        }
    }

    fn studio_with(duration: f64, fail_decode: bool) -> (Studio, Arc<AtomicUsize>) {
        let live = Arc::new(AtomicUsize::new(0));
        let backend = Arc::new(FakeBackend {
            duration,
            live_decoders: Arc::clone(&live),
            fail_decode,
        });
        (Studio::new(Settings::default(), backend), live)
    }

    fn studio(duration: f64) -> (Studio, Arc<AtomicUsize>) {
        studio_with(duration, false)
    }

    fn video() -> MediaSource {
        MediaSource::from_path(PathBuf::from("/videos/clip.mp4"))
    }

    fn poll_until(studio: &mut Studio, mut done: impl FnMut(&Studio) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !done(studio) {
            assert!(Instant::now() < deadline, "condition never reached");
            studio.poll();
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    fn loaded_studio(duration: f64) -> (Studio, Arc<AtomicUsize>) {
        let (mut studio, live) = studio(duration);
        studio.load_video(video()).unwrap();
        poll_until(&mut studio, |s| s.session().duration().is_some());
        (studio, live)
    }

    #[test]
    fn test_metadata_starts_thumbnail_strip() {
        let (mut studio, _) = loaded_studio(10.0);
        assert_eq!(studio.session().duration(), Some(10.0));

        poll_until(&mut studio, |s| s.strip().is_complete());
        let thumbs = studio.strip().thumbnails();
        assert_eq!(thumbs.len(), 15);
        for (i, thumb) in thumbs.iter().enumerate() {
            assert!((thumb.timestamp - i as f64 / 14.0 * 10.0).abs() < 1e-12);
            assert!(thumb.jpeg.is_some());
        }
    }

    #[test]
    fn test_repaint_stops_when_decoding_fails() {
        let (mut studio, _) = studio_with(10.0, true);
        studio.load_video(video()).unwrap();
        poll_until(&mut studio, |s| s.session().duration().is_some());
        assert!(studio.needs_repaint());

        poll_until(&mut studio, |s| !s.needs_repaint());
        assert!(!studio.session().is_playing());
        assert!(studio.strip().is_complete());
        assert!(studio.strip().thumbnails().iter().all(|t| t.jpeg.is_none()));

        // A new frame under the playhead asks again and settles again.
        studio.seek(4.0);
        studio.poll();
        assert!(studio.needs_repaint());
        poll_until(&mut studio, |s| !s.needs_repaint());
    }

    #[test]
    fn test_play_after_scrubbing_to_end_restarts() {
        let (mut studio, _) = loaded_studio(10.0);
        let track = TrackSpan::new(0.0, 200.0);

        studio.begin_scrub(250.0, track);
        studio.end_scrub();
        assert_eq!(studio.session().current_time(), 10.0);

        assert_eq!(studio.toggle_playback(), Some(true));
        assert_eq!(studio.session().current_time(), 0.0);
    }

    #[test]
    fn test_invalid_file_changes_nothing() {
        let (mut studio, _) = loaded_studio(10.0);
        studio.add_object();
        let before = studio.session().resource_id();

        let result = studio.load_video(MediaSource::from_path(PathBuf::from("/tmp/readme.txt")));
        assert!(matches!(result, Err(MediaError::InvalidMediaType(_))));
        assert_eq!(studio.session().resource_id(), before);
        assert_eq!(studio.store().len(), 1);
    }

    #[test]
    fn test_add_object_requires_video() {
        let (mut studio, _) = studio(10.0);
        assert_eq!(studio.add_object(), None);
        assert!(studio.store().is_empty());

        studio.load_video(video()).unwrap();
        assert_eq!(studio.add_object(), Some(1));
    }

    #[test]
    fn test_remove_video_mid_extraction() {
        let (mut studio, live) = loaded_studio(10.0);
        studio.add_object();
        poll_until(&mut studio, |s| !s.strip().thumbnails().is_empty());

        studio.remove_video();
        assert!(!studio.has_video());
        assert!(studio.strip().thumbnails().is_empty());
        assert!(studio.store().is_empty());
        assert_eq!(studio.session().current_time(), 0.0);

        std::thread::sleep(Duration::from_millis(50));
        studio.poll();
        assert!(studio.strip().thumbnails().is_empty());

        // Both decoders (preview and strip) are released once their workers stop.
        let deadline = Instant::now() + Duration::from_secs(5);
        while live.load(Ordering::SeqCst) > 0 {
            assert!(Instant::now() < deadline, "decoders leaked");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_reload_resets_annotations_and_strip() {
        let (mut studio, _) = loaded_studio(10.0);
        studio.add_object();
        studio.click(ViewportPos::new(10.0, 10.0));
        poll_until(&mut studio, |s| !s.strip().thumbnails().is_empty());

        studio.load_video(video()).unwrap();
        assert!(studio.store().is_empty());
        assert!(studio.strip().thumbnails().is_empty());
        assert_eq!(studio.session().duration(), None);
    }

    #[test]
    fn test_annotation_frame_number_follows_playhead() {
        let (mut studio, _) = loaded_studio(10.0);
        studio.add_object();
        studio.seek(2.5);

        studio.click(ViewportPos::new(40.0, 40.0));
        studio.pointer_down(ViewportPos::new(0.0, 0.0));
        studio.pointer_move(ViewportPos::new(15.0, 15.0));
        studio.pointer_up();

        let object = &studio.store().objects()[0];
        assert_eq!(object.points[0].frame_number, 75);
        assert_eq!(object.boxes[0].frame_number, 75);
    }

    #[test]
    fn test_toggle_without_video_is_inert() {
        let (mut studio, _) = studio(10.0);
        assert_eq!(studio.toggle_playback(), None);

        studio.load_video(video()).unwrap();
        assert_eq!(studio.toggle_playback(), Some(true));
        assert_eq!(studio.toggle_playback(), Some(false));
    }

    #[test]
    fn test_scrub_seeks_session() {
        let (mut studio, _) = loaded_studio(10.0);
        let track = TrackSpan::new(0.0, 200.0);

        studio.toggle_playback();
        studio.begin_scrub(100.0, track);
        assert_eq!(studio.session().current_time(), 5.0);
        assert_eq!(studio.playhead_tooltip().as_deref(), Some("0:05"));

        studio.tick(1.0);
        assert_eq!(studio.playhead_source(), PositionSource::Drag);
        assert_eq!(studio.playhead_position(), 50.0);

        studio.scrub_to(150.0, track);
        assert_eq!(studio.session().current_time(), 7.5);

        studio.end_scrub();
        studio.toggle_playback();
        assert_eq!(studio.playhead_source(), PositionSource::External);
        assert_eq!(studio.playhead_position(), 75.0);
        assert!(studio.playhead_tooltip().is_none());
    }

    #[test]
    fn test_start_over_keeps_video() {
        let (mut studio, _) = loaded_studio(10.0);
        studio.add_object();
        studio.add_object();
        studio.start_over();
        assert!(studio.store().is_empty());
        assert!(studio.has_video());
        assert_eq!(studio.add_object(), Some(1));
    }

    #[test]
    fn test_track_request_is_fresh() {
        let (mut studio, _) = loaded_studio(10.0);
        assert_eq!(studio.track_request().unwrap().objects.len(), 0);

        studio.add_object();
        studio.click(ViewportPos::new(3.0, 4.0));
        let request = studio.track_request().unwrap();
        assert_eq!(request.video, "/videos/clip.mp4");
        assert_eq!(request.duration, 10.0);
        assert_eq!(request.assumed_fps, 30.0);
        assert_eq!(request.annotation_count(), 1);
    }

    #[test]
    fn test_object_thumbnail_from_frame() {
        let (mut studio, _) = loaded_studio(10.0);
        let id = studio.add_object().unwrap();
        let frame = RgbaFrame {
            width: 64,
            height: 36,
            pixels: vec![200; 64 * 36 * 4],
        };

        studio.set_object_thumbnail(id, &frame).unwrap();
        assert!(matches!(
            studio.store().objects()[0].thumbnail,
            ObjectThumbnail::Jpeg(_)
        ));
    }
}
