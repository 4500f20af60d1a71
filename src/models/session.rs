// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media session: the loaded video and its playback clock.
//!
//! Every load gets a fresh `ResourceId`. Workers started for a resource
//! tag their results with it, so anything arriving for a replaced or
//! removed resource can be recognised and dropped.

use crate::error::MediaError;
use crate::io::media::{MediaInfo, MediaSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(pub u64);

/// The currently loaded video.
#[derive(Debug)]
pub struct VideoResource {
    pub id: ResourceId,
    pub source: MediaSource,
    /// Known once the metadata probe finishes.
    pub info: Option<MediaInfo>,
    current_time: f64,
    playing: bool,
    ended: bool,
}

impl VideoResource {
    fn new(id: ResourceId, source: MediaSource) -> Self {
        Self {
            id,
            source,
            info: None,
            current_time: 0.0,
            playing: false,
            ended: false,
        }
    }

    fn duration(&self) -> Option<f64> {
        self.info.map(|i| i.duration)
    }

    fn at_end(&self) -> bool {
        self.duration()
            .is_some_and(|d| d > 0.0 && self.current_time >= d)
    }
}

#[derive(Debug, Default)]
pub struct MediaSession {
    resource: Option<VideoResource>,
    next_id: u64,
}

impl MediaSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current video. Non-video sources are rejected and leave
    /// the session untouched.
    pub fn load_video(&mut self, source: MediaSource) -> Result<ResourceId, MediaError> {
        source.ensure_video()?;

        if let Some(old) = self.resource.take() {
            log::info!("Releasing {} (resource {})", old.source.name, old.id.0);
        }

        self.next_id += 1;
        let id = ResourceId(self.next_id);
        log::info!("Loaded {} as resource {}", source.name, id.0);
        self.resource = Some(VideoResource::new(id, source));
        Ok(id)
    }

    /// Release the current video, returning its id.
    pub fn remove_video(&mut self) -> Option<ResourceId> {
        let old = self.resource.take()?;
        log::info!("Removed {} (resource {})", old.source.name, old.id.0);
        Some(old.id)
    }

    /// Record probed metadata. Ignored if `id` is no longer current.
    pub fn metadata_loaded(&mut self, id: ResourceId, info: MediaInfo) -> bool {
        match self.resource.as_mut() {
            Some(resource) if resource.id == id => {
                resource.info = Some(info);
                resource.current_time = resource.current_time.clamp(0.0, info.duration);
                true
            }
            _ => false,
        }
    }

    pub fn resource(&self) -> Option<&VideoResource> {
        self.resource.as_ref()
    }

    pub fn resource_id(&self) -> Option<ResourceId> {
        self.resource.as_ref().map(|r| r.id)
    }

    pub fn has_video(&self) -> bool {
        self.resource.is_some()
    }

    pub fn info(&self) -> Option<MediaInfo> {
        self.resource.as_ref().and_then(|r| r.info)
    }

    pub fn duration(&self) -> Option<f64> {
        self.resource.as_ref().and_then(|r| r.duration())
    }

    pub fn current_time(&self) -> f64 {
        self.resource.as_ref().map_or(0.0, |r| r.current_time)
    }

    pub fn is_playing(&self) -> bool {
        self.resource.as_ref().is_some_and(|r| r.playing)
    }

    pub fn has_ended(&self) -> bool {
        self.resource.as_ref().is_some_and(|r| r.ended)
    }

    /// Start playback, restarting from zero when positioned at the end.
    pub fn play(&mut self) {
        if let Some(resource) = self.resource.as_mut() {
            if resource.ended || resource.at_end() {
                resource.current_time = 0.0;
                resource.ended = false;
            }
            resource.playing = true;
        }
    }

    pub fn pause(&mut self) {
        if let Some(resource) = self.resource.as_mut() {
            resource.playing = false;
        }
    }

    /// Flip between playing and paused. Returns the new playing state.
    pub fn toggle(&mut self) -> bool {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
        self.is_playing()
    }

    /// Jump to `time`, clamped to the video. Playback state is unchanged.
    pub fn seek(&mut self, time: f64) {
        let Some(resource) = self.resource.as_mut() else {
            return;
        };
        let duration = resource.duration().unwrap_or(0.0);
        let time = if time.is_finite() { time } else { 0.0 };
        resource.current_time = time.clamp(0.0, duration);
        resource.ended = resource.at_end();
    }

    /// Advance the clock by one display frame. Returns true if time moved.
    pub fn advance(&mut self, dt: f64) -> bool {
        let Some(resource) = self.resource.as_mut() else {
            return false;
        };
        let Some(duration) = resource.duration() else {
            return false;
        };
        if !resource.playing || dt <= 0.0 {
            return false;
        }

        resource.current_time += dt;
        if resource.current_time >= duration {
            resource.current_time = duration;
            resource.playing = false;
            resource.ended = true;
            log::debug!("Playback reached the end at {:.3}s", duration);
        }
        true
    }
}
