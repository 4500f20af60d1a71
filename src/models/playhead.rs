// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playhead position arbitration for the scrub timeline.
//!
//! Three sources compete for the playhead: a user drag, running playback,
//! and the plain media time when neither applies. A drag always wins; it
//! holds the position until the pointer is released anywhere.

use crate::util::time::format_time;

/// Horizontal extent of the timeline track in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSpan {
    pub left: f32,
    pub width: f32,
}

impl TrackSpan {
    pub fn new(left: f32, width: f32) -> Self {
        Self { left, width }
    }

    /// Percentage along the track for a pointer x, clamped to `[0, 100]`.
    pub fn percent_at(&self, pointer_x: f32) -> f64 {
        if self.width <= 0.0 {
            return 0.0;
        }
        (((pointer_x - self.left) / self.width) as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// Screen x of a percentage along the track.
    pub fn x_at(&self, percent: f64) -> f32 {
        self.left + self.width * (percent.clamp(0.0, 100.0) / 100.0) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrubState {
    Idle,
    Dragging { percent: f64 },
}

/// Which source currently decides the playhead position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSource {
    Drag,
    Playback,
    External,
}

#[derive(Debug)]
pub struct PlayheadController {
    state: ScrubState,
}

impl Default for PlayheadController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayheadController {
    pub fn new() -> Self {
        Self {
            state: ScrubState::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ScrubState::Dragging { .. })
    }

    /// Pointer pressed on the track or handle. Returns the time to seek to.
    pub fn begin_drag(&mut self, pointer_x: f32, track: TrackSpan, duration: f64) -> Option<f64> {
        if duration <= 0.0 {
            return None;
        }
        self.state = ScrubState::Dragging {
            percent: track.percent_at(pointer_x),
        };
        self.seek_target(duration)
    }

    /// Pointer moved anywhere while dragging. Returns the time to seek to.
    pub fn drag_to(&mut self, pointer_x: f32, track: TrackSpan, duration: f64) -> Option<f64> {
        match &mut self.state {
            ScrubState::Dragging { percent } => {
                *percent = track.percent_at(pointer_x);
                self.seek_target(duration)
            }
            ScrubState::Idle => None,
        }
    }

    /// Pointer released anywhere.
    pub fn end_drag(&mut self) {
        self.state = ScrubState::Idle;
    }

    pub fn source(&self, is_playing: bool) -> PositionSource {
        match self.state {
            ScrubState::Dragging { .. } => PositionSource::Drag,
            ScrubState::Idle if is_playing => PositionSource::Playback,
            ScrubState::Idle => PositionSource::External,
        }
    }

    /// Playhead position in percent of the duration.
    pub fn position(&self, current_time: f64, duration: f64) -> f64 {
        match self.state {
            ScrubState::Dragging { percent } => percent,
            ScrubState::Idle if duration > 0.0 => (current_time / duration * 100.0).clamp(0.0, 100.0),
            ScrubState::Idle => 0.0,
        }
    }

    /// Time label shown above the handle while dragging.
    pub fn tooltip(&self, duration: f64) -> Option<String> {
        match self.state {
            ScrubState::Dragging { percent } => Some(format_time(duration * percent / 100.0)),
            ScrubState::Idle => None,
        }
    }

    fn seek_target(&self, duration: f64) -> Option<f64> {
        match self.state {
            ScrubState::Dragging { percent } => Some(duration * percent / 100.0),
            ScrubState::Idle => None,
        }
    }
}
