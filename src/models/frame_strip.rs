// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Thumbnail strip shown along the scrub timeline.
//!
//! A single worker thread owns one decoder and walks the sample
//! timestamps in order: seek, rasterize, encode, send, next. Thumbnails
//! arrive one at a time so the timeline fills in progressively.
//!
//! Resetting cancels the worker (checked before every seek), drops the
//! receiving end so nothing further can be appended, and clears the strip.

use super::session::ResourceId;
use crate::error::MediaError;
use crate::io::media::{encode_thumbnail, FrameDecoder, FrameSize, MediaBackend, MediaSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;

/// How thumbnails are sampled and rasterized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripFormat {
    pub length: usize,
    pub size: FrameSize,
    pub quality: u8,
}

/// One slot of the strip.
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub index: usize,
    /// Sample time in seconds.
    pub timestamp: f64,
    /// JPEG bytes, or `None` when the frame could not be decoded.
    pub jpeg: Option<Vec<u8>>,
}

/// Sample times for a strip: evenly spaced, first and last frame included.
pub fn sample_times(duration: f64, length: usize) -> Vec<f64> {
    match length {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n)
            .map(|i| i as f64 / (n - 1) as f64 * duration)
            .collect(),
    }
}

/// Run the seek-and-capture pipeline on one decoder.
///
/// `emit` receives each thumbnail in index order; returning false stops
/// the run. A frame that fails to decode becomes an empty slot.
pub fn extract(
    decoder: &mut dyn FrameDecoder,
    times: &[f64],
    format: StripFormat,
    cancel: &AtomicBool,
    mut emit: impl FnMut(Thumbnail) -> bool,
) {
    for (index, &timestamp) in times.iter().enumerate() {
        if cancel.load(Ordering::Acquire) {
            log::debug!("Frame strip cancelled before slot {}", index);
            return;
        }

        let jpeg = match capture(decoder, timestamp, format) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Thumbnail {} at {:.3}s unavailable: {}", index, timestamp, e);
                None
            }
        };

        if !emit(Thumbnail {
            index,
            timestamp,
            jpeg,
        }) {
            return;
        }
    }
}

fn capture(
    decoder: &mut dyn FrameDecoder,
    timestamp: f64,
    format: StripFormat,
) -> Result<Vec<u8>, MediaError> {
    let frame = decoder.decode_at(timestamp, format.size)?.resized(format.size)?;
    encode_thumbnail(&frame, format.quality)
}

struct StripJob {
    resource: ResourceId,
    cancel: Arc<AtomicBool>,
    receiver: Receiver<Thumbnail>,
}

impl Drop for StripJob {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Release);
    }
}

pub struct FrameStrip {
    length: usize,
    thumbnails: Vec<Thumbnail>,
    job: Option<StripJob>,
}

impl FrameStrip {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            thumbnails: Vec::new(),
            job: None,
        }
    }

    /// Number of slots the strip will hold once complete.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn thumbnails(&self) -> &[Thumbnail] {
        &self.thumbnails
    }

    pub fn is_running(&self) -> bool {
        self.job.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.thumbnails.len() == self.length
    }

    /// Start extracting thumbnails for a resource, replacing any earlier run.
    pub fn start(
        &mut self,
        resource: ResourceId,
        backend: Arc<dyn MediaBackend>,
        source: MediaSource,
        duration: f64,
        format: StripFormat,
    ) {
        self.reset();
        if !(duration.is_finite() && duration > 0.0) {
            return;
        }
        self.length = format.length;

        let (sender, receiver) = channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = Arc::clone(&cancel);
        let times = sample_times(duration, format.length);

        std::thread::spawn(move || {
            // The decoder lives only as long as this thread.
            let mut decoder = match backend.open_decoder(&source) {
                Ok(decoder) => decoder,
                Err(e) => {
                    log::error!("Frame strip decoder for {} failed: {}", source.name, e);
                    return;
                }
            };
            extract(decoder.as_mut(), &times, format, &worker_cancel, |thumb| {
                sender.send(thumb).is_ok()
            });
            log::debug!("Frame strip worker for resource {} finished", resource.0);
        });

        log::info!(
            "Extracting {} thumbnails for resource {}",
            format.length,
            resource.0
        );
        self.job = Some(StripJob {
            resource,
            cancel,
            receiver,
        });
    }

    /// Append thumbnails that have arrived. Returns how many were added.
    pub fn poll(&mut self) -> usize {
        let Some(job) = &self.job else {
            return 0;
        };
        let before = self.thumbnails.len();
        let mut worker_gone = false;
        loop {
            match job.receiver.try_recv() {
                Ok(thumb) => {
                    debug_assert_eq!(thumb.index, self.thumbnails.len());
                    self.thumbnails.push(thumb);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    worker_gone = true;
                    break;
                }
            }
        }

        if self.is_complete() {
            log::info!("Frame strip for resource {} complete", job.resource.0);
            self.job = None;
        } else if worker_gone {
            log::warn!(
                "Frame strip for resource {} stopped after {} of {} thumbnails",
                job.resource.0,
                self.thumbnails.len(),
                self.length
            );
            self.job = None;
        }
        self.thumbnails.len() - before
    }

    /// Cancel any running extraction and clear the strip.
    pub fn reset(&mut self) {
        if let Some(job) = self.job.take() {
            log::debug!("Cancelling frame strip for resource {}", job.resource.0);
        }
        self.thumbnails.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::{MediaInfo, RgbaFrame};
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Records every seek; optionally fails at one timestamp.
    struct RecordingDecoder {
        seeks: Arc<Mutex<Vec<f64>>>,
        fail_at: Option<f64>,
        delay: Duration,
    }

    impl FrameDecoder for RecordingDecoder {
        fn decode_at(&mut self, seconds: f64, size: FrameSize) -> Result<RgbaFrame, MediaError> {
            std::thread::sleep(self.delay);
            self.seeks.lock().unwrap().push(seconds);
            if self.fail_at == Some(seconds) {
                return Err(MediaError::Decode {
                    time: seconds,
                    reason: "corrupt".to_string(),
                });
            }
            Ok(RgbaFrame {
                width: size.width * 2,
                height: size.height * 2,
                pixels: vec![90; (size.width * size.height * 16) as usize],
            })
        }
    }

    struct FakeBackend {
        seeks: Arc<Mutex<Vec<f64>>>,
        delay: Duration,
    }

    impl MediaBackend for FakeBackend {
        fn probe(&self, _source: &MediaSource) -> Result<MediaInfo, MediaError> {
            Ok(MediaInfo {
                duration: 10.0,
                width: 320,
                height: 180,
            })
        }

        fn open_decoder(&self, _source: &MediaSource) -> Result<Box<dyn FrameDecoder>, MediaError> {
            Ok(Box::new(RecordingDecoder {
                seeks: Arc::clone(&self.seeks),
                fail_at: None,
                delay: self.delay,
            }))
        }
    }

    fn format(length: usize) -> StripFormat {
        StripFormat {
            length,
            size: FrameSize::new(160, 90),
            quality: 70,
        }
    }

    fn wait_for(strip: &mut FrameStrip, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while strip.thumbnails().len() < count {
            assert!(Instant::now() < deadline, "strip stalled");
            strip.poll();
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_sample_times() {
        let times = sample_times(10.0, 15);
        assert_eq!(times.len(), 15);
        assert_eq!(times[0], 0.0);
        assert_eq!(times[14], 10.0);
        for (i, t) in times.iter().enumerate() {
            assert!((t - i as f64 / 14.0 * 10.0).abs() < 1e-12);
        }
        assert_eq!(sample_times(10.0, 1), vec![0.0]);
        assert!(sample_times(10.0, 0).is_empty());
    }

    #[test]
    fn test_extract_runs_in_order_and_skips_failures() {
        let seeks = Arc::new(Mutex::new(Vec::new()));
        let times = sample_times(10.0, 5);
        let mut decoder = RecordingDecoder {
            seeks: Arc::clone(&seeks),
            fail_at: Some(times[2]),
            delay: Duration::ZERO,
        };

        let mut out = Vec::new();
        extract(&mut decoder, &times, format(5), &AtomicBool::new(false), |t| {
            out.push(t);
            true
        });

        assert_eq!(*seeks.lock().unwrap(), times);
        assert_eq!(out.iter().map(|t| t.index).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert!(out[2].jpeg.is_none());
        let decoded = crate::io::media::decode_thumbnail(out[0].jpeg.as_ref().unwrap()).unwrap();
        assert_eq!((decoded.width, decoded.height), (160, 90));
    }

    #[test]
    fn test_extract_stops_when_cancelled() {
        let seeks = Arc::new(Mutex::new(Vec::new()));
        let mut decoder = RecordingDecoder {
            seeks: Arc::clone(&seeks),
            fail_at: None,
            delay: Duration::ZERO,
        };
        let cancel = AtomicBool::new(false);

        let mut out = Vec::new();
        extract(&mut decoder, &sample_times(10.0, 15), format(15), &cancel, |t| {
            out.push(t);
            if out.len() == 3 {
                cancel.store(true, Ordering::Release);
            }
            true
        });

        assert_eq!(out.len(), 3);
        assert_eq!(seeks.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_strip_fills_progressively() {
        let seeks = Arc::new(Mutex::new(Vec::new()));
        let backend = Arc::new(FakeBackend {
            seeks: Arc::clone(&seeks),
            delay: Duration::ZERO,
        });
        let mut strip = FrameStrip::new(15);
        strip.start(
            ResourceId(1),
            backend,
            MediaSource::from_path(PathBuf::from("clip.mp4")),
            10.0,
            format(15),
        );

        wait_for(&mut strip, 15);
        assert!(strip.is_complete());
        assert!(!strip.is_running());
        for (i, thumb) in strip.thumbnails().iter().enumerate() {
            assert_eq!(thumb.index, i);
            assert!((thumb.timestamp - i as f64 / 14.0 * 10.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_reset_mid_flight_appends_nothing() {
        let seeks = Arc::new(Mutex::new(Vec::new()));
        let backend = Arc::new(FakeBackend {
            seeks: Arc::clone(&seeks),
            delay: Duration::from_millis(20),
        });
        let mut strip = FrameStrip::new(15);
        strip.start(
            ResourceId(1),
            backend,
            MediaSource::from_path(PathBuf::from("clip.mp4")),
            10.0,
            format(15),
        );

        wait_for(&mut strip, 1);
        strip.reset();
        assert!(strip.thumbnails().is_empty());
        assert!(!strip.is_running());

        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(strip.poll(), 0);
        assert!(strip.thumbnails().is_empty());

        // The worker stopped well before finishing the strip.
        let seen = seeks.lock().unwrap().len();
        assert!(seen < 15, "worker kept seeking after cancel ({})", seen);
    }

    #[test]
    fn test_unknown_duration_starts_nothing() {
        let backend = Arc::new(FakeBackend {
            seeks: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
        });
        let mut strip = FrameStrip::new(15);
        strip.start(
            ResourceId(1),
            backend,
            MediaSource::from_path(PathBuf::from("clip.mp4")),
            f64::NAN,
            format(15),
        );
        assert!(!strip.is_running());
        assert_eq!(strip.poll(), 0);
    }
}
