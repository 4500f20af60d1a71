// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background decoding of the frame under the playhead.
//!
//! The worker owns its own decoder. Requests are latest-wins: queued
//! requests are drained and only the newest timestamp is decoded, so a
//! slow decoder skips frames during playback instead of falling behind.
//! Every decoded request is answered, with `frame: None` when the frame
//! could not be produced.

use super::media::{FrameSize, MediaBackend, MediaSource, RgbaFrame};
use crate::models::session::ResourceId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// The answer to a preview request and the resource it belongs to.
#[derive(Debug)]
pub struct PreviewFrame {
    pub resource: ResourceId,
    pub time: f64,
    /// `None` when decoding failed.
    pub frame: Option<RgbaFrame>,
}

pub struct PreviewFeed {
    resource: ResourceId,
    requests: Sender<f64>,
    frames: Receiver<PreviewFrame>,
    cancel: Arc<AtomicBool>,
}

impl PreviewFeed {
    pub fn spawn(
        resource: ResourceId,
        backend: Arc<dyn MediaBackend>,
        source: MediaSource,
        size: FrameSize,
    ) -> Self {
        let (request_tx, request_rx) = channel::<f64>();
        let (frame_tx, frame_rx) = channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = Arc::clone(&cancel);

        std::thread::spawn(move || {
            let mut decoder = match backend.open_decoder(&source) {
                Ok(decoder) => Some(decoder),
                Err(e) => {
                    log::error!("Preview decoder for {} failed: {}", source.name, e);
                    None
                }
            };

            while let Ok(mut time) = request_rx.recv() {
                while let Ok(newer) = request_rx.try_recv() {
                    time = newer;
                }
                if worker_cancel.load(Ordering::Acquire) {
                    break;
                }

                let frame = match decoder.as_mut().map(|d| d.decode_at(time, size)) {
                    Some(Ok(frame)) => Some(frame),
                    Some(Err(e)) => {
                        log::warn!("Preview frame at {:.3}s unavailable: {}", time, e);
                        None
                    }
                    None => None,
                };
                let sent = frame_tx.send(PreviewFrame {
                    resource,
                    time,
                    frame,
                });
                if sent.is_err() {
                    break;
                }
            }
            log::debug!("Preview worker for resource {} stopped", resource.0);
        });

        Self {
            resource,
            requests: request_tx,
            frames: frame_rx,
            cancel,
        }
    }

    /// Ask for the frame at `time`; supersedes any request not yet started.
    pub fn request(&self, time: f64) {
        let _ = self.requests.send(time);
    }

    /// The newest answer received since the last poll.
    pub fn poll(&self) -> Option<PreviewFrame> {
        self.frames
            .try_iter()
            .filter(|f| f.resource == self.resource)
            .last()
    }
}

impl Drop for PreviewFeed {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::{FrameDecoder, MediaInfo};
    use crate::error::MediaError;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    struct GreyBackend;

    struct GreyDecoder;

    impl MediaBackend for GreyBackend {
        fn probe(&self, _source: &MediaSource) -> Result<MediaInfo, MediaError> {
            Ok(MediaInfo { duration: 4.0, width: 64, height: 36 })
        }

        fn open_decoder(&self, _source: &MediaSource) -> Result<Box<dyn FrameDecoder>, MediaError> {
            Ok(Box::new(GreyDecoder))
        }
    }

    impl FrameDecoder for GreyDecoder {
        fn decode_at(&mut self, seconds: f64, size: FrameSize) -> Result<RgbaFrame, MediaError> {
            let level = (seconds * 50.0) as u8;
            Ok(RgbaFrame {
                width: size.width,
                height: size.height,
                pixels: [level, level, level, 255].repeat((size.width * size.height) as usize),
            })
        }
    }

    #[test]
    fn test_preview_delivers_requested_frame() {
        let feed = PreviewFeed::spawn(
            ResourceId(7),
            Arc::new(GreyBackend),
            MediaSource::from_path(PathBuf::from("clip.mp4")),
            FrameSize::new(8, 4),
        );
        feed.request(2.0);

        let deadline = Instant::now() + Duration::from_secs(5);
        let frame = loop {
            if let Some(frame) = feed.poll() {
                break frame;
            }
            assert!(Instant::now() < deadline, "preview frame never arrived");
            std::thread::sleep(Duration::from_millis(5));
        };

        assert_eq!(frame.resource, ResourceId(7));
        assert_eq!(frame.time, 2.0);
        let frame = frame.frame.unwrap();
        assert_eq!((frame.width, frame.height), (8, 4));
        assert_eq!(frame.pixels[0], 100);
    }

    struct BrokenBackend {
        open_fails: bool,
    }

    struct BrokenDecoder;

    impl MediaBackend for BrokenBackend {
        fn probe(&self, _source: &MediaSource) -> Result<MediaInfo, MediaError> {
            Ok(MediaInfo { duration: 4.0, width: 64, height: 36 })
        }

        fn open_decoder(&self, _source: &MediaSource) -> Result<Box<dyn FrameDecoder>, MediaError> {
            if self.open_fails {
                return Err(MediaError::Probe("cannot open".to_string()));
            }
            Ok(Box::new(BrokenDecoder))
        }
    }

    impl FrameDecoder for BrokenDecoder {
        fn decode_at(&mut self, seconds: f64, _size: FrameSize) -> Result<RgbaFrame, MediaError> {
            Err(MediaError::Decode {
                time: seconds,
                reason: "corrupt".to_string(),
            })
        }
    }

    #[test]
    fn test_failed_requests_are_still_answered() {
        for open_fails in [false, true] {
            let feed = PreviewFeed::spawn(
                ResourceId(3),
                Arc::new(BrokenBackend { open_fails }),
                MediaSource::from_path(PathBuf::from("clip.mp4")),
                FrameSize::new(8, 4),
            );
            feed.request(1.5);

            let deadline = Instant::now() + Duration::from_secs(5);
            let answer = loop {
                if let Some(answer) = feed.poll() {
                    break answer;
                }
                assert!(Instant::now() < deadline, "request never answered");
                std::thread::sleep(Duration::from_millis(5));
            };

            assert_eq!(answer.resource, ResourceId(3));
            assert_eq!(answer.time, 1.5);
            assert!(answer.frame.is_none());
        }
    }
}
