//! Deterministic synthetic backend for development and tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use crossbeam_channel::{Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, trace};

use stagecast_core::{DeviceSelection, TrackId, TrackKind};

use crate::error::AcquireError;
use crate::frame::VideoFrame;
use crate::track::{DeviceEvent, MediaTrack};
use crate::{
    AcquireResult, MediaBackend, OpenStream, DEVICE_EVENT_CHANNEL_CAPACITY,
    FRAME_CHANNEL_CAPACITY,
};

/// A backend that synthesizes frames on a device-paced clock.
///
/// Failure injection setters let tests exercise every acquisition
/// error path without real hardware.
pub struct SyntheticBackend {
    cameras: Vec<String>,
    microphones: Vec<String>,
    native_width: u32,
    native_height: u32,
    deny_permission: AtomicBool,
    zero_dimension: AtomicBool,
    first_frame_delay: Mutex<Duration>,
    opened: Mutex<Vec<MediaTrack>>,
    event_tx: Mutex<Option<Sender<DeviceEvent>>>,
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self {
            cameras: vec!["synthetic-cam".to_string()],
            microphones: vec!["synthetic-mic".to_string()],
            native_width: 640,
            native_height: 360,
            deny_permission: AtomicBool::new(false),
            zero_dimension: AtomicBool::new(false),
            first_frame_delay: Mutex::new(Duration::ZERO),
            opened: Mutex::new(Vec::new()),
            event_tx: Mutex::new(None),
        }
    }
}

impl SyntheticBackend {
    /// Backend with one camera and one microphone.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the available camera list.
    pub fn with_cameras(mut self, cameras: Vec<String>) -> Self {
        self.cameras = cameras;
        self
    }

    /// Replace the native capture mode.
    pub fn with_native_size(mut self, width: u32, height: u32) -> Self {
        self.native_width = width;
        self.native_height = height;
        self
    }

    /// Make the next open fail with `PermissionDenied`.
    pub fn set_deny_permission(&self, deny: bool) {
        self.deny_permission.store(deny, Ordering::SeqCst);
    }

    /// Make opened cameras report zero-dimension frames.
    pub fn set_zero_dimension(&self, zero: bool) {
        self.zero_dimension.store(zero, Ordering::SeqCst);
    }

    /// Delay the first frame of the next open.
    pub fn set_first_frame_delay(&self, delay: Duration) {
        *self.first_frame_delay.lock() = delay;
    }

    /// Tracks handed out by the most recent open.
    pub fn open_tracks(&self) -> Vec<MediaTrack> {
        self.opened.lock().clone()
    }

    /// How many opened tracks are still delivering media.
    pub fn active_track_count(&self) -> usize {
        self.opened.lock().iter().filter(|t| t.is_active()).count()
    }

    /// End a track from the device side, as if it was unplugged.
    pub fn end_track(&self, track: &TrackId) {
        let opened = self.opened.lock();
        if let Some(t) = opened.iter().find(|t| t.id() == track) {
            t.stop();
            if let Some(tx) = self.event_tx.lock().as_ref() {
                let _ = tx.try_send(DeviceEvent::TrackEnded {
                    track: track.clone(),
                });
            }
            debug!(track = %track, "Synthetic device ended track");
        }
    }
}

impl MediaBackend for SyntheticBackend {
    fn open(&self, selection: &DeviceSelection) -> AcquireResult<OpenStream> {
        if self.deny_permission.load(Ordering::SeqCst) {
            return Err(AcquireError::PermissionDenied(
                "denied by operator".to_string(),
            ));
        }
        if selection.video_device.is_none() && selection.microphone.is_none() {
            return Err(AcquireError::Backend("empty device selection".to_string()));
        }

        let mut tracks = Vec::new();

        if let Some(ref camera) = selection.video_device {
            if !self.cameras.contains(camera) {
                return Err(AcquireError::SourceNotFound(camera.clone()));
            }
            tracks.push(MediaTrack::new(TrackKind::Video, camera.clone()));
        }
        if let Some(ref microphone) = selection.microphone {
            if !self.microphones.contains(microphone) {
                return Err(AcquireError::SourceNotFound(microphone.clone()));
            }
            tracks.push(MediaTrack::new(TrackKind::Audio, microphone.clone()));
        }

        let (frame_tx, frame_rx) = crossbeam_channel::bounded(FRAME_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = crossbeam_channel::bounded(DEVICE_EVENT_CHANNEL_CAPACITY);

        *self.opened.lock() = tracks.clone();
        *self.event_tx.lock() = Some(event_tx);

        if let Some(video) = tracks.iter().find(|t| t.kind() == TrackKind::Video) {
            // Targets are ideals: deliver the closest supported mode.
            let (width, height) = if self.zero_dimension.load(Ordering::SeqCst) {
                (0, 0)
            } else {
                (
                    selection.target_width.min(self.native_width),
                    selection.target_height.min(self.native_height),
                )
            };
            let fps = selection.target_fps.clamp(1, 60);
            let delay = *self.first_frame_delay.lock();
            let track = video.clone();

            thread::spawn(move || {
                frame_producer(track, width, height, fps, delay, frame_tx);
            });
        }

        Ok(OpenStream {
            tracks,
            frames: frame_rx,
            device_events: event_rx,
        })
    }
}

/// Emits frames on the device clock until the track stops.
fn frame_producer(
    track: MediaTrack,
    width: u32,
    height: u32,
    fps: u32,
    first_frame_delay: Duration,
    frame_tx: Sender<VideoFrame>,
) {
    if !first_frame_delay.is_zero() {
        thread::sleep(first_frame_delay);
    }

    let interval = Duration::from_millis(1000 / u64::from(fps));
    let payload = Bytes::from(vec![0x80; VideoFrame::nv12_buffer_size(width, height)]);
    let mut sequence = 0u64;

    while track.is_active() {
        let frame = VideoFrame {
            data: payload.clone(),
            width,
            height,
            sequence,
        };
        match frame_tx.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                trace!("Frame channel full, dropping frame");
            }
            Err(TrySendError::Disconnected(_)) => break,
        }
        sequence += 1;
        thread::sleep(interval);
    }
}
