//! Local preview sink.
//!
//! Stands in for the monitor surface a stream is attached to: it holds
//! the attached tracks, playback flags, and the frame clock used to
//! wait for the first decodable frame.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::debug;

use crate::error::AcquireError;
use crate::frame::VideoFrame;
use crate::track::MediaTrack;
use crate::AcquireResult;

struct AttachedStream {
    tracks: Vec<MediaTrack>,
    frames: Receiver<VideoFrame>,
}

/// The sink an acquired stream is attached to for local monitoring.
#[derive(Default)]
pub struct PreviewSink {
    attached: Option<AttachedStream>,
    silenced: bool,
    inline: bool,
    playing: bool,
}

impl PreviewSink {
    /// Create a detached sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop every track of the previously attached stream and detach it.
    ///
    /// Called before requesting new devices so a half-open stream never
    /// keeps a device locked. No-op when nothing is attached.
    pub fn stop_attached(&mut self) {
        if let Some(stream) = self.attached.take() {
            debug!(tracks = stream.tracks.len(), "Stopping previously attached tracks");
            for track in &stream.tracks {
                track.stop();
            }
        }
        self.playing = false;
    }

    /// Attach a freshly opened stream.
    ///
    /// Playback flags are forced to silenced inline output so starting
    /// the sink never depends on platform autoplay policy; playback
    /// still has to be started explicitly via [`PreviewSink::play`].
    pub fn attach(&mut self, tracks: Vec<MediaTrack>, frames: Receiver<VideoFrame>) {
        self.attached = Some(AttachedStream { tracks, frames });
        self.silenced = true;
        self.inline = true;
        self.playing = false;
    }

    /// Start playback.
    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Whether playback has been started.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether local output is silenced.
    pub fn is_silenced(&self) -> bool {
        self.silenced
    }

    /// Whether playback is inline.
    pub fn is_inline(&self) -> bool {
        self.inline
    }

    /// Wait on the frame clock until the first frame arrives.
    ///
    /// Blocks on frame delivery rather than polling a timer, bounded by
    /// `timeout`. The caller decides whether the frame is acceptable.
    pub fn await_first_frame(&mut self, timeout: Duration) -> AcquireResult<VideoFrame> {
        let stream = self
            .attached
            .as_ref()
            .ok_or_else(|| AcquireError::Backend("no stream attached to sink".into()))?;
        if !self.playing {
            return Err(AcquireError::Backend("sink playback not started".into()));
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(AcquireError::CameraTimeout {
                    waited_ms: timeout.as_millis() as u64,
                });
            }

            match stream.frames.recv_timeout(remaining) {
                Ok(frame) => return Ok(frame),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(AcquireError::CameraTimeout {
                        waited_ms: timeout.as_millis() as u64,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(AcquireError::Backend("frame source disconnected".into()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bytes::Bytes;
    use stagecast_core::TrackKind;

    fn frame(width: u32, height: u32) -> VideoFrame {
        VideoFrame {
            data: Bytes::from(vec![0x80; VideoFrame::nv12_buffer_size(width, height)]),
            width,
            height,
            sequence: 0,
        }
    }

    #[test]
    fn test_attach_forces_playback_flags() {
        let (_tx, rx) = crossbeam_channel::bounded(1);
        let mut sink = PreviewSink::new();
        sink.attach(vec![MediaTrack::new(TrackKind::Video, "cam")], rx);

        assert!(sink.is_silenced());
        assert!(sink.is_inline());
        assert!(!sink.is_playing());

        sink.play();
        assert!(sink.is_playing());
    }

    #[test]
    fn test_await_first_frame_returns_delivered_frame() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut sink = PreviewSink::new();
        sink.attach(vec![MediaTrack::new(TrackKind::Video, "cam")], rx);
        sink.play();

        tx.send(frame(64, 48)).unwrap();
        let got = sink.await_first_frame(Duration::from_millis(100)).unwrap();
        assert_eq!((got.width, got.height), (64, 48));
    }

    #[test]
    fn test_await_first_frame_times_out() {
        let (_tx, rx) = crossbeam_channel::bounded::<VideoFrame>(1);
        let mut sink = PreviewSink::new();
        sink.attach(vec![MediaTrack::new(TrackKind::Video, "cam")], rx);
        sink.play();

        let err = sink.await_first_frame(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, AcquireError::CameraTimeout { .. }));
    }

    #[test]
    fn test_stop_attached_stops_old_tracks() {
        let (_tx, rx) = crossbeam_channel::bounded::<VideoFrame>(1);
        let old = MediaTrack::new(TrackKind::Video, "old-cam");
        let mut sink = PreviewSink::new();
        sink.attach(vec![old.clone()], rx);
        sink.play();

        sink.stop_attached();
        assert!(!old.is_active());
        assert!(!sink.is_playing());
    }
}
