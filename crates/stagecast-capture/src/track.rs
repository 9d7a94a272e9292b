//! Media tracks and the handle that owns an acquired stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use tracing::debug;

use stagecast_core::{TrackId, TrackKind};

/// A device-side notification about an acquired stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A track ended outside the controller's teardown paths
    /// (device unplugged, OS revoked access).
    TrackEnded {
        /// The track that ended.
        track: TrackId,
    },
}

/// One media track inside an acquired stream.
///
/// Clones share the active flag, so the backend can observe a stop
/// and the controller can observe a device-side end.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    id: TrackId,
    kind: TrackKind,
    label: String,
    active: Arc<AtomicBool>,
}

impl MediaTrack {
    /// Create an active track.
    pub fn new(kind: TrackKind, label: impl Into<String>) -> Self {
        Self {
            id: TrackId::new(),
            kind,
            label: label.into(),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Track identifier.
    pub fn id(&self) -> &TrackId {
        &self.id
    }

    /// Track kind.
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// Device label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the track is still delivering media.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop the track. Idempotent; stopping a stopped track is a no-op.
    pub fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            debug!(track = %self.id, label = %self.label, "Track stopped");
        }
    }
}

/// Exclusive handle over an acquired local stream.
///
/// Owned by the lifecycle controller; only its teardown paths stop
/// tracks. Other components may count tracks but never stop them.
#[derive(Debug)]
pub struct LocalMediaHandle {
    tracks: Vec<MediaTrack>,
    device_events: Receiver<DeviceEvent>,
}

impl LocalMediaHandle {
    /// Create a handle over the opened tracks.
    pub fn new(tracks: Vec<MediaTrack>, device_events: Receiver<DeviceEvent>) -> Self {
        Self {
            tracks,
            device_events,
        }
    }

    /// All tracks in the stream, active or not.
    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    /// Number of active video tracks.
    pub fn video_track_count(&self) -> usize {
        self.tracks
            .iter()
            .filter(|t| t.kind() == TrackKind::Video && t.is_active())
            .count()
    }

    /// Number of active audio tracks.
    pub fn audio_track_count(&self) -> usize {
        self.tracks
            .iter()
            .filter(|t| t.kind() == TrackKind::Audio && t.is_active())
            .count()
    }

    /// Number of active tracks of any kind.
    pub fn active_track_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_active()).count()
    }

    /// Stop every track. Idempotent.
    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    /// Drain pending device-side notifications without blocking.
    pub fn poll_device_events(&self) -> Vec<DeviceEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.device_events.try_recv() {
            events.push(event);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle_with(tracks: Vec<MediaTrack>) -> LocalMediaHandle {
        let (_tx, rx) = crossbeam_channel::bounded(1);
        LocalMediaHandle::new(tracks, rx)
    }

    #[test]
    fn test_track_stop_is_idempotent() {
        let track = MediaTrack::new(TrackKind::Video, "cam");
        assert!(track.is_active());

        track.stop();
        track.stop();
        assert!(!track.is_active());
    }

    #[test]
    fn test_clones_share_the_active_flag() {
        let track = MediaTrack::new(TrackKind::Audio, "mic");
        let clone = track.clone();

        clone.stop();
        assert!(!track.is_active());
    }

    #[test]
    fn test_track_counts_follow_stops() {
        let video = MediaTrack::new(TrackKind::Video, "cam");
        let audio = MediaTrack::new(TrackKind::Audio, "mic");
        let handle = handle_with(vec![video.clone(), audio]);

        assert_eq!(handle.video_track_count(), 1);
        assert_eq!(handle.audio_track_count(), 1);

        video.stop();
        assert_eq!(handle.video_track_count(), 0);
        assert_eq!(handle.audio_track_count(), 1);

        handle.stop_all();
        assert_eq!(handle.active_track_count(), 0);
    }
}
