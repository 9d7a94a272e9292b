//! The device acquisition flow.

use std::time::Duration;

use tracing::{info, instrument, warn};
use url::Url;

use stagecast_core::DeviceSelection;

use crate::error::AcquireError;
use crate::sink::PreviewSink;
use crate::track::LocalMediaHandle;
use crate::{AcquireResult, MediaBackend};

/// Whether the origin may access capture devices.
///
/// Only https origins and loopback hosts qualify.
pub fn is_secure_origin(origin: &Url) -> bool {
    if origin.scheme() == "https" {
        return true;
    }
    matches!(
        origin.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("[::1]") | Some("::1")
    )
}

/// Acquire the selected devices and attach them to the preview sink.
///
/// The flow is ordered to never leak a device on failure: the secure
/// context is checked before anything is requested, any previously
/// attached tracks are stopped first, and every error after the open
/// stops the fresh tracks before returning. When the selection has no
/// video device the frame wait is skipped; the guard for going live
/// still requires an active video track.
#[instrument(name = "acquire_devices", skip(backend, sink, selection))]
pub fn acquire(
    backend: &dyn MediaBackend,
    sink: &mut PreviewSink,
    origin: &str,
    selection: &DeviceSelection,
    timeout: Duration,
) -> AcquireResult<LocalMediaHandle> {
    let origin_url = Url::parse(origin).map_err(|_| AcquireError::InsecureContext)?;
    if !is_secure_origin(&origin_url) {
        return Err(AcquireError::InsecureContext);
    }

    // Release any devices a previous acquisition still holds.
    sink.stop_attached();

    let opened = backend.open(selection)?;
    let tracks = opened.tracks;
    let has_video = tracks
        .iter()
        .any(|t| t.kind() == stagecast_core::TrackKind::Video);

    sink.attach(tracks.clone(), opened.frames);
    sink.play();

    if has_video {
        let frame = match sink.await_first_frame(timeout) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "No frame before deadline, stopping fresh tracks");
                for track in &tracks {
                    track.stop();
                }
                sink.stop_attached();
                return Err(err);
            }
        };

        if frame.width == 0 || frame.height == 0 {
            warn!("Camera reported zero-dimension video, stopping fresh tracks");
            for track in &tracks {
                track.stop();
            }
            sink.stop_attached();
            return Err(AcquireError::NoFrames);
        }

        info!(
            width = frame.width,
            height = frame.height,
            tracks = tracks.len(),
            "Devices acquired"
        );
    } else {
        info!(tracks = tracks.len(), "Audio-only stream acquired");
    }

    Ok(LocalMediaHandle::new(tracks, opened.device_events))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::synthetic::SyntheticBackend;

    const ORIGIN: &str = "https://studio.example.com";
    const TIMEOUT: Duration = Duration::from_millis(500);

    fn selection() -> DeviceSelection {
        DeviceSelection::camera("synthetic-cam").with_microphone("synthetic-mic")
    }

    #[test]
    fn test_acquire_returns_live_handle() {
        let backend = SyntheticBackend::new();
        let mut sink = PreviewSink::new();

        let handle = acquire(&backend, &mut sink, ORIGIN, &selection(), TIMEOUT).unwrap();

        assert_eq!(handle.video_track_count(), 1);
        assert_eq!(handle.audio_track_count(), 1);
        assert!(sink.is_playing());
        assert!(sink.is_silenced());
    }

    #[test]
    fn test_insecure_origin_fails_before_devices_are_touched() {
        let backend = SyntheticBackend::new();
        let mut sink = PreviewSink::new();

        let err = acquire(
            &backend,
            &mut sink,
            "http://studio.example.com",
            &selection(),
            TIMEOUT,
        )
        .unwrap_err();
        assert!(matches!(err, AcquireError::InsecureContext));
    }

    #[test]
    fn test_loopback_origin_is_secure() {
        let backend = SyntheticBackend::new();
        let mut sink = PreviewSink::new();

        let handle = acquire(
            &backend,
            &mut sink,
            "http://localhost:3000",
            &selection(),
            TIMEOUT,
        )
        .unwrap();
        assert_eq!(handle.video_track_count(), 1);
    }

    #[test]
    fn test_timeout_stops_fresh_tracks() {
        let backend = SyntheticBackend::new();
        backend.set_first_frame_delay(Duration::from_millis(200));
        let mut sink = PreviewSink::new();

        let err = acquire(
            &backend,
            &mut sink,
            ORIGIN,
            &selection(),
            Duration::from_millis(20),
        )
        .unwrap_err();

        assert!(matches!(err, AcquireError::CameraTimeout { .. }));
    }

    #[test]
    fn test_zero_dimension_video_is_rejected() {
        let backend = SyntheticBackend::new();
        backend.set_zero_dimension(true);
        let mut sink = PreviewSink::new();

        let err = acquire(&backend, &mut sink, ORIGIN, &selection(), TIMEOUT).unwrap_err();
        assert!(matches!(err, AcquireError::NoFrames));
    }

    #[test]
    fn test_reacquire_stops_previous_tracks_first() {
        let backend = SyntheticBackend::new();
        let mut sink = PreviewSink::new();

        let first = acquire(&backend, &mut sink, ORIGIN, &selection(), TIMEOUT).unwrap();
        let first_video = first.tracks()[0].clone();
        assert!(first_video.is_active());

        let second = acquire(&backend, &mut sink, ORIGIN, &selection(), TIMEOUT).unwrap();

        assert!(!first_video.is_active());
        assert_eq!(second.video_track_count(), 1);
    }

    #[test]
    fn test_audio_only_selection_skips_frame_wait() {
        let backend = SyntheticBackend::new();
        let mut sink = PreviewSink::new();
        let selection = DeviceSelection {
            microphone: Some("synthetic-mic".to_string()),
            ..Default::default()
        };

        let handle = acquire(&backend, &mut sink, ORIGIN, &selection, TIMEOUT).unwrap();
        assert_eq!(handle.video_track_count(), 0);
        assert_eq!(handle.audio_track_count(), 1);
    }
}
