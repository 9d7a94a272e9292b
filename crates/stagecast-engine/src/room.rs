//! The room connection and the go-live guard.

use stagecast_capture::LocalMediaHandle;
use stagecast_core::{LifecycleState, RoomName};
use stagecast_transport::RoomHandle;

/// The controller's connection to the published room.
///
/// A tagged union instead of a nullable handle: teardown can only
/// disconnect a handle that actually exists, and a publish that is
/// still in flight is distinguishable from no publish at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoomLink {
    /// No room, no publish in flight.
    #[default]
    Disconnected,

    /// A publish was requested and has not completed yet.
    Connecting,

    /// The room is published.
    Live(RoomHandle),
}

impl RoomLink {
    /// Whether the room is published.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }

    /// The live handle, if the room is published.
    pub fn handle(&self) -> Option<&RoomHandle> {
        match self {
            Self::Live(handle) => Some(handle),
            _ => None,
        }
    }

    /// The published room's name, if any.
    pub fn room(&self) -> Option<&RoomName> {
        self.handle().map(|h| &h.room)
    }
}

/// Whether the controller may go live right now.
///
/// True only while previewing with at least one active video track.
/// UI queries and the `go_live` precondition share this one function.
pub fn can_go_live(state: &LifecycleState, stream: Option<&LocalMediaHandle>) -> bool {
    state.is_previewing() && stream.is_some_and(|s| s.video_track_count() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use stagecast_capture::MediaTrack;
    use stagecast_core::TrackKind;

    fn handle_with(tracks: Vec<MediaTrack>) -> LocalMediaHandle {
        let (_tx, rx) = crossbeam_channel::bounded(1);
        LocalMediaHandle::new(tracks, rx)
    }

    #[test]
    fn test_can_go_live_requires_previewing() {
        let stream = handle_with(vec![MediaTrack::new(TrackKind::Video, "cam")]);

        assert!(can_go_live(&LifecycleState::Previewing, Some(&stream)));
        assert!(!can_go_live(&LifecycleState::Idle, Some(&stream)));
        assert!(!can_go_live(&LifecycleState::Connecting, Some(&stream)));
        assert!(!can_go_live(&LifecycleState::Live, Some(&stream)));
        assert!(!can_go_live(
            &LifecycleState::Error {
                message: "camera lost".into()
            },
            Some(&stream)
        ));
    }

    #[test]
    fn test_can_go_live_requires_an_active_video_track() {
        assert!(!can_go_live(&LifecycleState::Previewing, None));

        let audio_only = handle_with(vec![MediaTrack::new(TrackKind::Audio, "mic")]);
        assert!(!can_go_live(&LifecycleState::Previewing, Some(&audio_only)));

        let video = MediaTrack::new(TrackKind::Video, "cam");
        let stream = handle_with(vec![video.clone()]);
        assert!(can_go_live(&LifecycleState::Previewing, Some(&stream)));

        // a stopped video track no longer qualifies
        video.stop();
        assert!(!can_go_live(&LifecycleState::Previewing, Some(&stream)));
    }

    #[test]
    fn test_room_link_accessors() {
        assert!(!RoomLink::Disconnected.is_live());
        assert!(RoomLink::Connecting.room().is_none());

        let handle = RoomHandle {
            id: "conn-1".into(),
            room: RoomName::from("studio-1"),
            identity: "host".into(),
        };
        let link = RoomLink::Live(handle.clone());
        assert!(link.is_live());
        assert_eq!(link.handle(), Some(&handle));
        assert_eq!(link.room(), Some(&RoomName::from("studio-1")));
    }
}
