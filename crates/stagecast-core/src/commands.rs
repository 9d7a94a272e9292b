//! Commands sent from the UI to the engine.

use serde::{Deserialize, Serialize};

use crate::audio::{MidiAction, MidiMessage, PadSpec, StripConfig};
use crate::capability::{Capability, Role};
use crate::compose::{LayoutKind, OverlaySpec, SourceKind, SourcePlacement};
use crate::id::{DestinationId, OverlayId, PadId, ParticipantId, RequestId, SceneId, SourceId};
use crate::media::{DeviceSelection, PublishParams};

/// Commands that the UI can send to the engine.
///
/// Privileged commands carry the acting participant; the engine routes
/// them through the session's capability checks before applying them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StudioCommand {
    /// Acquire the selected devices and start the local preview.
    StartPreview { selection: DeviceSelection },

    /// Publish the previewed stream to a room.
    GoLive { params: PublishParams },

    /// Disconnect the room, stop fan-out, and tear down the preview.
    StopLive,

    /// Stop every local track and return to idle.
    StopPreview,

    /// Create an empty scene.
    CreateScene { name: String, layout: LayoutKind },

    /// Register a new source with the session.
    AddSource { kind: SourceKind, label: String },

    /// Remove a source from the session and every scene.
    DropSource { source: SourceId },

    /// Place or reposition a source within a scene.
    ///
    /// Without an explicit placement the source takes the next preset
    /// slot of the scene's layout.
    PlaceSource {
        scene: SceneId,
        source: SourceId,
        placement: Option<SourcePlacement>,
    },

    /// Remove a source from one scene.
    UnplaceSource { scene: SceneId, source: SourceId },

    /// Move the preview cursor; never affects visible output.
    PreviewScene { scene: SceneId },

    /// Move the program cursor with the configured transition.
    SwitchScene { actor: ParticipantId, scene: SceneId },

    /// Register an overlay.
    CreateOverlay { spec: OverlaySpec },

    /// Animate an overlay in.
    ShowOverlay { overlay: OverlayId },

    /// Animate an overlay out.
    HideOverlay { overlay: OverlayId },

    /// Replace an overlay's definition.
    UpdateOverlay { overlay: OverlayId, spec: OverlaySpec },

    /// Set a strip fader (linear gain).
    SetFader {
        actor: ParticipantId,
        source: SourceId,
        gain: f32,
    },

    /// Mute or unmute a strip.
    SetMuted {
        actor: ParticipantId,
        source: SourceId,
        muted: bool,
    },

    /// Replace a strip's processing configuration.
    SetStripConfig {
        actor: ParticipantId,
        source: SourceId,
        config: StripConfig,
    },

    /// Register a soundboard pad.
    AddPad { spec: PadSpec },

    /// Start pad playback.
    TriggerPad { pad: PadId },

    /// Stop pad playback early.
    StopPad { pad: PadId },

    /// Dispatch a physical MIDI message through the mapping table.
    Midi { message: MidiMessage },

    /// Arm learn mode: the next MIDI message binds to `action`.
    LearnMidi { action: MidiAction },

    /// Add a participant to the session.
    Join { identity: String, role: Role },

    /// Remove a participant at their own request.
    Leave { participant: ParticipantId },

    /// Remove a participant by force.
    Kick {
        actor: ParticipantId,
        participant: ParticipantId,
    },

    /// Ask for a capability currently held by someone else.
    RequestControl {
        participant: ParticipantId,
        capability: Capability,
    },

    /// Grant or deny a pending control request.
    ResolveRequest {
        resolver: ParticipantId,
        request: RequestId,
        granted: bool,
    },

    /// Append a cue to the session log and broadcast it.
    SendCue { from: ParticipantId, text: String },

    /// Enable or disable a destination for fan-out.
    SetDestinationEnabled {
        actor: ParticipantId,
        destination: DestinationId,
        enabled: bool,
    },

    /// Start egress jobs for every enabled destination.
    StartFanout,

    /// Stop every egress job for the session.
    StopFanout,

    /// Request current engine state.
    GetState,

    /// Shut the engine down completely.
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_round_trip_as_json() {
        let command = StudioCommand::SwitchScene {
            actor: ParticipantId::from("p-host"),
            scene: SceneId::from("scene-main"),
        };
        let json = serde_json::to_string(&command).unwrap();
        let back: StudioCommand = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            back,
            StudioCommand::SwitchScene { actor, scene }
                if actor.as_str() == "p-host" && scene.as_str() == "scene-main"
        ));
    }

    #[test]
    fn test_selection_fields_survive_the_wire() {
        let command = StudioCommand::StartPreview {
            selection: DeviceSelection::camera("cam-0").with_microphone("mic-0"),
        };
        let json = serde_json::to_string(&command).unwrap();
        let StudioCommand::StartPreview { selection } = serde_json::from_str(&json).unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(selection.video_device.as_deref(), Some("cam-0"));
        assert_eq!(selection.microphone.as_deref(), Some("mic-0"));
    }
}
