//! Events sent from the engine to the UI.

use serde::{Deserialize, Serialize};

use crate::audio::{MidiAction, MidiMessage, StripMeter};
use crate::capability::Capability;
use crate::compose::{SourceKind, TransitionKind};
use crate::destination::FanoutReport;
use crate::id::{OverlayId, PadId, ParticipantId, RequestId, SceneId, SourceId};
use crate::session::{CueMessage, ParticipantInfo};
use crate::state::LifecycleState;

/// Events that the engine can send to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StudioEvent {
    /// Engine is ready; the local host participant is installed.
    Ready { host: ParticipantInfo },

    /// Lifecycle state has changed.
    StateChanged {
        /// Previous state.
        previous: Box<LifecycleState>,

        /// Current state.
        current: Box<LifecycleState>,
    },

    /// A failure surfaced to the operator.
    Error {
        /// Whether the session can continue.
        recoverable: bool,

        /// Failure description.
        message: String,
    },

    /// A scene was created.
    SceneCreated { scene: SceneId, name: String },

    /// A source was registered with the session.
    SourceAdded {
        source: SourceId,
        kind: SourceKind,
        label: String,
    },

    /// A source was removed from the session.
    SourceDropped { source: SourceId },

    /// The program cursor moved.
    ProgramChanged {
        scene: SceneId,
        transition: TransitionKind,
    },

    /// The preview cursor moved.
    PreviewChanged { scene: SceneId },

    /// An overlay was registered.
    OverlayCreated { overlay: OverlayId },

    /// A soundboard pad was registered.
    PadAdded { pad: PadId, label: String },

    /// Per-strip level snapshot for VU meters.
    Meters { strips: Vec<StripMeter> },

    /// Learn mode bound a message to an action.
    MidiBound {
        message: MidiMessage,
        action: MidiAction,
    },

    /// A cue was appended to the session log.
    CueAppended { cue: CueMessage },

    /// A participant joined.
    ParticipantJoined { participant: ParticipantInfo },

    /// A participant left or was kicked.
    ParticipantLeft { participant: ParticipantId },

    /// A control request is pending.
    ControlRequested {
        request: RequestId,
        participant: ParticipantId,
        capability: Capability,
    },

    /// A control request was granted or denied.
    ControlResolved {
        request: RequestId,
        granted: bool,

        /// Owner of the capability after resolution.
        holder: Option<ParticipantId>,
    },

    /// A control request expired unresolved.
    ControlExpired { request: RequestId },

    /// Fan-out start finished; per-destination results inside.
    FanoutStarted { report: FanoutReport },

    /// Every egress job for the session was stopped.
    FanoutStopped,

    /// Engine has shut down.
    Shutdown,
}
