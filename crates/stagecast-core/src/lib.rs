//! Typed UI<->Engine messages and the shared studio data model.
//!
//! This crate defines the ids, lifecycle states, capability tables,
//! wire types, and persistence contracts used by every other studio
//! crate, plus the bounded channels the UI talks to the engine over.

mod audio;
mod capability;
mod commands;
mod compose;
mod config;
mod destination;
mod events;
mod id;
mod media;
mod session;
mod state;
mod store;

pub use audio::{
    CompressorSettings, EqBand, EqBandKind, GateSettings, MidiAction, MidiKind, MidiMessage,
    PadMode, PadSpec, StripConfig, StripMeter,
};
pub use capability::{Capability, CapabilitySet, Role};
pub use commands::StudioCommand;
pub use compose::{
    LayoutKind, OverlayAnchor, OverlayAnimation, OverlayKind, OverlaySpec, SourceKind,
    SourcePlacement, TransitionKind,
};
pub use config::StagecastConfig;
pub use destination::{Destination, FanoutFailure, FanoutReport};
pub use events::StudioEvent;
pub use id::{
    generate_id, ChannelId, DestinationId, EgressId, OverlayId, PadId, ParticipantId, RequestId,
    RoomName, SceneId, SessionId, SourceId, TrackId,
};
pub use media::{DeviceSelection, PublishParams, TrackKind};
pub use session::{CueMessage, ParticipantInfo};
pub use state::LifecycleState;
pub use store::{
    ChannelProfile, DestinationStore, InMemoryDestinationStore, InMemoryProfileStore, ProfileStore,
};

use crossbeam_channel::{Receiver, Sender};

/// Channel capacity for commands (UI → Engine).
pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Channel capacity for events (Engine → UI).
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Creates a bounded command channel.
pub fn command_channel() -> (Sender<StudioCommand>, Receiver<StudioCommand>) {
    crossbeam_channel::bounded(COMMAND_CHANNEL_CAPACITY)
}

/// Creates a bounded event channel.
pub fn event_channel() -> (Sender<StudioEvent>, Receiver<StudioEvent>) {
    crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY)
}
