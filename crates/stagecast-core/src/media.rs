//! Device selection and publish parameter types.

use serde::{Deserialize, Serialize};

use crate::id::RoomName;

/// Kind of media track inside a local stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    /// Video track (camera, screen).
    Video,

    /// Audio track (microphone, capture audio).
    Audio,
}

/// Devices requested for a preview.
///
/// Resolution and frame rate are targets, not exact demands; the
/// backend may deliver the closest mode the device supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSelection {
    /// Camera or screen device identifier (None for audio-only).
    pub video_device: Option<String>,

    /// Explicit microphone device identifier (None for no mic).
    pub microphone: Option<String>,

    /// Target capture width in pixels.
    pub target_width: u32,

    /// Target capture height in pixels.
    pub target_height: u32,

    /// Target capture frame rate.
    pub target_fps: u32,
}

impl Default for DeviceSelection {
    fn default() -> Self {
        Self {
            video_device: None,
            microphone: None,
            target_width: 1280,
            target_height: 720,
            target_fps: 30,
        }
    }
}

impl DeviceSelection {
    /// Selection for a named camera with the default targets.
    pub fn camera(device: impl Into<String>) -> Self {
        Self {
            video_device: Some(device.into()),
            ..Default::default()
        }
    }

    /// Add an explicit microphone to the selection.
    pub fn with_microphone(mut self, device: impl Into<String>) -> Self {
        self.microphone = Some(device.into());
        self
    }
}

/// Parameters for publishing the local stream to a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishParams {
    /// Room to publish into.
    pub room: RoomName,

    /// Publisher identity presented to the transport service.
    pub identity: String,
}

impl PublishParams {
    /// Publish parameters for a fresh room.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            room: RoomName::new(),
            identity: identity.into(),
        }
    }
}
