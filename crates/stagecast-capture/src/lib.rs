//! Device acquisition for the studio.
//!
//! This crate turns a device selection into a validated local media
//! stream: it checks the secure-context precondition, opens devices
//! through a [`MediaBackend`], attaches them to the preview sink, and
//! waits on the frame clock for a decodable frame before handing the
//! stream to the lifecycle controller.

mod acquire;
mod error;
mod frame;
mod sink;
mod synthetic;
mod track;

pub use acquire::{acquire, is_secure_origin};
pub use error::AcquireError;
pub use frame::VideoFrame;
pub use sink::PreviewSink;
pub use synthetic::SyntheticBackend;
pub use track::{DeviceEvent, LocalMediaHandle, MediaTrack};

use crossbeam_channel::Receiver;

use stagecast_core::DeviceSelection;

/// Channel capacity for frames delivered to the sink.
pub const FRAME_CHANNEL_CAPACITY: usize = 3;

/// Channel capacity for device-side notifications.
pub const DEVICE_EVENT_CHANNEL_CAPACITY: usize = 8;

/// Result type for acquisition operations.
pub type AcquireResult<T> = Result<T, AcquireError>;

/// A freshly opened stream before it is attached to the sink.
#[derive(Debug)]
pub struct OpenStream {
    /// Tracks delivered by the backend.
    pub tracks: Vec<MediaTrack>,

    /// Frame delivery from the capture device clock.
    pub frames: Receiver<VideoFrame>,

    /// Device-side notifications (track ended, device lost).
    pub device_events: Receiver<DeviceEvent>,
}

/// Trait for device backends.
pub trait MediaBackend: Send + Sync {
    /// Open the selected devices.
    ///
    /// Resolution and frame rate in the selection are targets; the
    /// backend delivers the closest mode the devices support.
    fn open(&self, selection: &DeviceSelection) -> AcquireResult<OpenStream>;
}
