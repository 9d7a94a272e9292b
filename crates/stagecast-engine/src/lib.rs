//! The stream lifecycle controller.
//!
//! One [`StudioEngine`] per open studio: it owns the local media stream,
//! the compositor, the audio graph, the collaborative session, and the
//! room connection, and it is the only component that acquires devices,
//! publishes, or starts fan-out. The engine runs a control loop over the
//! UI command channel; device acquisition and publish run off-loop and
//! report back as epoch-tagged completions, so a stop issued while a
//! start is in flight tears the late result down instead of installing
//! stale state.

mod error;
mod room;
mod studio;

pub use error::EngineError;
pub use room::{can_go_live, RoomLink};
pub use studio::{EngineOptions, StudioEngine, StudioServices};

/// Channel capacity for completions flowing back into the control loop.
pub const COMPLETION_CHANNEL_CAPACITY: usize = 32;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
