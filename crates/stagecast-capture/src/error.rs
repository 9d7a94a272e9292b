//! Error types for device acquisition.

use thiserror::Error;

/// Errors that can occur while acquiring local devices.
///
/// Every variant is terminal for the current acquisition attempt.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The configured origin is neither https nor loopback.
    #[error("Media capture requires a secure context (https or loopback)")]
    InsecureContext,

    /// The user or platform denied device access.
    #[error("Permission denied for device access: {0}")]
    PermissionDenied(String),

    /// The selected device does not exist.
    #[error("Capture source not found: {0}")]
    SourceNotFound(String),

    /// No decodable frame arrived before the acquisition deadline.
    #[error("Camera produced no frame within {waited_ms}ms")]
    CameraTimeout {
        /// How long the sink waited.
        waited_ms: u64,
    },

    /// The camera reported frames with zero dimensions.
    #[error("Camera reported zero-dimension video")]
    NoFrames,

    /// Backend failure outside the known taxonomy.
    #[error("Capture backend error: {0}")]
    Backend(String),
}
