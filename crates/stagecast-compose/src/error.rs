//! Error types for the composition engine.

use thiserror::Error;

use stagecast_core::{OverlayId, SceneId, SourceId};

/// Errors that can occur during composition operations.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// No scene with this id.
    #[error("Unknown scene: {0}")]
    UnknownScene(SceneId),

    /// No source with this id.
    #[error("Unknown source: {0}")]
    UnknownSource(SourceId),

    /// No overlay with this id.
    #[error("Unknown overlay: {0}")]
    UnknownOverlay(OverlayId),

    /// The scene participates in a running transition and cannot be
    /// mutated until the transition completes.
    #[error("Scene is mid-transition: {0}")]
    SceneInTransition(SceneId),
}
