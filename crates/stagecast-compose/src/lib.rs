//! Composition engine for the studio.
//!
//! Maintains the session's scenes and overlays, the preview/program
//! cursors, and renders one program frame per tick, blending two
//! composites while a transition runs.

mod compositor;
mod error;
mod overlay;
mod program;
mod scene;
mod transition;

pub use compositor::{Compositor, SourceInfo, SwitchOutcome};
pub use error::ComposeError;
pub use overlay::{Overlay, OverlayPhase};
pub use program::{Composite, OverlayLayer, ProgramFrame, ProgramLayer, TransitionSnapshot};
pub use scene::{layout_slot, Scene, SceneEntry};
pub use transition::TransitionRun;

/// Result type for composition operations.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Overlay entry/exit animation length in milliseconds.
pub const OVERLAY_ANIMATION_MS: u64 = 250;
