//! The composited program output for one render tick.

use stagecast_core::{OverlayId, SceneId, SourceId, SourcePlacement, TransitionKind};

/// One source layer inside a composite, in render order.
#[derive(Debug, Clone)]
pub struct ProgramLayer {
    /// Source to render.
    pub source: SourceId,

    /// Where it renders.
    pub placement: SourcePlacement,
}

/// A fully composited scene.
#[derive(Debug, Clone)]
pub struct Composite {
    /// Scene the composite was built from.
    pub scene: SceneId,

    /// Visible layers, bottom to top.
    pub layers: Vec<ProgramLayer>,
}

/// Transition state carried on frames rendered mid-switch.
#[derive(Debug, Clone)]
pub struct TransitionSnapshot {
    /// Animation style.
    pub kind: TransitionKind,

    /// Scene being left.
    pub from: SceneId,

    /// Scene being entered.
    pub to: SceneId,

    /// Animation progress in 0.0 - 1.0.
    pub progress: f32,
}

/// An overlay layer rendered above the composites.
#[derive(Debug, Clone)]
pub struct OverlayLayer {
    /// Overlay to render.
    pub overlay: OverlayId,

    /// Render opacity (entry/exit animations fade through this).
    pub opacity: f32,
}

/// The single program output of one render tick.
///
/// Mid-transition the frame carries both the incoming composite
/// (`primary`) and the outgoing one, plus the blend progress; at all
/// other times `outgoing` and `transition` are empty. There is never
/// more than one of these per tick.
#[derive(Debug, Clone)]
pub struct ProgramFrame {
    /// Monotonically increasing tick counter.
    pub sequence: u64,

    /// Composite of the program scene, if one is set.
    pub primary: Option<Composite>,

    /// Composite of the scene being left, only mid-transition.
    pub outgoing: Option<Composite>,

    /// Blend state, only mid-transition.
    pub transition: Option<TransitionSnapshot>,

    /// Overlays above the composites, bottom to top.
    pub overlays: Vec<OverlayLayer>,
}

impl ProgramFrame {
    /// Whether this frame blends two composites.
    pub fn is_blending(&self) -> bool {
        self.transition.is_some()
    }
}
